use std::fmt;
use url::form_urlencoded;

/// Value side of a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Rendered as `field:eq:value`
    Scalar(String),
    /// Rendered as `field:in:[v1,v2,...]`
    Set(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Set(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::Set(values.into_iter().map(str::to_string).collect())
    }
}

/// Filter expression for list endpoints, passed as the `filter` query parameter.
///
/// Fields keep insertion order; setting a field twice replaces its value.
///
/// ```
/// use tableau_rest::Filter;
///
/// let filter = Filter::new()
///     .eq("siteRole", "Creator")
///     .any_of("name", ["alice", "bob"]);
/// assert_eq!(filter.to_string(), "siteRole:eq:Creator,name:in:[alice,bob]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    fields: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to an arbitrary value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// Match `field` exactly.
    pub fn eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(field, FilterValue::Scalar(value.into()))
    }

    /// Match any of `values` for `field`.
    pub fn any_of<I, S>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, FilterValue::Set(values))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                FilterValue::Scalar(v) => write!(f, "{}:eq:{}", field, escape(v))?,
                FilterValue::Set(values) => {
                    let joined: Vec<String> = values.iter().map(|v| escape(v)).collect();
                    write!(f, "{}:in:[{}]", field, joined.join(","))?;
                }
            }
        }
        Ok(())
    }
}
