//! URL construction for REST endpoints.

use crate::error::{Error, Result};
use crate::filter::Filter;
use url::{form_urlencoded, Url};

/// Build the URL of an API path.
///
/// The host's own path is kept as a prefix, followed by `/api/{version}` and
/// `path`. Empty segments of `path` are dropped, so slashes never double up.
/// Each segment of `path` is percent-encoded as needed.
///
/// ```
/// let url = tableau_rest::endpoint::build_url("https://example.com/", "3.12", "sites/S1/users")?;
/// assert_eq!(url.as_str(), "https://example.com/api/3.12/sites/S1/users");
/// # Ok::<(), tableau_rest::Error>(())
/// ```
pub fn build_url(host: &str, version: &str, path: &str) -> Result<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::InvalidHost);
    }
    let mut url = Url::parse(host).map_err(|_| Error::InvalidHost)?;

    {
        let mut segments = url.path_segments_mut().map_err(|_| Error::InvalidHost)?;
        segments.pop_if_empty();
        segments.push("api");
        segments.extend(version.split('/').filter(|s| !s.is_empty()));
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Append caller-supplied values to the path, one segment each.
///
/// `/` and `%` inside a value are percent-encoded, so an id never spans
/// segments. Empty values and the dot segments `.` and `..` cannot be
/// expressed as a single segment and are rejected with
/// [`Error::BadRequest`].
///
/// ```
/// use tableau_rest::endpoint::{build_url, push_segments};
///
/// let mut url = build_url("https://example.com", "3.12", "sites")?;
/// push_segments(&mut url, &["S1", "groups", "a/b"])?;
/// assert_eq!(url.as_str(), "https://example.com/api/3.12/sites/S1/groups/a%2Fb");
/// # Ok::<(), tableau_rest::Error>(())
/// ```
pub fn push_segments(url: &mut Url, segments: &[&str]) -> Result<()> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(Error::BadRequest(format!("invalid path segment {:?}", bad)));
    }

    url.path_segments_mut()
        .map_err(|_| Error::InvalidHost)?
        .extend(segments);
    Ok(())
}

/// Query string builder.
///
/// Values are form-escaped when added; filter expressions escape their own
/// values and are appended verbatim.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pairs: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pageSize=N&pageNumber=M`
    pub fn page(self, page_size: u32, page_number: u32) -> Self {
        self.param("pageSize", page_size.to_string())
            .param("pageNumber", page_number.to_string())
    }

    pub fn param(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value: String = form_urlencoded::byte_serialize(value.as_ref().as_bytes()).collect();
        self.pairs.push(format!("{}={}", key, value));
        self
    }

    /// Adds `filter=...` unless the filter is empty.
    pub fn filter(mut self, filter: Option<&Filter>) -> Self {
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            self.pairs.push(format!("filter={}", filter));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace the query of `url` with this one.
    pub fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.pairs.join("&")));
        }
    }
}
