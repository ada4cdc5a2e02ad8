//! Wire envelopes shared by every endpoint: error bodies and pagination.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{"error": {...}}` as returned by failed requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

/// Error payload. `code` is a 6-digit string whose first three digits are
/// the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub code: String,
}

impl ErrorDetail {
    /// Check whether the code belongs to the given HTTP status
    pub fn is_http_code(&self, status: u16) -> bool {
        self.code
            .get(..3)
            .and_then(|prefix| prefix.parse::<u16>().ok())
            .is_some_and(|code| code == status)
    }
}

#[derive(Debug, Deserialize)]
struct XmlErrorBody {
    error: XmlError,
}

#[derive(Debug, Deserialize)]
struct XmlError {
    #[serde(rename = "@code", default)]
    code: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    detail: String,
}

impl ErrorBody {
    /// Decode an error body, trying JSON first and then the XML form
    /// (`<tsResponse><error code="..."><summary/><detail/></error></tsResponse>`).
    ///
    /// Returns `None` when the body is neither, or carries no error.
    pub fn decode(body: &[u8]) -> Option<ErrorDetail> {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            return parsed.error;
        }

        let text = std::str::from_utf8(body).ok()?;
        let parsed: XmlErrorBody = quick_xml::de::from_str(text).ok()?;
        Some(ErrorDetail {
            summary: parsed.error.summary.trim().to_string(),
            detail: parsed.error.detail.trim().to_string(),
            code: parsed.error.code,
        })
    }
}

/// Pagination block of list responses.
///
/// The server sends these numbers as strings; anything non-numeric reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_number: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_available: u64,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    })
}
