use serde_json::Value;

/// Body codec used by the request executor.
///
/// Typed conversion happens on [`Value`] so the trait stays object safe.
pub trait Codec: Send + Sync {
    /// Media type sent in `Content-Type` and `Accept`
    fn media_type(&self) -> &str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, serde_json::Error>;

    fn decode(&self, body: &[u8]) -> Result<Value, serde_json::Error>;
}

/// JSON codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn media_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(value)
    }

    fn decode(&self, body: &[u8]) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_codec() {
        let codec = JsonCodec;
        assert_eq!(codec.media_type(), "application/json");

        let bytes = codec.encode(&json!({"site": {"contentUrl": "a"}})).unwrap();
        assert_eq!(bytes, br#"{"site":{"contentUrl":"a"}}"#);
        assert_eq!(codec.decode(b"[1,2]").unwrap(), json!([1, 2]));
        assert!(codec.decode(b"not json").is_err());
    }
}
