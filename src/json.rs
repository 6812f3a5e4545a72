//! Response Decoder (C1).
//!
//! Parses a service response body into a JSON tree and extracts the two
//! fields every stage needs (`operationId`, `status`) without ever failing
//! on an absent key — only on malformed JSON, a non-object top level, or a
//! present-but-wrongly-typed field.

use crate::error::{MalformedFieldSnafu, MalformedResponseSnafu, NotAnObjectSnafu, ProvisioningError};
use serde_json::Value;
use snafu::ResultExt;

/// Parse `body` as UTF-8 JSON and require it to be an object at the top
/// level.
pub fn decode(body: &[u8]) -> Result<Value, ProvisioningError> {
    let value: Value = serde_json::from_slice(body).context(MalformedResponseSnafu)?;
    if !value.is_object() {
        return NotAnObjectSnafu.fail();
    }
    Ok(value)
}

/// Fetch `key` from `tree`, treating an absent key or explicit JSON
/// `null` identically as "not present".
pub fn get_optional<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    match tree.get(key) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

/// Fetch `key` from `tree` as a string. A present-but-non-string value is
/// `MalformedField`, never silently coerced or swallowed.
pub fn get_optional_str(tree: &Value, key: &'static str) -> Result<Option<String>, ProvisioningError> {
    match get_optional(tree, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => MalformedFieldSnafu { key }.fail(),
    }
}

/// `get_optional_element(decoded, "operationId")` from the Python original.
pub fn operation_id(decoded: &Value) -> Result<Option<String>, ProvisioningError> {
    get_optional_str(decoded, "operationId")
}

/// `get_optional_element(decoded, "status")`. A present-but-non-string
/// status is `MalformedResponse`-class per spec.md §4.1.
pub fn registration_status(decoded: &Value) -> Result<Option<String>, ProvisioningError> {
    get_optional_str(decoded, "status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_object_top_level() {
        assert!(decode(b"[1,2,3]").is_err());
        assert!(decode(b"\"hello\"").is_err());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(decode(b"{not json").is_err());
    }

    #[test]
    fn missing_keys_are_none_not_errors() {
        let decoded = decode(br#"{"status":"assigned"}"#).unwrap();
        assert_eq!(operation_id(&decoded).unwrap(), None);
        assert_eq!(registration_status(&decoded).unwrap(), Some("assigned".to_string()));
    }

    #[test]
    fn non_string_status_is_malformed() {
        let decoded = decode(br#"{"status":123}"#).unwrap();
        assert!(registration_status(&decoded).is_err());
    }

    #[test]
    fn null_is_treated_as_absent() {
        let decoded = decode(br#"{"operationId":null}"#).unwrap();
        assert_eq!(operation_id(&decoded).unwrap(), None);
    }
}
