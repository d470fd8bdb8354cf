//! Persisted presence records.
//!
//! The record is a flat, human-editable JSON object with stable key names.
//! Missing keys default and unknown keys are ignored, so records written by
//! older or newer builds keep loading. The caller owns file choice and I/O;
//! this module only maps records to and from [`PresenceRequest`] values.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::request::{PresenceRequest, DEFAULT_LARGE_IMAGE, DEFAULT_SMALL_IMAGE};

/// On-disk shape. Field names are the external interface; do not rename.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRecord {
    #[serde(default)]
    details: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    large_text: String,
    #[serde(default)]
    small_text: String,
    #[serde(default = "default_large_image")]
    large_image: String,
    #[serde(default = "default_small_image")]
    small_image: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    start_ts: bool,
}

fn default_large_image() -> String {
    DEFAULT_LARGE_IMAGE.to_string()
}

fn default_small_image() -> String {
    DEFAULT_SMALL_IMAGE.to_string()
}

/// Serialize a request to a pretty-printed record.
pub fn encode(req: &PresenceRequest) -> Result<String, ConfigError> {
    let record = ConfigRecord {
        details: req.details.clone().unwrap_or_default(),
        state: req.state.clone().unwrap_or_default(),
        large_text: req.large_image_text.clone().unwrap_or_default(),
        small_text: req.small_image_text.clone().unwrap_or_default(),
        large_image: req.large_image_key.clone().unwrap_or_default(),
        small_image: req.small_image_key.clone().unwrap_or_default(),
        client_id: req.application_id.clone(),
        start_ts: req.show_start_timestamp,
    };
    serde_json::to_string_pretty(&record).map_err(|e| ConfigError::Format(e.to_string()))
}

/// Parse a record back into a request.
///
/// A missing `client_id` yields an empty `application_id`; validation
/// happens at connect time, not here. Fields the record does not carry
/// (`activity_prefix`, the image placeholders) come back empty.
pub fn decode(input: &str) -> Result<PresenceRequest, ConfigError> {
    let record: ConfigRecord =
        serde_json::from_str(input).map_err(|e| ConfigError::Format(e.to_string()))?;

    Ok(PresenceRequest {
        details: non_empty(record.details),
        state: non_empty(record.state),
        activity_prefix: String::new(),
        large_image_key: non_empty(record.large_image),
        large_image_text: non_empty(record.large_text),
        small_image_key: non_empty(record.small_image),
        small_image_text: non_empty(record.small_text),
        large_image_placeholder: String::new(),
        small_image_placeholder: String::new(),
        show_start_timestamp: record.start_ts,
        application_id: record.client_id,
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_request() -> PresenceRequest {
        PresenceRequest {
            details: Some("Playing some cool stuff".to_string()),
            state: Some("In a match".to_string()),
            large_image_key: Some("logo".to_string()),
            large_image_text: Some("Large image text".to_string()),
            small_image_key: Some("badge".to_string()),
            small_image_text: Some("Small image text".to_string()),
            show_start_timestamp: true,
            application_id: "12345".to_string(),
            ..PresenceRequest::default()
        }
    }

    #[test]
    fn round_trip_preserves_populated_fields() {
        let req = populated_request();
        let encoded = encode(&req).unwrap();
        assert_eq!(decode(&encoded).unwrap(), req);
    }

    #[test]
    fn empty_record_yields_all_defaults() {
        let req = decode("{}").unwrap();
        assert_eq!(req.details, None);
        assert_eq!(req.state, None);
        assert_eq!(req.large_image_key.as_deref(), Some(DEFAULT_LARGE_IMAGE));
        assert_eq!(req.small_image_key.as_deref(), Some(DEFAULT_SMALL_IMAGE));
        assert!(!req.show_start_timestamp);
        assert_eq!(req.application_id, "");
    }

    #[test]
    fn missing_client_id_is_not_an_error() {
        let req = decode(r#"{"details": "Coding"}"#).unwrap();
        assert_eq!(req.details.as_deref(), Some("Coding"));
        assert_eq!(req.application_id, "");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let req = decode(r#"{"client_id": "12345", "theme": "dark", "buttons": []}"#).unwrap();
        assert_eq!(req.application_id, "12345");
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(decode("not json"), Err(ConfigError::Format(_))));
        assert!(matches!(decode("[1, 2]"), Err(ConfigError::Format(_))));
    }

    #[test]
    fn record_uses_stable_key_names() {
        let encoded = encode(&populated_request()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        for key in [
            "details",
            "state",
            "large_text",
            "small_text",
            "large_image",
            "small_image",
            "client_id",
            "start_ts",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }
}
