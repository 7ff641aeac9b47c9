//! Versioned export/import bundle
//!
//! A bundle carries the overlay and tracking state as one JSON document.
//! Import is all-or-nothing: the document is validated and fully parsed
//! before any store is touched, so a malformed bundle leaves existing state
//! byte-for-byte unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::overlay::OverlayState;
use crate::tracking::TrackingState;

pub const BUNDLE_VERSION: &str = "1.0";
pub const APPLICATION_NAME: &str = "remtrack";

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// The exported document. Field names are part of the external interface
/// and stay camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub version: String,

    #[serde(rename = "exportedAt")]
    pub exported_at: DateTime<Utc>,

    #[serde(rename = "applicationName")]
    pub application_name: String,

    /// The overlay store's exportable state
    pub problems: OverlayState,

    /// The tracking store's exportable state
    pub tracking: TrackingState,
}

/// Errors validating or parsing a bundle
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle is not a JSON object")]
    NotAnObject,

    #[error("bundle is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unrecognized bundle version '{0}' (supported: {supported})", supported = SUPPORTED_VERSIONS.join(", "))]
    UnsupportedVersion(String),

    #[error("malformed bundle: {0}")]
    Malformed(String),
}

impl Bundle {
    pub fn new(problems: OverlayState, tracking: TrackingState) -> Self {
        Self {
            version: BUNDLE_VERSION.to_string(),
            exported_at: Utc::now(),
            application_name: APPLICATION_NAME.to_string(),
            problems,
            tracking,
        }
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        serde_json::to_string_pretty(self).map_err(|e| BundleError::Malformed(e.to_string()))
    }

    /// Validate and parse a bundle document.
    ///
    /// `version` and `applicationName` must be present and the version must
    /// be recognized before the sections are even looked at.
    pub fn from_json(raw: &str) -> Result<Self, BundleError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| BundleError::Malformed(e.to_string()))?;
        let object = value.as_object().ok_or(BundleError::NotAnObject)?;

        let version = object
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or(BundleError::MissingField("version"))?;
        if object
            .get("applicationName")
            .and_then(|v| v.as_str())
            .is_none()
        {
            return Err(BundleError::MissingField("applicationName"));
        }
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(BundleError::UnsupportedVersion(version.to_string()));
        }

        serde_json::from_value(value).map_err(|e| BundleError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let bundle = Bundle::new(OverlayState::default(), TrackingState::default());
        let json = bundle.to_json().unwrap();

        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"applicationName\""));

        let parsed = Bundle::from_json(&json).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_missing_version_rejected() {
        let raw = r#"{ "applicationName": "remtrack", "problems": {}, "tracking": {} }"#;
        let err = Bundle::from_json(raw).unwrap_err();
        assert!(matches!(err, BundleError::MissingField("version")));
    }

    #[test]
    fn test_missing_application_name_rejected() {
        let raw = r#"{ "version": "1.0", "problems": {}, "tracking": {} }"#;
        let err = Bundle::from_json(raw).unwrap_err();
        assert!(matches!(err, BundleError::MissingField("applicationName")));
    }

    #[test]
    fn test_unrecognized_version_rejected() {
        let raw = r#"{ "version": "99.0", "applicationName": "remtrack", "exportedAt": "2026-01-01T00:00:00Z", "problems": {}, "tracking": {} }"#;
        let err = Bundle::from_json(raw).unwrap_err();
        assert!(matches!(err, BundleError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_malformed_section_rejected() {
        let raw = r#"{ "version": "1.0", "applicationName": "remtrack", "exportedAt": "2026-01-01T00:00:00Z", "problems": { "custom_areas": 42 }, "tracking": {} }"#;
        let err = Bundle::from_json(raw).unwrap_err();
        assert!(matches!(err, BundleError::Malformed(_)));
    }

    #[test]
    fn test_not_an_object_rejected() {
        assert!(matches!(
            Bundle::from_json("[1,2,3]").unwrap_err(),
            BundleError::NotAnObject
        ));
    }
}
