//! Settings for the core library.
//!
//! Every field has a default, so an empty JSON object is a valid settings
//! document. The host app usually ships its settings as a bundled JSON asset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthSettings;
use crate::location::{Coordinate, LocationSettings};

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is out of range.
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// All settings consumed by [`VeventCore`](crate::VeventCore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoreSettings {
    /// Location resolution and picker settings.
    pub location: LocationSettings,
    /// Login flow settings.
    pub auth: AuthSettings,
}

impl CoreSettings {
    /// Parses and validates settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    ///
    /// # Examples
    ///
    /// ```
    /// use vevent_core::config::CoreSettings;
    /// use vevent_core::location::SupersedePolicy;
    ///
    /// let settings = CoreSettings::from_json(
    ///     r#"{ "location": { "supersede_policy": "LatestRequest" } }"#,
    /// ).unwrap();
    /// assert_eq!(settings.location.supersede_policy, SupersedePolicy::LatestRequest);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every value for range errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let region = &self.location.picker_region;
        let center = region.center;
        if Coordinate::new(center.latitude, center.longitude).is_err() {
            return Err(ConfigError::Invalid {
                field: "location.picker_region.center",
                reason: format!("({}, {}) is not a valid coordinate", center.latitude, center.longitude),
            });
        }
        if !(region.latitude_delta.is_finite() && region.latitude_delta > 0.0) {
            return Err(ConfigError::Invalid {
                field: "location.picker_region.latitude_delta",
                reason: format!("{} must be positive", region.latitude_delta),
            });
        }
        if !(region.longitude_delta.is_finite() && region.longitude_delta > 0.0) {
            return Err(ConfigError::Invalid {
                field: "location.picker_region.longitude_delta",
                reason: format!("{} must be positive", region.longitude_delta),
            });
        }
        if self.auth.login_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "auth.login_timeout_secs",
                reason: "must be at least 1 second; omit it to wait forever".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{MapRegion, SupersedePolicy};

    #[test]
    fn empty_document_gives_defaults() {
        let settings = CoreSettings::from_json("{}").unwrap();
        assert_eq!(settings, CoreSettings::default());
        assert_eq!(settings.location.supersede_policy, SupersedePolicy::LatestCompletion);
        assert_eq!(settings.location.picker_region, MapRegion::default());
        assert_eq!(settings.auth.login_timeout_secs, None);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings = CoreSettings::from_json(r#"{ "auth": { "login_timeout_secs": 20 } }"#).unwrap();
        assert_eq!(settings.auth.login_timeout_secs, Some(20));
        assert_eq!(settings.location, LocationSettings::default());
    }

    #[test]
    fn json_roundtrip() {
        let mut settings = CoreSettings::default();
        settings.location.supersede_policy = SupersedePolicy::LatestRequest;

        let json = settings.to_json().unwrap();
        assert_eq!(CoreSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let result = CoreSettings::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unknown_policy_is_parse_error() {
        let result = CoreSettings::from_json(r#"{ "location": { "supersede_policy": "Random" } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = CoreSettings::from_json(r#"{ "auth": { "login_timeout_secs": 0 } }"#);
        match result {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "auth.login_timeout_secs"),
            other => panic!("expected invalid timeout, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_span() {
        let json = r#"{ "location": { "picker_region": {
            "center": { "latitude": 15.0, "longitude": 74.0 },
            "latitude_delta": 0.0,
            "longitude_delta": 1.0
        } } }"#;
        match CoreSettings::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "location.picker_region.latitude_delta");
            }
            other => panic!("expected invalid span, got {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_centre() {
        let json = r#"{ "location": { "picker_region": {
            "center": { "latitude": 95.0, "longitude": 74.0 },
            "latitude_delta": 1.0,
            "longitude_delta": 1.0
        } } }"#;
        let err = CoreSettings::from_json(json).unwrap_err();
        assert!(err.to_string().starts_with("Invalid setting location.picker_region.center"));
    }
}
