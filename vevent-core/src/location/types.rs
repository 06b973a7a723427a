//! Location data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{LocationError, Result};

/// Display name shown before the first resolution completes.
pub const INITIAL_LOCATION_NAME: &str = "Fetching Location...";

/// Display name while location permission is denied or restricted.
pub const NOT_AUTHORIZED: &str = "Location services not authorized";

/// Display name when device location services are switched off.
pub const SERVICES_DISABLED: &str = "Location services are not enabled";

/// Display name for an authorization code the platform layer did not recognise.
pub const UNKNOWN_AUTHORIZATION: &str = "Unknown authorization status";

/// Display name when geocoding found no placemark or no locality.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Display name when the geocoding service reported an error.
pub const GEOCODE_FAILED: &str = "Failed to get location name";

/// Display name when the device could not produce a position.
pub const POSITION_FAILED: &str = "Failed to get location";

/// Picker label when a search returned nothing.
pub const NO_RESULTS: &str = "No results found";

/// Location permission as reported by the platform.
///
/// Only the platform's authorization callback changes this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationPermission {
    /// The user has not answered the permission prompt yet.
    #[default]
    Undetermined,
    /// When-in-use or always authorization.
    Granted,
    /// The user declined.
    Denied,
    /// Parental controls or device policy forbid location access.
    Restricted,
}

impl LocationPermission {
    /// Returns true if automatic location resolution may proceed.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Maps a raw platform authorization code.
    ///
    /// Codes follow the iOS numbering: 0 not determined, 1 restricted,
    /// 2 denied, 3 always, 4 when in use. Any other value returns `None`.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Undetermined),
            1 => Some(Self::Restricted),
            2 => Some(Self::Denied),
            3 | 4 => Some(Self::Granted),
            _ => None,
        }
    }
}

/// Phase of the location coordinator's permission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationPhase {
    /// Coordinator created, permission not yet requested.
    #[default]
    Unknown,
    /// Authorization requested, waiting for the platform answer.
    AwaitingPermission,
    /// Permission granted; automatic resolution is active.
    PermissionGranted,
    /// Permission denied or restricted; automatic resolution is off.
    PermissionDenied,
}

/// A validated geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, -90.0 to 90.0.
    pub latitude: f64,
    /// Longitude in degrees, -180.0 to 180.0.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidCoordinate`] if either component is
    /// NaN, infinite, or outside its valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use vevent_core::location::Coordinate;
    ///
    /// assert!(Coordinate::new(15.2993, 74.1240).is_ok());
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::InvalidCoordinate(format!(
                "latitude {latitude} outside -90..=90"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidCoordinate(format!(
                "longitude {longitude} outside -180..=180"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Encodes this coordinate as a geohash of `len` characters.
    #[must_use]
    pub fn geohash(&self, len: u8) -> String {
        super::privacy::location_to_geohash(self.latitude, self.longitude, len)
    }
}

/// A single record returned by the geocoding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Placemark {
    /// Where the place is, if the service reported it.
    pub coordinate: Option<Coordinate>,
    /// City or town name.
    pub locality: Option<String>,
}

impl Placemark {
    /// Creates a placemark with a locality at a coordinate.
    #[must_use]
    pub fn new(coordinate: Coordinate, locality: impl Into<String>) -> Self {
        Self {
            coordinate: Some(coordinate),
            locality: Some(locality.into()),
        }
    }

    /// The name to show for this placemark; never empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.locality
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_LOCATION)
    }
}

/// The coordinator's current answer to "where is the user looking?".
///
/// `display_name` is never empty: blank names are replaced with
/// [`UNKNOWN_LOCATION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Resolved coordinate, absent for sentinel results.
    pub coordinate: Option<Coordinate>,
    /// Human-readable place name or a sentinel string.
    pub display_name: String,
    /// When this value was produced (UTC).
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedLocation {
    /// Creates a resolved location, substituting [`UNKNOWN_LOCATION`] for a
    /// blank name.
    #[must_use]
    pub fn new(coordinate: Option<Coordinate>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let display_name = if display_name.trim().is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            display_name
        };
        Self {
            coordinate,
            display_name,
            resolved_at: Utc::now(),
        }
    }

    /// Creates a coordinate-less location carrying a sentinel name.
    #[must_use]
    pub fn sentinel(name: &str) -> Self {
        Self::new(None, name)
    }
}

/// A visible map area: centre plus span in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    /// Centre of the visible area.
    pub center: Coordinate,
    /// North-south span in degrees.
    pub latitude_delta: f64,
    /// East-west span in degrees.
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Returns a copy of this region recentred on `center`, keeping the span.
    #[must_use]
    pub const fn recentred(self, center: Coordinate) -> Self {
        Self { center, ..self }
    }
}

impl Default for MapRegion {
    /// Centre of India with a 10° span.
    fn default() -> Self {
        Self {
            center: Coordinate {
                latitude: 20.5937,
                longitude: 78.9629,
            },
            latitude_delta: 10.0,
            longitude_delta: 10.0,
        }
    }
}

/// Which completion is allowed to replace the current location when several
/// geocoding requests overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupersedePolicy {
    /// Whichever response arrives last is shown, regardless of issue order.
    #[default]
    LatestCompletion,
    /// A response is dropped if a later-issued request has already been
    /// applied.
    LatestRequest,
}

/// Settings for location resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocationSettings {
    /// How overlapping geocoding completions are ordered.
    pub supersede_policy: SupersedePolicy,

    /// Region the location picker opens on.
    pub picker_region: MapRegion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_default_is_undetermined() {
        assert_eq!(LocationPermission::default(), LocationPermission::Undetermined);
    }

    #[test]
    fn only_granted_permission_is_granted() {
        assert!(LocationPermission::Granted.is_granted());
        assert!(!LocationPermission::Undetermined.is_granted());
        assert!(!LocationPermission::Denied.is_granted());
        assert!(!LocationPermission::Restricted.is_granted());
    }

    #[test]
    fn permission_from_platform_codes() {
        assert_eq!(
            LocationPermission::from_code(0),
            Some(LocationPermission::Undetermined)
        );
        assert_eq!(
            LocationPermission::from_code(1),
            Some(LocationPermission::Restricted)
        );
        assert_eq!(
            LocationPermission::from_code(2),
            Some(LocationPermission::Denied)
        );
        assert_eq!(
            LocationPermission::from_code(3),
            Some(LocationPermission::Granted)
        );
        assert_eq!(
            LocationPermission::from_code(4),
            Some(LocationPermission::Granted)
        );
        assert_eq!(LocationPermission::from_code(99), None);
        assert_eq!(LocationPermission::from_code(-1), None);
    }

    #[test]
    fn coordinate_accepts_valid_boundaries() {
        assert!(Coordinate::new(90.0, 0.0).is_ok());
        assert!(Coordinate::new(-90.0, 0.0).is_ok());
        assert!(Coordinate::new(0.0, 180.0).is_ok());
        assert!(Coordinate::new(0.0, -180.0).is_ok());
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.1).is_err());
        assert!(Coordinate::new(0.0, -180.1).is_err());
    }

    #[test]
    fn coordinate_rejects_nan_and_infinity() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
        assert!(Coordinate::new(f64::INFINITY, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn coordinate_geohash_length() {
        let goa = Coordinate::new(15.2993, 74.1240).unwrap();
        assert_eq!(goa.geohash(5).len(), 5);
        assert_eq!(goa.geohash(8).len(), 8);
    }

    #[test]
    fn placemark_display_name_uses_locality() {
        let goa = Placemark::new(Coordinate::new(15.2993, 74.1240).unwrap(), "Goa");
        assert_eq!(goa.display_name(), "Goa");
    }

    #[test]
    fn placemark_without_locality_is_unknown() {
        let placemark = Placemark::default();
        assert_eq!(placemark.display_name(), UNKNOWN_LOCATION);
    }

    #[test]
    fn placemark_with_blank_locality_is_unknown() {
        let placemark = Placemark {
            coordinate: None,
            locality: Some("   ".to_string()),
        };
        assert_eq!(placemark.display_name(), UNKNOWN_LOCATION);
    }

    #[test]
    fn resolved_location_never_has_empty_name() {
        let location = ResolvedLocation::new(None, "");
        assert_eq!(location.display_name, UNKNOWN_LOCATION);
    }

    #[test]
    fn sentinel_has_no_coordinate() {
        let location = ResolvedLocation::sentinel(NOT_AUTHORIZED);
        assert_eq!(location.display_name, NOT_AUTHORIZED);
        assert!(location.coordinate.is_none());
    }

    #[test]
    fn default_map_region_is_centre_of_india() {
        let region = MapRegion::default();
        assert_eq!(region.center.latitude, 20.5937);
        assert_eq!(region.center.longitude, 78.9629);
        assert_eq!(region.latitude_delta, 10.0);
    }

    #[test]
    fn recentred_keeps_span() {
        let goa = Coordinate::new(15.2993, 74.1240).unwrap();
        let region = MapRegion::default().recentred(goa);
        assert_eq!(region.center, goa);
        assert_eq!(region.longitude_delta, 10.0);
    }

    #[test]
    fn location_settings_default_values() {
        let settings = LocationSettings::default();
        assert_eq!(settings.supersede_policy, SupersedePolicy::LatestCompletion);
        assert_eq!(settings.picker_region, MapRegion::default());
    }

    #[test]
    fn location_settings_fill_missing_fields_from_defaults() {
        let settings: LocationSettings =
            serde_json::from_str(r#"{"supersede_policy":"LatestRequest"}"#).unwrap();
        assert_eq!(settings.supersede_policy, SupersedePolicy::LatestRequest);
        assert_eq!(settings.picker_region, MapRegion::default());
    }
}
