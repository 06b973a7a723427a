//! Location module for Vevent.
//!
//! Resolves "where is the user?" for the home feed header and the event
//! hosting form:
//! - Permission handling driven by platform [`DeviceEvent`]s
//! - Reverse geocoding of device position fixes
//! - Manual overrides from free-text search or a map position
//! - A picker session for choosing a place by hand
//!
//! Every asynchronous failure ends up as a sentinel display name, never as an
//! error returned to the UI.
//!
//! # Architecture
//!
//! ```text
//! LocationCoordinator ──┬── GeocodingAdapter ── GeocodingService (host)
//!                       └── DeviceLocationService (host)
//!                               │
//!                               └── DeviceEvent ──▶ DeviceEventSender
//! LocationPicker ───────── GeocodingAdapter
//! ```
//!
//! # Example Usage
//!
//! ```
//! use vevent_core::location::{Coordinate, Placemark, ResolvedLocation, UNKNOWN_LOCATION};
//!
//! let goa = Coordinate::new(15.2993, 74.1240).unwrap();
//! let placemark = Placemark::new(goa, "Goa");
//! assert_eq!(placemark.display_name(), "Goa");
//!
//! // Blank names are never shown.
//! let location = ResolvedLocation::new(Some(goa), "");
//! assert_eq!(location.display_name, UNKNOWN_LOCATION);
//! ```

pub mod coordinator;
mod device;
mod error;
mod geocoder;
pub mod picker;
pub mod privacy;
pub mod types;

pub use coordinator::{LocationCoordinator, LocationEvent, LocationSnapshot, ResolutionOrigin};
pub use device::{DeviceEvent, DeviceEventSender, DeviceLocationService};
pub use error::{GeocodeError, LocationError, Result};
pub use geocoder::{GeocodingAdapter, GeocodingService};
pub use picker::LocationPicker;
pub use privacy::location_to_geohash;
pub use types::{
    Coordinate, LocationPermission, LocationPhase, LocationSettings, MapRegion, Placemark,
    ResolvedLocation, SupersedePolicy, GEOCODE_FAILED, INITIAL_LOCATION_NAME, NOT_AUTHORIZED,
    NO_RESULTS, POSITION_FAILED, SERVICES_DISABLED, UNKNOWN_AUTHORIZATION, UNKNOWN_LOCATION,
};
