//! Device location service and the events it emits.
//!
//! The platform layer answers requests made through
//! [`DeviceLocationService`] by posting [`DeviceEvent`]s into the location
//! coordinator through a [`DeviceEventSender`]. There is no delegate object
//! and no callback into coordinator state.

use crate::dispatch::MailboxSender;

use super::coordinator::LocationEvent;
use super::types::LocationPermission;

/// Device-side location collaborator.
///
/// Calls are fire-and-forget; outcomes come back as [`DeviceEvent`]s.
pub trait DeviceLocationService: Send + Sync {
    /// Whether location services are switched on for the device.
    fn services_enabled(&self) -> bool;

    /// Shows the when-in-use permission prompt (or re-reports the current
    /// status if already answered).
    fn request_authorization(&self);

    /// Requests a single position fix.
    fn request_position(&self);
}

/// A notification from the device location service.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Authorization status changed (or was reported for the first time).
    AuthorizationChanged(LocationPermission),

    /// The platform reported a status code this crate does not know.
    UnrecognizedAuthorization(i32),

    /// A position fix, as raw degrees from the platform.
    PositionUpdated {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },

    /// The position request failed.
    PositionFailed(String),
}

impl DeviceEvent {
    /// Builds an authorization event from a raw platform code.
    #[must_use]
    pub fn from_authorization_code(code: i32) -> Self {
        LocationPermission::from_code(code)
            .map_or(Self::UnrecognizedAuthorization(code), Self::AuthorizationChanged)
    }
}

/// Cloneable handle the platform layer uses to deliver [`DeviceEvent`]s.
#[derive(Debug, Clone)]
pub struct DeviceEventSender {
    inner: MailboxSender<LocationEvent>,
}

impl DeviceEventSender {
    pub(crate) const fn new(inner: MailboxSender<LocationEvent>) -> Self {
        Self { inner }
    }

    /// Delivers an event. Returns `false` if the coordinator is gone.
    pub fn send(&self, event: DeviceEvent) -> bool {
        self.inner.post(LocationEvent::Device(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_code_maps_known_values() {
        assert_eq!(
            DeviceEvent::from_authorization_code(4),
            DeviceEvent::AuthorizationChanged(LocationPermission::Granted)
        );
        assert_eq!(
            DeviceEvent::from_authorization_code(2),
            DeviceEvent::AuthorizationChanged(LocationPermission::Denied)
        );
    }

    #[test]
    fn authorization_code_keeps_unknown_values() {
        assert_eq!(
            DeviceEvent::from_authorization_code(42),
            DeviceEvent::UnrecognizedAuthorization(42)
        );
    }
}
