//! Location state coordinator.
//!
//! Owns the permission status and the resolved location shown in the home
//! screen header. Inputs are device events (permission changes, position
//! fixes) and manual overrides from the picker; outputs are
//! [`LocationSnapshot`]s published to `watch` observers.
//!
//! # State machine
//!
//! ```text
//! Unknown ──start()──▶ AwaitingPermission ──granted──▶ PermissionGranted
//!                            ▲      │                        │
//!                            │      └──denied/restricted──▶ PermissionDenied
//!                            └──────────undetermined─────────┘
//! ```
//!
//! # Ordering
//!
//! Geocoding requests are never cancelled. With the default
//! [`SupersedePolicy::LatestCompletion`], whichever response arrives last is
//! shown, even if it belongs to an older request. This is a known race kept
//! on purpose; [`SupersedePolicy::LatestRequest`] opts into dropping stale
//! responses instead.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::dispatch::{Mailbox, RequestId};

use super::device::{DeviceEvent, DeviceEventSender, DeviceLocationService};
use super::error::GeocodeError;
use super::geocoder::GeocodingAdapter;
use super::privacy::log_tag;
use super::types::{
    Coordinate, LocationPermission, LocationPhase, LocationSettings, ResolvedLocation,
    SupersedePolicy, GEOCODE_FAILED, INITIAL_LOCATION_NAME, NOT_AUTHORIZED, POSITION_FAILED,
    SERVICES_DISABLED, UNKNOWN_AUTHORIZATION, UNKNOWN_LOCATION,
};

/// Where a geocoding request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionOrigin {
    /// Reverse lookup of a device position fix.
    Device,
    /// User search or map selection; bypasses permission state.
    Manual,
}

/// Message delivered to the coordinator's mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// Notification from the device location service.
    Device(DeviceEvent),

    /// A geocoding request finished.
    Resolved {
        /// Request this result answers.
        request: RequestId,
        /// Who issued the request.
        origin: ResolutionOrigin,
        /// Lookup outcome.
        outcome: Result<ResolvedLocation, GeocodeError>,
    },
}

/// Observer view of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// Permission state machine phase.
    pub phase: LocationPhase,
    /// Last permission reported by the platform.
    pub permission: LocationPermission,
    /// Current resolved location or sentinel.
    pub location: ResolvedLocation,
}

/// Coordinates permission, device position and geocoding into one
/// displayable location.
///
/// All mutation happens through `&mut self`; asynchronous results are
/// applied by [`pump`](Self::pump) or [`next_update`](Self::next_update) on
/// the owner's execution context.
pub struct LocationCoordinator {
    geocoder: GeocodingAdapter,
    device: Arc<dyn DeviceLocationService>,
    settings: LocationSettings,
    mailbox: Mailbox<LocationEvent>,
    phase: LocationPhase,
    permission: LocationPermission,
    location: ResolvedLocation,
    newest_applied: Option<RequestId>,
    in_flight: usize,
    observers: watch::Sender<LocationSnapshot>,
}

impl LocationCoordinator {
    /// Creates a coordinator in the [`LocationPhase::Unknown`] phase.
    ///
    /// Background lookups are spawned on `runtime`.
    #[must_use]
    pub fn new(
        geocoder: GeocodingAdapter,
        device: Arc<dyn DeviceLocationService>,
        settings: LocationSettings,
        runtime: Handle,
    ) -> Self {
        let location = ResolvedLocation::sentinel(INITIAL_LOCATION_NAME);
        let (observers, _) = watch::channel(LocationSnapshot {
            phase: LocationPhase::Unknown,
            permission: LocationPermission::Undetermined,
            location: location.clone(),
        });

        Self {
            geocoder,
            device,
            settings,
            mailbox: Mailbox::new(runtime),
            phase: LocationPhase::Unknown,
            permission: LocationPermission::Undetermined,
            location,
            newest_applied: None,
            in_flight: 0,
            observers,
        }
    }

    // ==================== Observation ====================

    /// Current phase of the permission state machine.
    #[must_use]
    pub const fn phase(&self) -> LocationPhase {
        self.phase
    }

    /// Last permission reported by the platform.
    #[must_use]
    pub const fn permission(&self) -> LocationPermission {
        self.permission
    }

    /// Current resolved location.
    #[must_use]
    pub const fn location(&self) -> &ResolvedLocation {
        &self.location
    }

    /// Name to show in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.location.display_name
    }

    /// Number of geocoding requests issued but not yet applied.
    #[must_use]
    pub const fn pending_resolutions(&self) -> usize {
        self.in_flight
    }

    /// Returns a copy of the observable state.
    #[must_use]
    pub fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot {
            phase: self.phase,
            permission: self.permission,
            location: self.location.clone(),
        }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationSnapshot> {
        self.observers.subscribe()
    }

    /// Handle the platform layer uses to deliver device events.
    #[must_use]
    pub fn device_events(&self) -> DeviceEventSender {
        DeviceEventSender::new(self.mailbox.sender())
    }

    // ==================== Commands ====================

    /// Requests location permission and waits for the platform's answer.
    pub fn start(&mut self) {
        log::debug!("requesting location authorization");
        self.phase = LocationPhase::AwaitingPermission;
        self.publish();
        self.device.request_authorization();
    }

    /// Asks the device for a fresh position if permission allows.
    ///
    /// Sets [`SERVICES_DISABLED`] or [`NOT_AUTHORIZED`] instead when the
    /// device cannot be asked.
    pub fn fetch_current_location(&mut self) {
        if !self.device.services_enabled() {
            log::info!("location services disabled on device");
            self.set_location(ResolvedLocation::sentinel(SERVICES_DISABLED));
            return;
        }

        if self.permission.is_granted() {
            log::debug!("requesting one-shot position fix");
            self.device.request_position();
        } else {
            self.set_location(ResolvedLocation::sentinel(NOT_AUTHORIZED));
        }
    }

    /// Manual override: resolves a free-text address, ignoring permission.
    pub fn update_location_from(&mut self, address: &str) -> RequestId {
        let request = self.mailbox.next_request_id();
        log::debug!("forward geocoding request {request}");

        let geocoder = self.geocoder.clone();
        let address = address.to_string();
        self.in_flight += 1;
        self.mailbox.dispatch(async move {
            LocationEvent::Resolved {
                request,
                origin: ResolutionOrigin::Manual,
                outcome: geocoder.forward(&address).await,
            }
        });
        request
    }

    /// Manual override: resolves a map position, ignoring permission.
    pub fn update_location_at(&mut self, coordinate: Coordinate) -> RequestId {
        self.resolve_coordinate(coordinate, ResolutionOrigin::Manual)
    }

    /// Applies one device event immediately.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::AuthorizationChanged(permission) => {
                self.on_authorization_changed(permission);
            }
            DeviceEvent::UnrecognizedAuthorization(code) => {
                log::warn!("unrecognized location authorization code {code}");
                self.set_location(ResolvedLocation::sentinel(UNKNOWN_AUTHORIZATION));
            }
            DeviceEvent::PositionUpdated {
                latitude,
                longitude,
            } => {
                if !self.permission.is_granted() {
                    log::debug!("ignoring position fix without permission");
                    return;
                }
                match Coordinate::new(latitude, longitude) {
                    Ok(coordinate) => {
                        self.resolve_coordinate(coordinate, ResolutionOrigin::Device);
                    }
                    Err(e) => {
                        log::warn!("device reported unusable position: {e}");
                        self.set_location(ResolvedLocation::sentinel(POSITION_FAILED));
                    }
                }
            }
            DeviceEvent::PositionFailed(reason) => {
                if !self.permission.is_granted() {
                    log::debug!("ignoring position failure without permission: {reason}");
                    return;
                }
                log::warn!("position request failed: {reason}");
                self.set_location(ResolvedLocation::sentinel(POSITION_FAILED));
            }
        }
    }

    // ==================== Mailbox ====================

    /// Applies every queued event without waiting. Returns how many were
    /// applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.mailbox.try_next() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next event and applies it.
    pub async fn next_update(&mut self) {
        if let Some(event) = self.mailbox.next().await {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: LocationEvent) {
        match event {
            LocationEvent::Device(event) => self.handle_device_event(event),
            LocationEvent::Resolved {
                request,
                origin,
                outcome,
            } => self.apply_resolution(request, origin, outcome),
        }
    }

    // ==================== Internals ====================

    fn on_authorization_changed(&mut self, permission: LocationPermission) {
        log::info!("location authorization changed to {permission:?}");
        self.permission = permission;

        match permission {
            LocationPermission::Granted => {
                self.phase = LocationPhase::PermissionGranted;
                self.publish();
                self.fetch_current_location();
            }
            LocationPermission::Denied | LocationPermission::Restricted => {
                self.phase = LocationPhase::PermissionDenied;
                self.set_location(ResolvedLocation::sentinel(NOT_AUTHORIZED));
            }
            LocationPermission::Undetermined => {
                self.phase = LocationPhase::AwaitingPermission;
                self.publish();
            }
        }
    }

    fn resolve_coordinate(&mut self, coordinate: Coordinate, origin: ResolutionOrigin) -> RequestId {
        let request = self.mailbox.next_request_id();
        log::debug!(
            "reverse geocoding request {request} ({origin:?}) near {}",
            log_tag(&coordinate)
        );

        let geocoder = self.geocoder.clone();
        self.in_flight += 1;
        self.mailbox.dispatch(async move {
            LocationEvent::Resolved {
                request,
                origin,
                outcome: geocoder.reverse(coordinate).await,
            }
        });
        request
    }

    fn apply_resolution(
        &mut self,
        request: RequestId,
        origin: ResolutionOrigin,
        outcome: Result<ResolvedLocation, GeocodeError>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if origin == ResolutionOrigin::Device && !self.permission.is_granted() {
            log::debug!("discarding device resolution {request}: permission revoked");
            return;
        }

        if self.settings.supersede_policy == SupersedePolicy::LatestRequest
            && self.newest_applied.is_some_and(|newest| request < newest)
        {
            log::debug!("discarding stale resolution {request}");
            return;
        }

        let location = match outcome {
            Ok(location) => location,
            Err(GeocodeError::NotFound) => {
                log::debug!("resolution {request} found no placemark");
                ResolvedLocation::sentinel(UNKNOWN_LOCATION)
            }
            Err(e) => {
                log::warn!("resolution {request} failed: {e}");
                ResolvedLocation::sentinel(GEOCODE_FAILED)
            }
        };

        self.newest_applied = self.newest_applied.max(Some(request));
        self.set_location(location);
    }

    fn set_location(&mut self, location: ResolvedLocation) {
        self.location = location;
        self.publish();
    }

    fn publish(&self) {
        self.observers.send_replace(self.snapshot());
    }
}

impl fmt::Debug for LocationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationCoordinator")
            .field("phase", &self.phase)
            .field("permission", &self.permission)
            .field("display_name", &self.location.display_name)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
