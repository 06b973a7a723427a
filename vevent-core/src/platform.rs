//! Platform bridge between the core and the host app.
//!
//! The host (Flutter, via the FFI crate) owns the real geocoder, location
//! manager and HTTP client. [`PlatformBridge`] stands in for all three
//! collaborator traits: every outbound call becomes a [`PlatformRequest`]
//! the host drains with [`PlatformBridge::take_requests`], and the host
//! answers by id with [`PlatformBridge::complete_geocode`] or
//! [`PlatformBridge::complete_login`].
//!
//! ```text
//! coordinator ──call──▶ PlatformBridge ──PlatformRequest──▶ host
//!      ▲                     │  ▲                            │
//!      └──── future ◀────────┘  └──── complete_*(id, …) ◀────┘
//! ```
//!
//! Pending calls never hang on teardown: after [`PlatformBridge::shutdown`]
//! (or when the bridge is dropped) every outstanding future resolves with a
//! service or network error.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::auth::{AuthApiClient, AuthError, AuthSession, Credentials};
use crate::dispatch::RequestId;
use crate::location::{
    Coordinate, DeviceEvent, DeviceEventSender, DeviceLocationService, GeocodeError,
    GeocodingService, LocationPermission, Placemark,
};

/// Message given to calls that were still pending when the bridge closed.
const BRIDGE_CLOSED: &str = "platform bridge closed";

/// Errors returned to the host by bridge entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No pending call has this id (already answered, or never issued).
    #[error("Unknown platform request id: {0}")]
    UnknownRequest(u64),

    /// The bridge was shut down or nothing is listening for device events.
    #[error("Platform bridge is closed")]
    Closed,
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Work the host must perform on behalf of the core.
#[derive(Debug, Clone)]
pub enum PlatformRequest {
    /// Show (or re-report) the location permission prompt.
    RequestAuthorization,

    /// Deliver one position fix via [`PlatformBridge::on_position`].
    RequestPosition,

    /// Forward-geocode an address.
    Forward {
        /// Id to answer with.
        id: RequestId,
        /// The address text.
        query: String,
    },

    /// Reverse-geocode a coordinate.
    Reverse {
        /// Id to answer with.
        id: RequestId,
        /// Where to look up.
        coordinate: Coordinate,
    },

    /// Call the auth API.
    Login {
        /// Id to answer with.
        id: RequestId,
        /// Email and password; the password is wiped when this is dropped.
        credentials: Credentials,
    },
}

type GeocodeResponder = oneshot::Sender<std::result::Result<Vec<Placemark>, GeocodeError>>;
type LoginResponder = oneshot::Sender<std::result::Result<AuthSession, AuthError>>;

#[derive(Debug)]
struct BridgeState {
    next_id: u64,
    closed: bool,
    outbox: VecDeque<PlatformRequest>,
    geocodes: HashMap<RequestId, GeocodeResponder>,
    logins: HashMap<RequestId, LoginResponder>,
    services_enabled: bool,
    authorization: LocationPermission,
    device_events: Option<DeviceEventSender>,
}

impl BridgeState {
    fn allocate_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId::new(self.next_id)
    }
}

/// Request/response bridge implementing every collaborator trait.
///
/// Share it as `Arc<PlatformBridge>` between the coordinators (as their
/// services) and the FFI layer (which drains requests and answers them).
#[derive(Debug)]
pub struct PlatformBridge {
    state: Mutex<BridgeState>,
}

impl Default for PlatformBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge {
    /// Creates an open bridge. Location services are assumed on until the
    /// host says otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState {
                next_id: 0,
                closed: false,
                outbox: VecDeque::new(),
                geocodes: HashMap::new(),
                logins: HashMap::new(),
                services_enabled: true,
                authorization: LocationPermission::Undetermined,
                device_events: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routes device callbacks to a location coordinator.
    pub fn connect_device_events(&self, sender: DeviceEventSender) {
        self.lock().device_events = Some(sender);
    }

    // ==================== Host side ====================

    /// Removes and returns every queued request, oldest first.
    pub fn take_requests(&self) -> Vec<PlatformRequest> {
        self.lock().outbox.drain(..).collect()
    }

    /// Number of geocoding and login calls awaiting an answer.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        let state = self.lock();
        state.geocodes.len() + state.logins.len()
    }

    /// Answers a [`PlatformRequest::Forward`] or [`PlatformRequest::Reverse`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownRequest`] if `id` is not a pending
    /// geocoding call, or [`BridgeError::Closed`] after shutdown.
    pub fn complete_geocode(
        &self,
        id: RequestId,
        result: std::result::Result<Vec<Placemark>, GeocodeError>,
    ) -> Result<()> {
        let responder = {
            let mut state = self.lock();
            if state.closed {
                return Err(BridgeError::Closed);
            }
            state
                .geocodes
                .remove(&id)
                .ok_or(BridgeError::UnknownRequest(id.get()))?
        };
        if responder.send(result).is_err() {
            log::debug!("geocode {id} answered after its caller went away");
        }
        Ok(())
    }

    /// Answers a [`PlatformRequest::Login`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownRequest`] if `id` is not a pending login
    /// call, or [`BridgeError::Closed`] after shutdown.
    pub fn complete_login(
        &self,
        id: RequestId,
        result: std::result::Result<AuthSession, AuthError>,
    ) -> Result<()> {
        let responder = {
            let mut state = self.lock();
            if state.closed {
                return Err(BridgeError::Closed);
            }
            state
                .logins
                .remove(&id)
                .ok_or(BridgeError::UnknownRequest(id.get()))?
        };
        if responder.send(result).is_err() {
            log::debug!("login {id} answered after its caller went away");
        }
        Ok(())
    }

    /// Updates the device's location-services switch.
    pub fn set_services_enabled(&self, enabled: bool) {
        self.lock().services_enabled = enabled;
    }

    /// Last authorization status reported by the host.
    #[must_use]
    pub fn authorization_status(&self) -> LocationPermission {
        self.lock().authorization
    }

    /// Host callback: the permission status changed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Closed`] if no coordinator is listening.
    pub fn on_authorization_code(&self, code: i32) -> Result<()> {
        let event = DeviceEvent::from_authorization_code(code);
        if let DeviceEvent::AuthorizationChanged(permission) = event {
            self.lock().authorization = permission;
        }
        self.forward(event)
    }

    /// Host callback: a position fix arrived.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Closed`] if no coordinator is listening.
    pub fn on_position(&self, latitude: f64, longitude: f64) -> Result<()> {
        self.forward(DeviceEvent::PositionUpdated {
            latitude,
            longitude,
        })
    }

    /// Host callback: the position request failed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Closed`] if no coordinator is listening.
    pub fn on_position_failed(&self, reason: impl Into<String>) -> Result<()> {
        self.forward(DeviceEvent::PositionFailed(reason.into()))
    }

    /// Fails every pending call and rejects new ones.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        log::info!(
            "closing platform bridge with {} pending calls",
            state.geocodes.len() + state.logins.len()
        );
        state.closed = true;
        state.outbox.clear();
        state.geocodes.clear();
        state.logins.clear();
        state.device_events = None;
    }

    /// Returns true after [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn forward(&self, event: DeviceEvent) -> Result<()> {
        let sender = self.lock().device_events.clone();
        match sender {
            Some(sender) if sender.send(event) => Ok(()),
            _ => Err(BridgeError::Closed),
        }
    }

    // ==================== Core side ====================

    fn enqueue_geocode(
        &self,
        request: impl FnOnce(RequestId) -> PlatformRequest,
    ) -> BoxFuture<'static, std::result::Result<Vec<Placemark>, GeocodeError>> {
        let (responder, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            if state.closed {
                drop(responder);
            } else {
                let id = state.allocate_id();
                state.geocodes.insert(id, responder);
                state.outbox.push_back(request(id));
            }
        }
        async move {
            rx.await
                .unwrap_or_else(|_| Err(GeocodeError::Service(BRIDGE_CLOSED.to_string())))
        }
        .boxed()
    }

    fn push(&self, request: PlatformRequest) {
        let mut state = self.lock();
        if !state.closed {
            state.outbox.push_back(request);
        }
    }
}

impl GeocodingService for PlatformBridge {
    fn geocode_address(
        &self,
        query: &str,
    ) -> BoxFuture<'static, std::result::Result<Vec<Placemark>, GeocodeError>> {
        let query = query.to_string();
        self.enqueue_geocode(|id| PlatformRequest::Forward { id, query })
    }

    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'static, std::result::Result<Vec<Placemark>, GeocodeError>> {
        self.enqueue_geocode(|id| PlatformRequest::Reverse { id, coordinate })
    }
}

impl DeviceLocationService for PlatformBridge {
    fn services_enabled(&self) -> bool {
        self.lock().services_enabled
    }

    fn request_authorization(&self) {
        self.push(PlatformRequest::RequestAuthorization);
    }

    fn request_position(&self) {
        self.push(PlatformRequest::RequestPosition);
    }
}

impl AuthApiClient for PlatformBridge {
    fn login(
        &self,
        credentials: Credentials,
    ) -> BoxFuture<'static, std::result::Result<AuthSession, AuthError>> {
        let (responder, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            if state.closed {
                drop(responder);
            } else {
                let id = state.allocate_id();
                state.logins.insert(id, responder);
                state
                    .outbox
                    .push_back(PlatformRequest::Login { id, credentials });
            }
        }
        async move {
            rx.await
                .unwrap_or_else(|_| Err(AuthError::Network(BRIDGE_CLOSED.to_string())))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goa() -> Coordinate {
        Coordinate::new(15.2993, 74.1240).unwrap()
    }

    fn only_geocode_id(bridge: &PlatformBridge) -> RequestId {
        match bridge.take_requests().as_slice() {
            [PlatformRequest::Forward { id, .. } | PlatformRequest::Reverse { id, .. }] => *id,
            other => panic!("expected one geocode request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn forward_request_roundtrip() {
        let bridge = PlatformBridge::new();
        let call = bridge.geocode_address("Goa");

        let requests = bridge.take_requests();
        let id = match requests.as_slice() {
            [PlatformRequest::Forward { id, query }] => {
                assert_eq!(query, "Goa");
                *id
            }
            other => panic!("unexpected requests {other:?}"),
        };

        bridge
            .complete_geocode(id, Ok(vec![Placemark::new(goa(), "Goa")]))
            .unwrap();

        let placemarks = call.await.unwrap();
        assert_eq!(placemarks[0].display_name(), "Goa");
        assert_eq!(bridge.pending_calls(), 0);
    }

    #[tokio::test]
    async fn reverse_request_carries_coordinate() {
        let bridge = PlatformBridge::new();
        let call = bridge.reverse_geocode(goa());

        let requests = bridge.take_requests();
        assert!(matches!(
            requests.as_slice(),
            [PlatformRequest::Reverse { coordinate, .. }] if *coordinate == goa()
        ));

        let id = match requests[0] {
            PlatformRequest::Reverse { id, .. } => id,
            _ => unreachable!(),
        };
        bridge.complete_geocode(id, Err(GeocodeError::NotFound)).unwrap();
        assert_eq!(call.await, Err(GeocodeError::NotFound));
    }

    #[tokio::test]
    async fn ids_are_unique_across_call_kinds() {
        let bridge = PlatformBridge::new();
        let _geocode = bridge.geocode_address("Goa");
        let _login = bridge.login(Credentials::new("a@b.com", "secret"));

        let ids: Vec<RequestId> = bridge
            .take_requests()
            .into_iter()
            .filter_map(|request| match request {
                PlatformRequest::Forward { id, .. } | PlatformRequest::Login { id, .. } => Some(id),
                _ => None,
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let bridge = PlatformBridge::new();
        assert_eq!(
            bridge.complete_geocode(RequestId::new(99), Err(GeocodeError::NotFound)),
            Err(BridgeError::UnknownRequest(99))
        );
        assert_eq!(
            bridge.complete_login(RequestId::new(7), Err(AuthError::Network("x".to_string()))),
            Err(BridgeError::UnknownRequest(7))
        );
    }

    #[tokio::test]
    async fn answering_twice_is_rejected() {
        let bridge = PlatformBridge::new();
        let call = bridge.geocode_address("Goa");
        let id = only_geocode_id(&bridge);

        bridge.complete_geocode(id, Ok(Vec::new())).unwrap();
        assert_eq!(
            bridge.complete_geocode(id, Ok(Vec::new())),
            Err(BridgeError::UnknownRequest(id.get()))
        );
        assert_eq!(call.await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn geocode_id_cannot_answer_login() {
        let bridge = PlatformBridge::new();
        let _call = bridge.geocode_address("Goa");
        let id = only_geocode_id(&bridge);

        assert_eq!(
            bridge.complete_login(id, Err(AuthError::Network("x".to_string()))),
            Err(BridgeError::UnknownRequest(id.get()))
        );
    }

    #[tokio::test]
    async fn login_request_redacts_password_in_debug() {
        let bridge = PlatformBridge::new();
        let _call = bridge.login(Credentials::new("a@b.com", "hunter2"));

        let debug_str = format!("{:?}", bridge.take_requests());
        assert!(debug_str.contains("a@b.com"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[tokio::test]
    async fn shutdown_fails_pending_calls() {
        let bridge = PlatformBridge::new();
        let geocode = bridge.geocode_address("Goa");
        let login = bridge.login(Credentials::new("a@b.com", "secret"));

        bridge.shutdown();

        assert_eq!(
            geocode.await,
            Err(GeocodeError::Service(BRIDGE_CLOSED.to_string()))
        );
        assert_eq!(login.await, Err(AuthError::Network(BRIDGE_CLOSED.to_string())));
        assert!(bridge.is_closed());
        assert!(bridge.take_requests().is_empty());
    }

    #[tokio::test]
    async fn calls_after_shutdown_fail_immediately() {
        let bridge = PlatformBridge::new();
        bridge.shutdown();

        let result = bridge.reverse_geocode(goa()).await;
        assert_eq!(result, Err(GeocodeError::Service(BRIDGE_CLOSED.to_string())));
        assert!(bridge.take_requests().is_empty());
        assert_eq!(
            bridge.complete_geocode(RequestId::new(1), Ok(Vec::new())),
            Err(BridgeError::Closed)
        );
    }

    #[tokio::test]
    async fn dropped_bridge_fails_pending_calls() {
        let bridge = PlatformBridge::new();
        let call = bridge.login(Credentials::new("a@b.com", "secret"));
        drop(bridge);

        assert_eq!(call.await, Err(AuthError::Network(BRIDGE_CLOSED.to_string())));
    }

    #[test]
    fn device_requests_are_queued() {
        let bridge = PlatformBridge::new();
        bridge.request_authorization();
        bridge.request_position();

        let requests = bridge.take_requests();
        assert!(matches!(
            requests.as_slice(),
            [PlatformRequest::RequestAuthorization, PlatformRequest::RequestPosition]
        ));
    }

    #[test]
    fn services_switch_is_a_snapshot() {
        let bridge = PlatformBridge::new();
        assert!(bridge.services_enabled());
        bridge.set_services_enabled(false);
        assert!(!bridge.services_enabled());
    }

    #[test]
    fn device_callbacks_need_a_listener() {
        let bridge = PlatformBridge::new();
        assert_eq!(bridge.on_position(15.0, 74.0), Err(BridgeError::Closed));
        assert_eq!(bridge.on_position_failed("timeout"), Err(BridgeError::Closed));
    }

    #[test]
    fn authorization_code_updates_snapshot_even_without_listener() {
        let bridge = PlatformBridge::new();
        let _ = bridge.on_authorization_code(4);
        assert_eq!(bridge.authorization_status(), LocationPermission::Granted);

        let _ = bridge.on_authorization_code(42);
        assert_eq!(bridge.authorization_status(), LocationPermission::Granted);
    }

    #[test]
    fn bridge_error_display() {
        assert_eq!(
            BridgeError::UnknownRequest(5).to_string(),
            "Unknown platform request id: 5"
        );
        assert_eq!(BridgeError::Closed.to_string(), "Platform bridge is closed");
    }
}
