//! Hand-driven collaborators for tests.
//!
//! Every call made against these fakes is parked until the test answers it,
//! so tests decide exactly when, and in which order, asynchronous work
//! completes.
//!
//! Only compiled with `cfg(test)` or the `test-utils` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::auth::{AuthApiClient, AuthError, AuthSession, Credentials};
use crate::location::{
    Coordinate, DeviceLocationService, GeocodeError, GeocodingService, Placemark,
};

/// What a parked geocoding call asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    /// Forward lookup of an address.
    Address(String),
    /// Reverse lookup of a coordinate.
    Coordinate(Coordinate),
}

/// A geocoding call waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingGeocode {
    /// The request as the service received it.
    pub query: GeocodeQuery,
    responder: oneshot::Sender<Result<Vec<Placemark>, GeocodeError>>,
}

impl PendingGeocode {
    /// Completes the call.
    pub fn respond(self, result: Result<Vec<Placemark>, GeocodeError>) {
        let _ = self.responder.send(result);
    }
}

/// Geocoding service whose calls are answered by the test.
#[derive(Debug, Default)]
pub struct ScriptedGeocoder {
    pending: Mutex<VecDeque<PendingGeocode>>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    /// Creates an empty geocoder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns every parked call, oldest first.
    pub fn take_pending(&self) -> Vec<PendingGeocode> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Total number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn park(&self, query: GeocodeQuery) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>> {
        let (responder, rx) = oneshot::channel();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(PendingGeocode { query, responder });
        async move {
            rx.await
                .unwrap_or_else(|_| Err(GeocodeError::Service("call abandoned".to_string())))
        }
        .boxed()
    }
}

impl GeocodingService for ScriptedGeocoder {
    fn geocode_address(
        &self,
        query: &str,
    ) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>> {
        self.park(GeocodeQuery::Address(query.to_string()))
    }

    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>> {
        self.park(GeocodeQuery::Coordinate(coordinate))
    }
}

/// Device service that only counts requests.
#[derive(Debug)]
pub struct FakeDevice {
    enabled: AtomicBool,
    authorization_requests: AtomicUsize,
    position_requests: AtomicUsize,
}

impl FakeDevice {
    /// Creates a device with location services switched on.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            authorization_requests: AtomicUsize::new(0),
            position_requests: AtomicUsize::new(0),
        })
    }

    /// Switches device location services on or off.
    pub fn set_services_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Number of authorization prompts requested.
    pub fn authorization_requests(&self) -> usize {
        self.authorization_requests.load(Ordering::SeqCst)
    }

    /// Number of one-shot position fixes requested.
    pub fn position_requests(&self) -> usize {
        self.position_requests.load(Ordering::SeqCst)
    }
}

impl DeviceLocationService for FakeDevice {
    fn services_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn request_authorization(&self) {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_position(&self) {
        self.position_requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// A login call waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingLogin {
    /// Email the call was made with.
    pub email: String,
    responder: oneshot::Sender<Result<AuthSession, AuthError>>,
}

impl PendingLogin {
    /// Completes the call.
    pub fn respond(self, result: Result<AuthSession, AuthError>) {
        let _ = self.responder.send(result);
    }
}

/// Authentication client whose calls are answered by the test.
#[derive(Debug, Default)]
pub struct ScriptedAuthClient {
    pending: Mutex<VecDeque<PendingLogin>>,
    calls: AtomicUsize,
}

impl ScriptedAuthClient {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns every parked call, oldest first.
    pub fn take_pending(&self) -> Vec<PendingLogin> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Total number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthApiClient for ScriptedAuthClient {
    fn login(&self, credentials: Credentials) -> BoxFuture<'static, Result<AuthSession, AuthError>> {
        let (responder, rx) = oneshot::channel();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(PendingLogin {
                email: credentials.email().to_string(),
                responder,
            });
        async move {
            rx.await
                .unwrap_or_else(|_| Err(AuthError::Network("call abandoned".to_string())))
        }
        .boxed()
    }
}
