//! Reusable test helpers for `VeventCore` integration tests.
//!
//! The core is wired to the scripted collaborators from
//! `vevent_core::testing`, so each test decides when every geocoding or
//! login call completes.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::runtime::Handle;
use vevent_core::config::CoreSettings;
use vevent_core::location::{Coordinate, GeocodeError, Placemark};
use vevent_core::testing::{
    FakeDevice, GeocodeQuery, PendingGeocode, ScriptedAuthClient, ScriptedGeocoder,
};
use vevent_core::VeventCore;

/// A core plus handles to its scripted collaborators.
pub struct Harness {
    pub core: VeventCore,
    pub geocoder: Arc<ScriptedGeocoder>,
    pub device: Arc<FakeDevice>,
    pub auth: Arc<ScriptedAuthClient>,
}

impl Harness {
    /// Builds a core with default settings on the current runtime.
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    /// Builds a core with the given settings on the current runtime.
    pub fn with_settings(settings: CoreSettings) -> Self {
        let geocoder = ScriptedGeocoder::new();
        let device = FakeDevice::new();
        let auth = ScriptedAuthClient::new();
        let core = VeventCore::new(
            geocoder.clone(),
            device.clone(),
            auth.clone(),
            settings,
            Handle::current(),
        );
        Self {
            core,
            geocoder,
            device,
            auth,
        }
    }

    /// Lets spawned tasks run, then applies everything they finished.
    pub async fn settle_and_pump(&mut self) -> usize {
        settle().await;
        self.core.pump()
    }

    /// Takes the single parked geocoding call, failing the test otherwise.
    pub fn single_geocode(&self) -> PendingGeocode {
        let mut pending = self.geocoder.take_pending();
        assert_eq!(pending.len(), 1, "expected exactly one geocoding call");
        pending.remove(0)
    }
}

/// Removes the parked forward lookup for `address`, leaving other calls in
/// `pending`.
pub fn take_forward(pending: &mut Vec<PendingGeocode>, address: &str) -> PendingGeocode {
    let index = pending
        .iter()
        .position(|call| call.query == GeocodeQuery::Address(address.to_string()))
        .unwrap_or_else(|| panic!("no forward lookup for {address}"));
    pending.remove(index)
}

/// Yields enough times for spawned tasks to reach their next await point.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Panaji, Goa.
pub fn goa() -> Coordinate {
    Coordinate::new(15.2993, 74.1240).unwrap()
}

/// Central Mumbai.
pub fn mumbai() -> Coordinate {
    Coordinate::new(19.0760, 72.8777).unwrap()
}

/// A one-placemark geocoder answer.
pub fn found(coordinate: Coordinate, locality: &str) -> Result<Vec<Placemark>, GeocodeError> {
    Ok(vec![Placemark::new(coordinate, locality)])
}
