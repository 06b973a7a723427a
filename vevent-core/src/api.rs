//! Top-level facade consumed by the FFI layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::auth::{AuthApiClient, AuthCoordinator};
use crate::config::CoreSettings;
use crate::dispatch::RequestId;
use crate::location::{
    DeviceLocationService, GeocodingAdapter, GeocodingService, LocationCoordinator, LocationPicker,
    MapRegion,
};
use crate::platform::PlatformBridge;

/// Which top-level screen the app should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    /// Email/password form.
    Login,
    /// Event feed with the location header.
    Home,
}

/// Core interface for Vevent.
///
/// Owns the location coordinator, the login coordinator and, while the
/// "Select Location" sheet is open, a [`LocationPicker`]. The owner calls
/// [`pump`](Self::pump) from its own thread to apply finished background
/// work.
#[derive(Debug)]
pub struct VeventCore {
    runtime: Handle,
    geocoder: GeocodingAdapter,
    picker_region: MapRegion,
    location: LocationCoordinator,
    auth: AuthCoordinator,
    picker: Option<LocationPicker>,
}

impl VeventCore {
    /// Creates a core from its collaborators.
    ///
    /// Nothing is requested from the device until
    /// [`LocationCoordinator::start`] is called.
    #[must_use]
    pub fn new(
        geocoding: Arc<dyn GeocodingService>,
        device: Arc<dyn DeviceLocationService>,
        auth_client: Arc<dyn AuthApiClient>,
        settings: CoreSettings,
        runtime: Handle,
    ) -> Self {
        let geocoder = GeocodingAdapter::new(geocoding);
        let picker_region = settings.location.picker_region;
        let location = LocationCoordinator::new(
            geocoder.clone(),
            device,
            settings.location,
            runtime.clone(),
        );
        let auth = AuthCoordinator::new(auth_client, settings.auth, runtime.clone());

        Self {
            runtime,
            geocoder,
            picker_region,
            location,
            auth,
            picker: None,
        }
    }

    /// Creates a core whose collaborators are all served by `bridge`, and
    /// routes the bridge's device callbacks to the location coordinator.
    #[must_use]
    pub fn with_bridge(bridge: &Arc<PlatformBridge>, settings: CoreSettings, runtime: Handle) -> Self {
        let core = Self::new(
            bridge.clone(),
            bridge.clone(),
            bridge.clone(),
            settings,
            runtime,
        );
        bridge.connect_device_events(core.location.device_events());
        core
    }

    /// The location coordinator.
    #[must_use]
    pub const fn location(&self) -> &LocationCoordinator {
        &self.location
    }

    /// Mutable access to the location coordinator.
    pub fn location_mut(&mut self) -> &mut LocationCoordinator {
        &mut self.location
    }

    /// The login coordinator.
    #[must_use]
    pub const fn auth(&self) -> &AuthCoordinator {
        &self.auth
    }

    /// Mutable access to the login coordinator.
    pub fn auth_mut(&mut self) -> &mut AuthCoordinator {
        &mut self.auth
    }

    /// `Home` once logged in, `Login` otherwise.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        if self.auth.state().is_authenticated() {
            Screen::Home
        } else {
            Screen::Login
        }
    }

    // ==================== Picker ====================

    /// Opens the location picker on the configured region, replacing any
    /// picker already open.
    pub fn open_picker(&mut self) -> &mut LocationPicker {
        if self.picker.is_some() {
            log::debug!("reopening location picker; pending lookups discarded");
        }
        self.picker.insert(LocationPicker::new(
            self.geocoder.clone(),
            self.picker_region,
            self.runtime.clone(),
        ))
    }

    /// The open picker, if any.
    #[must_use]
    pub const fn picker(&self) -> Option<&LocationPicker> {
        self.picker.as_ref()
    }

    /// Mutable access to the open picker, if any.
    pub fn picker_mut(&mut self) -> Option<&mut LocationPicker> {
        self.picker.as_mut()
    }

    /// Closes the picker without changing the location.
    pub fn cancel_picker(&mut self) {
        self.picker = None;
    }

    /// Closes the picker and resolves its selection as the new location.
    ///
    /// Returns `None` (and changes nothing) when no picker is open or
    /// nothing was selected.
    pub fn commit_picker(&mut self) -> Option<RequestId> {
        let picker = self.picker.take()?;
        let selection = picker.selection()?;
        Some(self.location.update_location_from(selection))
    }

    // ==================== Mailboxes ====================

    /// Applies all finished background work. Returns how many completions
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let picker = self.picker.as_mut().map_or(0, LocationPicker::pump);
        self.location.pump() + self.auth.pump() + picker
    }
}
