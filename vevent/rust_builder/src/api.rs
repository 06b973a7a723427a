//! API bridging layer that exposes vevent-core functionality.
//!
//! Dart drives everything from the UI isolate: it forwards platform
//! callbacks, drains [`HostRequest`]s, answers them by id, and calls
//! [`VeventApp::pump`] whenever it wants fresh state.

use std::sync::Arc;

use flutter_rust_bridge::frb;
use tokio::runtime::Runtime;
use vevent_core::auth::{AuthError, AuthSession};
use vevent_core::config::CoreSettings;
use vevent_core::dispatch::RequestId;
use vevent_core::location::{Coordinate, GeocodeError, Placemark};
use vevent_core::platform::{PlatformBridge, PlatformRequest};
use vevent_core::{Screen, VeventCore};

/// Top-level screen (FFI mirror of [`Screen`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    /// Email/password form.
    Login,
    /// Event feed.
    Home,
}

impl From<Screen> for AppScreen {
    fn from(screen: Screen) -> Self {
        match screen {
            Screen::Login => Self::Login,
            Screen::Home => Self::Home,
        }
    }
}

/// Work Dart must perform and answer.
#[derive(Debug, Clone)]
pub enum HostRequest {
    /// Ask for location permission.
    RequestAuthorization,
    /// Get one position fix and report it with `on_position`.
    RequestPosition,
    /// Forward-geocode `query`; answer with `complete_geocode(id, ..)`.
    Forward { id: u64, query: String },
    /// Reverse-geocode a coordinate; answer with `complete_geocode(id, ..)`.
    Reverse { id: u64, latitude: f64, longitude: f64 },
    /// Call the auth API; answer with `complete_login(id, ..)`.
    Login { id: u64, email: String, password: String },
}

impl From<PlatformRequest> for HostRequest {
    fn from(request: PlatformRequest) -> Self {
        match request {
            PlatformRequest::RequestAuthorization => Self::RequestAuthorization,
            PlatformRequest::RequestPosition => Self::RequestPosition,
            PlatformRequest::Forward { id, query } => Self::Forward { id: id.get(), query },
            PlatformRequest::Reverse { id, coordinate } => Self::Reverse {
                id: id.get(),
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            },
            PlatformRequest::Login { id, credentials } => Self::Login {
                id: id.get(),
                email: credentials.email().to_string(),
                password: credentials.password().to_string(),
            },
        }
    }
}

/// A geocoder result as reported by the platform.
#[derive(Debug, Clone)]
pub struct HostPlacemark {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub locality: Option<String>,
}

impl From<HostPlacemark> for Placemark {
    fn from(placemark: HostPlacemark) -> Self {
        let coordinate = match (placemark.latitude, placemark.longitude) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude).ok(),
            _ => None,
        };
        Self {
            coordinate,
            locality: placemark.locality,
        }
    }
}

/// App state owned by Dart (wrapper around [`VeventCore`]).
#[frb(opaque)]
pub struct VeventApp {
    core: VeventCore,
    bridge: Arc<PlatformBridge>,
    /// Worker threads for geocoding and login tasks. Dropped last.
    #[allow(dead_code)]
    runtime: Runtime,
}

impl VeventApp {
    /// Creates the app state. `settings_json` may be omitted for defaults.
    pub fn new(settings_json: Option<String>) -> Result<Self, String> {
        let settings = match settings_json {
            Some(json) => CoreSettings::from_json(&json).map_err(|e| e.to_string())?,
            None => CoreSettings::default(),
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("vevent-worker")
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to start runtime: {e}"))?;

        let bridge = Arc::new(PlatformBridge::new());
        let core = VeventCore::with_bridge(&bridge, settings, runtime.handle().clone());
        log::info!("vevent core ready");

        Ok(Self {
            core,
            bridge,
            runtime,
        })
    }

    /// Applies finished background work. Returns the number of updates.
    #[frb(sync)]
    pub fn pump(&mut self) -> u32 {
        u32::try_from(self.core.pump()).unwrap_or(u32::MAX)
    }

    /// Which screen to show.
    #[frb(sync)]
    #[must_use]
    pub fn screen(&self) -> AppScreen {
        self.core.screen().into()
    }

    // ==================== Host requests ====================

    /// Drains the requests Dart must perform.
    #[frb(sync)]
    pub fn take_requests(&self) -> Vec<HostRequest> {
        self.bridge
            .take_requests()
            .into_iter()
            .map(HostRequest::from)
            .collect()
    }

    /// Answers a geocoding request with the platform's placemarks.
    #[frb(sync)]
    pub fn complete_geocode(&self, id: u64, placemarks: Vec<HostPlacemark>) -> Result<(), String> {
        let placemarks = placemarks.into_iter().map(Placemark::from).collect();
        self.bridge
            .complete_geocode(RequestId::new(id), Ok(placemarks))
            .map_err(|e| e.to_string())
    }

    /// Fails a geocoding request.
    #[frb(sync)]
    pub fn fail_geocode(&self, id: u64, not_found: bool, message: String) -> Result<(), String> {
        let error = if not_found {
            GeocodeError::NotFound
        } else {
            GeocodeError::Service(message)
        };
        self.bridge
            .complete_geocode(RequestId::new(id), Err(error))
            .map_err(|e| e.to_string())
    }

    /// Answers a login request with the API response.
    #[frb(sync)]
    pub fn complete_login(
        &self,
        id: u64,
        session_token: Option<String>,
        user_json: String,
    ) -> Result<(), String> {
        let user = serde_json::from_str(&user_json).map_err(|e| format!("Invalid user JSON: {e}"))?;
        self.bridge
            .complete_login(RequestId::new(id), Ok(AuthSession::new(session_token, user)))
            .map_err(|e| e.to_string())
    }

    /// Fails a login request with the API's error description.
    #[frb(sync)]
    pub fn fail_login(&self, id: u64, invalid_credentials: bool, message: String) -> Result<(), String> {
        let error = if invalid_credentials {
            AuthError::InvalidCredentials(message)
        } else {
            AuthError::Network(message)
        };
        self.bridge
            .complete_login(RequestId::new(id), Err(error))
            .map_err(|e| e.to_string())
    }

    // ==================== Device callbacks ====================

    /// Reports whether location services are switched on.
    #[frb(sync)]
    pub fn set_services_enabled(&self, enabled: bool) {
        self.bridge.set_services_enabled(enabled);
    }

    /// Reports a permission status code.
    #[frb(sync)]
    pub fn on_authorization_code(&self, code: i32) -> Result<(), String> {
        self.bridge
            .on_authorization_code(code)
            .map_err(|e| e.to_string())
    }

    /// Reports a position fix.
    #[frb(sync)]
    pub fn on_position(&self, latitude: f64, longitude: f64) -> Result<(), String> {
        self.bridge
            .on_position(latitude, longitude)
            .map_err(|e| e.to_string())
    }

    /// Reports a failed position request.
    #[frb(sync)]
    pub fn on_position_failed(&self, reason: String) -> Result<(), String> {
        self.bridge
            .on_position_failed(reason)
            .map_err(|e| e.to_string())
    }

    // ==================== Location ====================

    /// Requests location permission.
    #[frb(sync)]
    pub fn start_location(&mut self) {
        self.core.location_mut().start();
    }

    /// Re-resolves the current device location.
    #[frb(sync)]
    pub fn fetch_current_location(&mut self) {
        self.core.location_mut().fetch_current_location();
    }

    /// Resolves a typed address as the current location.
    #[frb(sync)]
    pub fn update_location_from(&mut self, address: String) {
        self.core.location_mut().update_location_from(&address);
    }

    /// The location name for the header; never empty.
    #[frb(sync)]
    #[must_use]
    pub fn location_name(&self) -> String {
        self.core.location().display_name().to_string()
    }

    // ==================== Picker ====================

    /// Opens the "Select Location" sheet.
    #[frb(sync)]
    pub fn open_picker(&mut self) {
        self.core.open_picker();
    }

    /// Searches in the open picker.
    #[frb(sync)]
    pub fn picker_search(&mut self, query: String) -> Result<(), String> {
        let picker = self.core.picker_mut().ok_or("Location picker is not open")?;
        picker.search(&query);
        Ok(())
    }

    /// Moves the open picker's map.
    #[frb(sync)]
    pub fn picker_move(&mut self, latitude: f64, longitude: f64) -> Result<(), String> {
        let center = Coordinate::new(latitude, longitude).map_err(|e| e.to_string())?;
        let picker = self.core.picker_mut().ok_or("Location picker is not open")?;
        picker.move_region(center);
        Ok(())
    }

    /// Name shown under the picker map, if the picker is open.
    #[frb(sync)]
    #[must_use]
    pub fn picker_location_name(&self) -> Option<String> {
        self.core
            .picker()
            .map(|picker| picker.location_name().to_string())
    }

    /// Confirms the picker. Returns false if nothing was selected.
    #[frb(sync)]
    pub fn commit_picker(&mut self) -> bool {
        self.core.commit_picker().is_some()
    }

    /// Dismisses the picker.
    #[frb(sync)]
    pub fn cancel_picker(&mut self) {
        self.core.cancel_picker();
    }

    // ==================== Login ====================

    /// Starts a login request.
    #[frb(sync)]
    pub fn submit_login(&mut self, email: String, password: String) -> Result<(), String> {
        self.core
            .auth_mut()
            .submit_login(&email, &password)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Whether a login request is outstanding (drives the spinner).
    #[frb(sync)]
    #[must_use]
    pub fn is_logging_in(&self) -> bool {
        self.core.auth().state().is_in_flight()
    }

    /// The failure message to show under the form, if any.
    #[frb(sync)]
    #[must_use]
    pub fn login_error(&self) -> Option<String> {
        self.core.auth().state().error_message().map(str::to_string)
    }

    /// Dismisses the login failure message.
    #[frb(sync)]
    pub fn dismiss_login_error(&mut self) {
        self.core.auth_mut().reset();
    }

    /// Logs out.
    #[frb(sync)]
    pub fn sign_out(&mut self) {
        self.core.auth_mut().sign_out();
    }
}

impl Drop for VeventApp {
    fn drop(&mut self) {
        self.bridge.shutdown();
        log::debug!("vevent core shut down");
    }
}
