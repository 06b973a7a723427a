//! State behind the "Select Location" sheet.
//!
//! The picker combines a search box and a draggable map. Typing a query
//! forward-geocodes it and recentres the map; dragging the map
//! reverse-geocodes the new centre. The resulting name is only a proposal
//! until the sheet is confirmed, at which point the caller hands
//! [`LocationPicker::selection`] to the location coordinator.
//!
//! Unlike the coordinator, the picker keeps its previous name when the
//! geocoding service fails; only "nothing found" is surfaced, as
//! [`NO_RESULTS`].

use tokio::runtime::Handle;

use crate::dispatch::{Mailbox, RequestId};

use super::error::GeocodeError;
use super::geocoder::GeocodingAdapter;
use super::privacy::log_tag;
use super::types::{Coordinate, MapRegion, ResolvedLocation, NO_RESULTS};

/// Which picker interaction a lookup belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerLookup {
    /// Forward lookup of the search text.
    Search,
    /// Reverse lookup of the map centre.
    MapCentre,
}

/// Completion message for a picker lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerCompletion {
    /// Request this result answers.
    pub request: RequestId,
    /// Interaction that issued it.
    pub lookup: PickerLookup,
    /// Lookup outcome.
    pub outcome: Result<ResolvedLocation, GeocodeError>,
}

/// Search/map state for choosing a location by hand.
#[derive(Debug)]
pub struct LocationPicker {
    geocoder: GeocodingAdapter,
    mailbox: Mailbox<PickerCompletion>,
    region: MapRegion,
    search_text: String,
    location_name: String,
    in_flight: usize,
}

impl LocationPicker {
    /// Opens a picker showing `region` with no name selected.
    #[must_use]
    pub fn new(geocoder: GeocodingAdapter, region: MapRegion, runtime: Handle) -> Self {
        Self {
            geocoder,
            mailbox: Mailbox::new(runtime),
            region,
            search_text: String::new(),
            location_name: String::new(),
            in_flight: 0,
        }
    }

    /// Visible map region.
    #[must_use]
    pub const fn region(&self) -> &MapRegion {
        &self.region
    }

    /// Current search box contents.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Name shown under the map; empty until a lookup lands.
    #[must_use]
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Name to commit when the sheet is confirmed, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        Some(self.location_name.as_str()).filter(|name| !name.is_empty())
    }

    /// Number of lookups issued but not yet applied.
    #[must_use]
    pub const fn pending_lookups(&self) -> usize {
        self.in_flight
    }

    /// Updates the search text and looks it up.
    ///
    /// Returns `None` without issuing a lookup when the text is empty.
    pub fn search(&mut self, query: &str) -> Option<RequestId> {
        query.clone_into(&mut self.search_text);
        if query.is_empty() {
            return None;
        }

        let request = self.mailbox.next_request_id();
        let geocoder = self.geocoder.clone();
        let query = query.to_string();
        self.in_flight += 1;
        self.mailbox.dispatch(async move {
            PickerCompletion {
                request,
                lookup: PickerLookup::Search,
                outcome: geocoder.forward(&query).await,
            }
        });
        Some(request)
    }

    /// Moves the map to `center` and looks up the place there.
    pub fn move_region(&mut self, center: Coordinate) -> RequestId {
        self.region = self.region.recentred(center);

        let request = self.mailbox.next_request_id();
        log::debug!("picker map moved near {}", log_tag(&center));
        let geocoder = self.geocoder.clone();
        self.in_flight += 1;
        self.mailbox.dispatch(async move {
            PickerCompletion {
                request,
                lookup: PickerLookup::MapCentre,
                outcome: geocoder.reverse(center).await,
            }
        });
        request
    }

    /// Applies every finished lookup without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.mailbox.try_next() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for the next finished lookup and applies it.
    pub async fn next_update(&mut self) {
        if let Some(completion) = self.mailbox.next().await {
            self.apply(completion);
        }
    }

    fn apply(&mut self, completion: PickerCompletion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let PickerCompletion {
            request,
            lookup,
            outcome,
        } = completion;

        match (lookup, outcome) {
            (PickerLookup::Search, Ok(location)) => match location.coordinate {
                // Recentring here does not trigger another reverse lookup.
                Some(center) => {
                    self.region = self.region.recentred(center);
                    self.location_name = location.display_name;
                }
                None => NO_RESULTS.clone_into(&mut self.location_name),
            },
            (PickerLookup::Search, Err(GeocodeError::NotFound)) => {
                NO_RESULTS.clone_into(&mut self.location_name);
            }
            (PickerLookup::MapCentre, Ok(location)) => {
                self.location_name = location.display_name;
            }
            (lookup, Err(e)) => {
                log::warn!("picker {lookup:?} lookup {request} failed: {e}");
            }
        }
    }
}
