//! Forward and reverse geocoding.
//!
//! [`GeocodingService`] is the external collaborator (the platform geocoder,
//! reached through the host app). [`GeocodingAdapter`] turns its raw
//! placemark lists into [`ResolvedLocation`] values. The adapter keeps no
//! state and caches nothing: every call goes to the service.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::GeocodeError;
use super::types::{Coordinate, Placemark, ResolvedLocation, UNKNOWN_LOCATION};

/// External geocoding service.
///
/// Each call must complete exactly once, with either a (possibly empty)
/// placemark list or an error.
pub trait GeocodingService: Send + Sync {
    /// Looks up placemarks matching a free-text address.
    fn geocode_address(&self, query: &str)
        -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>>;

    /// Looks up placemarks at a coordinate.
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>>;
}

/// Stateless wrapper that applies placemark selection rules.
#[derive(Clone)]
pub struct GeocodingAdapter {
    service: Arc<dyn GeocodingService>,
}

impl GeocodingAdapter {
    /// Creates an adapter over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GeocodingService>) -> Self {
        Self { service }
    }

    /// Resolves an address to a location.
    ///
    /// Uses the first placemark. A blank query is answered with
    /// [`GeocodeError::NotFound`] without calling the service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] when nothing matched and
    /// [`GeocodeError::Service`] when the service failed.
    pub async fn forward(&self, query: &str) -> Result<ResolvedLocation, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound);
        }

        let placemarks = self.service.geocode_address(query).await?;
        let first = placemarks.into_iter().next().ok_or(GeocodeError::NotFound)?;
        Ok(ResolvedLocation::new(first.coordinate, first.display_name()))
    }

    /// Resolves a coordinate to a place name.
    ///
    /// An empty placemark list is not an error: it yields
    /// [`UNKNOWN_LOCATION`] at the requested coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Service`] when the service failed.
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<ResolvedLocation, GeocodeError> {
        let placemarks = self.service.reverse_geocode(coordinate).await?;
        let location = match placemarks.into_iter().next() {
            Some(first) => ResolvedLocation::new(
                Some(first.coordinate.unwrap_or(coordinate)),
                first.display_name(),
            ),
            None => ResolvedLocation::new(Some(coordinate), UNKNOWN_LOCATION),
        };
        Ok(location)
    }
}

impl fmt::Debug for GeocodingAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodingAdapter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::FutureExt;

    use super::*;

    /// Answers every call with a fixed response and records the queries.
    struct FixedService {
        response: Result<Vec<Placemark>, GeocodeError>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedService {
        fn new(response: Result<Vec<Placemark>, GeocodeError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    impl GeocodingService for FixedService {
        fn geocode_address(
            &self,
            query: &str,
        ) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>> {
            self.queries.lock().unwrap().push(query.to_string());
            futures::future::ready(self.response.clone()).boxed()
        }

        fn reverse_geocode(
            &self,
            coordinate: Coordinate,
        ) -> BoxFuture<'static, Result<Vec<Placemark>, GeocodeError>> {
            self.queries
                .lock()
                .unwrap()
                .push(format!("{},{}", coordinate.latitude, coordinate.longitude));
            futures::future::ready(self.response.clone()).boxed()
        }
    }

    fn goa() -> Coordinate {
        Coordinate::new(15.2993, 74.1240).unwrap()
    }

    #[tokio::test]
    async fn forward_uses_first_placemark() {
        let service = FixedService::new(Ok(vec![
            Placemark::new(goa(), "Goa"),
            Placemark::new(Coordinate::new(19.0760, 72.8777).unwrap(), "Mumbai"),
        ]));
        let adapter = GeocodingAdapter::new(service);

        let location = adapter.forward("Goa").await.unwrap();

        assert_eq!(location.display_name, "Goa");
        assert_eq!(location.coordinate, Some(goa()));
    }

    #[tokio::test]
    async fn forward_without_placemarks_is_not_found() {
        let adapter = GeocodingAdapter::new(FixedService::new(Ok(vec![])));
        assert_eq!(adapter.forward("Atlantis").await, Err(GeocodeError::NotFound));
    }

    #[tokio::test]
    async fn forward_blank_query_skips_service() {
        let service = FixedService::new(Ok(vec![Placemark::new(goa(), "Goa")]));
        let adapter = GeocodingAdapter::new(service.clone());

        assert_eq!(adapter.forward("   ").await, Err(GeocodeError::NotFound));
        assert!(service.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forward_trims_query() {
        let service = FixedService::new(Ok(vec![Placemark::new(goa(), "Goa")]));
        let adapter = GeocodingAdapter::new(service.clone());

        adapter.forward("  Goa ").await.unwrap();

        assert_eq!(*service.queries.lock().unwrap(), vec!["Goa".to_string()]);
    }

    #[tokio::test]
    async fn forward_propagates_service_error() {
        let adapter = GeocodingAdapter::new(FixedService::new(Err(GeocodeError::Service(
            "offline".to_string(),
        ))));
        assert_eq!(
            adapter.forward("Goa").await,
            Err(GeocodeError::Service("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn reverse_without_placemarks_is_unknown_location() {
        let adapter = GeocodingAdapter::new(FixedService::new(Ok(vec![])));
        let origin = Coordinate::new(0.0, 0.0).unwrap();

        let location = adapter.reverse(origin).await.unwrap();

        assert_eq!(location.display_name, UNKNOWN_LOCATION);
        assert_eq!(location.coordinate, Some(origin));
    }

    #[tokio::test]
    async fn reverse_falls_back_to_requested_coordinate() {
        let placemark = Placemark {
            coordinate: None,
            locality: Some("Panaji".to_string()),
        };
        let adapter = GeocodingAdapter::new(FixedService::new(Ok(vec![placemark])));

        let location = adapter.reverse(goa()).await.unwrap();

        assert_eq!(location.display_name, "Panaji");
        assert_eq!(location.coordinate, Some(goa()));
    }

    #[tokio::test]
    async fn reverse_placemark_without_locality_is_unknown_location() {
        let placemark = Placemark {
            coordinate: Some(goa()),
            locality: None,
        };
        let adapter = GeocodingAdapter::new(FixedService::new(Ok(vec![placemark])));

        let location = adapter.reverse(goa()).await.unwrap();

        assert_eq!(location.display_name, UNKNOWN_LOCATION);
    }
}
