//! Start-town resolution and the radius filter.

use tracing::{debug, info, instrument, warn};

use flearoute_shared::{Coordinates, FleaMarketLocation, FleaRouteError, GeocodedFleaMarket, Result};

use crate::{Geocoder, haversine_km};

/// Strict radius test: a market exactly on the boundary is out.
pub fn within_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km < radius_km
}

/// Geocode the start town. Failure here aborts the run.
#[instrument(skip(geocoder))]
pub async fn resolve_start<G: Geocoder>(geocoder: &G, town: &str, country: &str) -> Result<Coordinates> {
    let query = format!("{town}, {country}");
    match geocoder.geocode(&query).await {
        Ok(Some(coords)) => Ok(coords),
        Ok(None) => Err(FleaRouteError::Geocoding(format!(
            "could not geocode start town '{town}'"
        ))),
        Err(e) => Err(FleaRouteError::Geocoding(format!(
            "could not geocode start town '{town}': {e}"
        ))),
    }
}

/// Geocode a market by its location phrase, falling back to the town alone.
pub async fn locate_market<G: Geocoder>(
    geocoder: &G,
    location: &FleaMarketLocation,
    country: &str,
) -> Option<Coordinates> {
    let precise = format!("{}, {}, {country}", location.location_phrase, location.town);
    match geocoder.geocode(&precise).await {
        Ok(Some(coords)) => return Some(coords),
        Ok(None) => debug!(query = %precise, "no result, falling back to town"),
        Err(e) => warn!(query = %precise, error = %e, "geocoding failed, falling back to town"),
    }

    let coarse = format!("{}, {country}", location.town);
    match geocoder.geocode(&coarse).await {
        Ok(found) => found,
        Err(e) => {
            warn!(query = %coarse, error = %e, "geocoding failed");
            None
        }
    }
}

/// Resolve the start town and keep the markets strictly within `radius_km`.
///
/// Markets that cannot be located are dropped. Order is preserved.
#[instrument(skip(geocoder, locations), fields(locations = locations.len()))]
pub async fn geocode_and_filter<G: Geocoder>(
    geocoder: &G,
    start_town: &str,
    locations: &[FleaMarketLocation],
    radius_km: f64,
    country: &str,
) -> Result<(Coordinates, Vec<GeocodedFleaMarket>)> {
    let start = resolve_start(geocoder, start_town, country).await?;
    let mut kept = Vec::new();

    for location in locations {
        let Some(coordinates) = locate_market(geocoder, location, country).await else {
            warn!(town = %location.town, "could not locate flea market, dropping it");
            continue;
        };

        let distance_km = haversine_km(start, coordinates);
        if !within_radius(distance_km, radius_km) {
            debug!(town = %location.town, distance_km, "outside radius");
            continue;
        }

        info!(
            from = start_town,
            to = %location.town,
            distance_km = (distance_km * 100.0).round() / 100.0,
            "flea market within radius"
        );

        kept.push(GeocodedFleaMarket {
            location: location.clone(),
            coordinates,
            distance_km,
        });
    }

    Ok((start, kept))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Answers from a fixed table and records every query.
    #[derive(Default)]
    struct TableGeocoder {
        places: HashMap<String, Coordinates>,
        failing: Vec<String>,
        queries: Mutex<Vec<String>>,
    }

    impl TableGeocoder {
        fn with(mut self, query: &str, lon: f64, lat: f64) -> Self {
            self.places.insert(query.into(), Coordinates::new(lon, lat));
            self
        }

        fn failing_on(mut self, query: &str) -> Self {
            self.failing.push(query.into());
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl Geocoder for TableGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.failing.iter().any(|q| q == query) {
                return Err(FleaRouteError::Network("timeout".into()));
            }
            Ok(self.places.get(query).copied())
        }
    }

    fn location(town: &str, phrase: &str) -> FleaMarketLocation {
        FleaMarketLocation {
            town: town.into(),
            location_phrase: phrase.into(),
        }
    }

    #[test]
    fn boundary_is_excluded() {
        assert!(within_radius(49.999, 50.0));
        assert!(!within_radius(50.0, 50.0));
        assert!(!within_radius(50.001, 50.0));
    }

    #[tokio::test]
    async fn start_town_must_resolve() {
        let geocoder = TableGeocoder::default();
        let err = resolve_start(&geocoder, "Atlantis", "France").await.unwrap_err();
        assert!(matches!(err, FleaRouteError::Geocoding(_)));
        assert_eq!(geocoder.queries(), ["Atlantis, France"]);

        let geocoder = TableGeocoder::default().failing_on("Lyon, France");
        assert!(resolve_start(&geocoder, "Lyon", "France").await.is_err());
    }

    #[tokio::test]
    async fn market_falls_back_to_town() {
        let geocoder = TableGeocoder::default().with("Vienne, France", 4.874, 45.525);
        let coords = locate_market(&geocoder, &location("Vienne", "Quartier inconnu"), "France")
            .await
            .expect("fallback");
        assert_eq!(coords, Coordinates::new(4.874, 45.525));
        assert_eq!(
            geocoder.queries(),
            ["Quartier inconnu, Vienne, France", "Vienne, France"]
        );
    }

    #[tokio::test]
    async fn market_falls_back_after_error() {
        let geocoder = TableGeocoder::default()
            .failing_on("Place Bellecour, Lyon, France")
            .with("Lyon, France", 4.8357, 45.764);
        let coords = locate_market(&geocoder, &location("Lyon", "Place Bellecour"), "France").await;
        assert_eq!(coords, Some(Coordinates::new(4.8357, 45.764)));
    }

    #[tokio::test]
    async fn unlocatable_market_is_dropped() {
        let geocoder = TableGeocoder::default().with("Lyon, France", 4.8357, 45.764);
        let (_, kept) = geocode_and_filter(
            &geocoder,
            "Lyon",
            &[location("Ghostville", "Rue fantôme")],
            50.0,
            "France",
        )
        .await
        .unwrap();
        assert!(kept.is_empty());
    }

    #[tokio::test]
    async fn filter_keeps_only_close_markets_in_order() {
        let geocoder = TableGeocoder::default()
            .with("Lyon, France", 4.8357, 45.764)
            // ~25 km south
            .with("Place de Miremont, Vienne, France", 4.874, 45.525)
            // ~390 km north
            .with("Rue de Rivoli, Paris, France", 2.3522, 48.8566)
            // ~1 km
            .with("Place Bellecour, Lyon, France", 4.832, 45.757);

        let locations = [
            location("Vienne", "Place de Miremont"),
            location("Paris", "Rue de Rivoli"),
            location("Lyon", "Place Bellecour"),
        ];

        let (start, kept) = geocode_and_filter(&geocoder, "Lyon", &locations, 50.0, "France")
            .await
            .unwrap();

        assert_eq!(start, Coordinates::new(4.8357, 45.764));
        let towns: Vec<_> = kept.iter().map(|m| m.town()).collect();
        assert_eq!(towns, ["Vienne", "Lyon"]);
        assert!(kept.iter().all(|m| m.distance_km < 50.0));
        assert_eq!(kept[1].location.location_phrase, "Place Bellecour");
    }

    #[tokio::test]
    async fn tiny_radius_keeps_nothing() {
        let geocoder = TableGeocoder::default()
            .with("Lyon, France", 4.8357, 45.764)
            .with("Place de Miremont, Vienne, France", 4.874, 45.525);

        let (_, kept) = geocode_and_filter(
            &geocoder,
            "Lyon",
            &[location("Vienne", "Place de Miremont")],
            1.0,
            "France",
        )
        .await
        .unwrap();
        assert!(kept.is_empty());
    }
}
