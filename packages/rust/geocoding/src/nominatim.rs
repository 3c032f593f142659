//! Nominatim (OpenStreetMap) search client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use flearoute_shared::{Coordinates, FleaRouteError, GeocodingConfig, Result};

use crate::Geocoder;

/// One search hit. Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FleaRouteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| FleaRouteError::Network(format!("geocoding '{query}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FleaRouteError::Network(format!(
                "geocoding '{query}': HTTP {status}"
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| FleaRouteError::parse(format!("geocoding '{query}': {e}")))?;

        let Some(place) = places.first() else {
            debug!("no geocoding result");
            return Ok(None);
        };

        let latitude: f64 = place
            .lat
            .parse()
            .map_err(|e| FleaRouteError::parse(format!("invalid latitude '{}': {e}", place.lat)))?;
        let longitude: f64 = place
            .lon
            .parse()
            .map_err(|e| FleaRouteError::parse(format!("invalid longitude '{}': {e}", place.lon)))?;

        debug!(latitude, longitude, display_name = %place.display_name, "geocoded");

        Ok(Some(Coordinates::new(longitude, latitude)))
    }
}
