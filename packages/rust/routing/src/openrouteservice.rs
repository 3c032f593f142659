//! openrouteservice directions client (GeoJSON flavour).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use flearoute_shared::{Coordinates, FleaRouteError, InstructionStep, Result, RouteSegment, RoutingConfig};

use crate::{Directions, RouteProvider};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DirectionsRequest<'a> {
    coordinates: Vec<[f64; 2]>,
    instructions: bool,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: serde_json::Value,
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    summary: Summary,
    #[serde(default)]
    segments: Vec<Segment>,
}

// Zero-valued fields are omitted by the API, hence the defaults.
#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    instruction: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiError {
    Detailed { message: String },
    Plain(String),
}

impl From<Segment> for RouteSegment {
    fn from(segment: Segment) -> Self {
        Self {
            distance: segment.distance,
            duration: segment.duration,
            steps: segment
                .steps
                .into_iter()
                .map(|s| InstructionStep {
                    instruction: s.instruction,
                    distance: s.distance,
                    duration: s.duration,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Directions client for `POST /v2/directions/{profile}/geojson`.
pub struct OpenRouteServiceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl OpenRouteServiceClient {
    pub fn new(config: &RoutingConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("flearoute/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FleaRouteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v2/directions/{}/geojson",
                config.base_url.trim_end_matches('/'),
                config.profile
            ),
            api_key: api_key.into(),
            language: config.language.clone(),
        })
    }
}

impl RouteProvider for OpenRouteServiceClient {
    #[instrument(skip_all, fields(waypoints = waypoints.len()))]
    async fn directions(&self, waypoints: &[Coordinates]) -> Result<Directions> {
        let body = DirectionsRequest {
            coordinates: waypoints.iter().map(Coordinates::lon_lat).collect(),
            instructions: true,
            language: &self.language,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FleaRouteError::Routing(format!("could not generate directions: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<ApiErrorBody>().await {
                Ok(ApiErrorBody {
                    error: ApiError::Detailed { message } | ApiError::Plain(message),
                }) => message,
                Err(_) => "no details".to_string(),
            };
            return Err(FleaRouteError::Routing(format!(
                "could not generate directions: HTTP {status}: {detail}"
            )));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|e| FleaRouteError::parse(format!("directions response: {e}")))?;

        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| FleaRouteError::parse("directions response has no route feature"))?;

        debug!(
            distance = feature.properties.summary.distance,
            duration = feature.properties.summary.duration,
            segments = feature.properties.segments.len(),
            "directions received"
        );

        Ok(Directions {
            distance: feature.properties.summary.distance,
            duration: feature.properties.summary.duration,
            segments: feature
                .properties
                .segments
                .into_iter()
                .map(RouteSegment::from)
                .collect(),
            geometry: feature.geometry,
        })
    }
}
