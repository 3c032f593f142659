//! Core domain types flowing through the route pipeline.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 point in `(longitude, latitude)` order, as the routing API expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// `[lon, lat]` pair for GeoJSON-style payloads.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

// ---------------------------------------------------------------------------
// Listing stage
// ---------------------------------------------------------------------------

/// One event from the site's index page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleaMarketListing {
    /// Town hosting the event (link text).
    pub town: String,
    /// Market category (link `title` attribute), e.g. "Brocante".
    pub category: String,
    /// Absolute URL of the event's detail page.
    pub detail_url: String,
}

/// Everything scraped from the index page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPage {
    /// Display date of the listing, as printed by the site.
    pub date: String,
    /// Events in page order.
    pub listings: Vec<FleaMarketListing>,
}

/// A town and the location phrase found on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleaMarketLocation {
    pub town: String,
    /// Street/square/area text, e.g. "Rue de la République, stands 9h-18h".
    pub location_phrase: String,
}

// ---------------------------------------------------------------------------
// Geocoding stage
// ---------------------------------------------------------------------------

/// A market that resolved to a point within the search radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedFleaMarket {
    #[serde(flatten)]
    pub location: FleaMarketLocation,
    pub coordinates: Coordinates,
    /// Great-circle distance from the start town.
    pub distance_km: f64,
}

impl GeocodedFleaMarket {
    pub fn town(&self) -> &str {
        &self.location.town
    }
}

// ---------------------------------------------------------------------------
// Routing stage
// ---------------------------------------------------------------------------

/// A single turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub instruction: String,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

/// The route between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub steps: Vec<InstructionStep>,
}

/// Driving route through every retained market and back to the start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    /// Whole loop, rounded to 2 decimals.
    pub total_distance_km: f64,
    /// Whole loop, rounded to 2 decimals.
    pub total_duration_hr: f64,
    /// Cumulative distance at each market, rounded to 1 decimal.
    /// One entry per market; the return leg is not included.
    pub leg_distance_km: Vec<f64>,
    /// Cumulative driving time at each market, whole seconds.
    pub leg_duration_sec: Vec<u64>,
    /// Every segment of the loop, closing leg included.
    pub segments: Vec<RouteSegment>,
    /// Route geometry as a GeoJSON object.
    pub geometry: serde_json::Value,
}
