//! Waypoint ordering and leg accumulation.

use tracing::{info, instrument};

use flearoute_shared::{Coordinates, FleaRouteError, GeocodedFleaMarket, Result, RouteResult, RouteSegment};

use crate::RouteProvider;

/// Closed loop: start, every market in order, start again.
pub fn waypoints(start: Coordinates, markets: &[GeocodedFleaMarket]) -> Vec<Coordinates> {
    let mut steps = Vec::with_capacity(markets.len() + 2);
    steps.push(start);
    steps.extend(markets.iter().map(|m| m.coordinates));
    steps.push(start);
    steps
}

/// Cumulative distance (km, 1 dp) and duration (whole seconds) at the end of
/// each of the first `legs` segments.
pub fn cumulative_legs(segments: &[RouteSegment], legs: usize) -> Result<(Vec<f64>, Vec<u64>)> {
    if segments.len() < legs {
        return Err(FleaRouteError::parse(format!(
            "route has {} segments, expected at least {legs}",
            segments.len()
        )));
    }

    let mut distance_m = 0.0;
    let mut duration_s = 0.0;
    let mut distances = Vec::with_capacity(legs);
    let mut durations = Vec::with_capacity(legs);

    for segment in &segments[..legs] {
        distance_m += segment.distance;
        duration_s += segment.duration;
        distances.push(round_to(distance_m / 1000.0, 1));
        durations.push(duration_s as u64);
    }

    Ok((distances, durations))
}

/// Route the closed loop through `markets` and derive per-leg figures.
#[instrument(skip_all, fields(markets = markets.len()))]
pub async fn plan_route<R: RouteProvider>(
    router: &R,
    start: Coordinates,
    markets: &[GeocodedFleaMarket],
) -> Result<RouteResult> {
    if markets.is_empty() {
        return Err(FleaRouteError::validation(
            "no flea markets to visit, refusing to route an empty itinerary",
        ));
    }

    let steps = waypoints(start, markets);
    let directions = router.directions(&steps).await?;
    let (leg_distance_km, leg_duration_sec) = cumulative_legs(&directions.segments, markets.len())?;

    let result = RouteResult {
        total_distance_km: round_to(directions.distance / 1000.0, 2),
        total_duration_hr: round_to(directions.duration / 3600.0, 2),
        leg_distance_km,
        leg_duration_sec,
        segments: directions.segments,
        geometry: directions.geometry,
    };

    info!(
        markets = markets.len(),
        total_distance_km = result.total_distance_km,
        total_duration_hr = result.total_duration_hr,
        "route generated"
    );

    Ok(result)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
