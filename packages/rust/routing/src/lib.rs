//! Multi-stop driving directions.
//!
//! This crate provides:
//! - [`RouteProvider`] — ordered waypoints to route geometry, legs and instructions
//! - [`OpenRouteServiceClient`] — the openrouteservice implementation
//! - [`plan`] — waypoint ordering and per-leg accumulation into a [`RouteResult`]
//!
//! [`RouteResult`]: flearoute_shared::RouteResult

mod openrouteservice;
pub mod plan;

use std::future::Future;

use flearoute_shared::{Coordinates, Result, RouteSegment};

pub use openrouteservice::OpenRouteServiceClient;
pub use plan::{cumulative_legs, plan_route, waypoints};

/// Raw directions for a waypoint sequence, before leg accumulation.
#[derive(Debug, Clone)]
pub struct Directions {
    /// Meters, whole route.
    pub distance: f64,
    /// Seconds, whole route.
    pub duration: f64,
    /// One segment per pair of consecutive waypoints.
    pub segments: Vec<RouteSegment>,
    /// GeoJSON geometry of the whole route.
    pub geometry: serde_json::Value,
}

/// Computes a driving route visiting `waypoints` in order.
pub trait RouteProvider: Send + Sync {
    fn directions(&self, waypoints: &[Coordinates]) -> impl Future<Output = Result<Directions>> + Send;
}
