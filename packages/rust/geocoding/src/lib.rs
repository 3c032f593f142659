//! Geocoding and distance filtering.
//!
//! This crate provides:
//! - [`Geocoder`] — free-text place query to optional coordinates
//! - [`NominatimGeocoder`] — the OpenStreetMap Nominatim implementation
//! - [`filter`] — start-town resolution and the radius filter
//! - [`haversine_km`] — great-circle distance

mod distance;
pub mod filter;
mod nominatim;

use std::future::Future;

use flearoute_shared::{Coordinates, Result};

pub use distance::haversine_km;
pub use filter::{geocode_and_filter, locate_market, resolve_start, within_radius};
pub use nominatim::NominatimGeocoder;

/// Resolves a free-text place query to a point.
///
/// `Ok(None)` means the service answered but knows no such place; `Err` means
/// the lookup itself failed.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &str) -> impl Future<Output = Result<Option<Coordinates>>> + Send;
}
