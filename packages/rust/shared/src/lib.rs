//! Shared types, error model, and configuration for flearoute.
//!
//! This crate is the foundation depended on by all other flearoute crates.
//! It provides:
//! - [`FleaRouteError`] — the unified error type
//! - Domain types ([`FleaMarketListing`], [`FleaMarketLocation`], [`GeocodedFleaMarket`], [`RouteResult`])
//! - Configuration ([`AppConfig`], [`SearchParams`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GeocodingConfig, ListingConfig, OutputConfig, RoutingConfig, SearchParams,
    config_dir, config_file_path, load_config, load_config_from, resolve_api_key,
    resolve_api_key_with,
};
pub use error::{FleaRouteError, Result};
pub use types::{
    Coordinates, FleaMarketListing, FleaMarketLocation, GeocodedFleaMarket, InstructionStep,
    ListingPage, RouteResult, RouteSegment,
};
