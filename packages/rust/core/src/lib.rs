//! Trip orchestration for flearoute.
//!
//! Ties the listing scraper, geocoder, router and renderer together into a
//! single run (`plan_trip`).

pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, TripConfig, TripResult, plan_trip, run_trip};
