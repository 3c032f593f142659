//! HTML rendering of the computed route.
//!
//! The page is produced in two passes: an embedded template draws the Leaflet
//! map fragment, then the user-editable page template (`templates/template.html`
//! by default) wraps it together with the itinerary panel.

pub mod itinerary;
pub mod map;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{info, instrument};

use flearoute_shared::{Coordinates, FleaRouteError, GeocodedFleaMarket, OutputConfig, Result, RouteResult};

pub use itinerary::{format_duration, instructions_html};
pub use map::{MapMarker, RouteMap, build_route_map};

/// Data for one rendered page.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    pub start_town: &'a str,
    pub start: Coordinates,
    /// Display date scraped from the listing page.
    pub date: &'a str,
    /// Markets in route order.
    pub markets: &'a [GeocodedFleaMarket],
    pub route: &'a RouteResult,
}

/// One row of the itinerary panel.
#[derive(Debug, Serialize)]
struct Stop<'a> {
    number: usize,
    town: &'a str,
    location_phrase: &'a str,
    distance_km: f64,
    duration: String,
}

/// Variables available to the page template.
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    html_map: String,
    html_instructions: String,
    start_town: &'a str,
    date: &'a str,
    flea_markets: &'a [GeocodedFleaMarket],
    nb_flea_markets: usize,
    stops: Vec<Stop<'a>>,
    distance_step: &'a [f64],
    formatted_durations: Vec<String>,
    total_distance_km: f64,
    total_time_hr: f64,
    generated_at: String,
}

/// Render the full page through `<template_dir>/<template_name>`.
#[instrument(skip_all, fields(template = %output.template_name, markets = input.markets.len()))]
pub fn render_page(input: &PageInput<'_>, output: &OutputConfig) -> Result<String> {
    let template_path = output.template_dir.join(&output.template_name);
    let source = std::fs::read_to_string(&template_path)
        .map_err(|e| FleaRouteError::io(&template_path, e))?;

    let mut tera = Tera::default();
    tera.add_raw_template(&output.template_name, &source)
        .map_err(|e| FleaRouteError::Render(format!("{}: {e}", template_path.display())))?;

    let html_map = build_route_map(
        input.start_town,
        input.start,
        input.markets,
        input.route,
        output.zoom_start,
    )
    .to_html()?;

    let formatted_durations: Vec<String> = input
        .route
        .leg_duration_sec
        .iter()
        .map(|&secs| format_duration(secs))
        .collect();

    let stops = input
        .markets
        .iter()
        .enumerate()
        .map(|(i, market)| Stop {
            number: i + 1,
            town: market.town(),
            location_phrase: &market.location.location_phrase,
            distance_km: input.route.leg_distance_km.get(i).copied().unwrap_or_default(),
            duration: formatted_durations.get(i).cloned().unwrap_or_default(),
        })
        .collect();

    let page = PageContext {
        html_map,
        html_instructions: instructions_html(&input.route.segments),
        start_town: input.start_town,
        date: input.date,
        flea_markets: input.markets,
        nb_flea_markets: input.markets.len(),
        stops,
        distance_step: &input.route.leg_distance_km,
        formatted_durations,
        total_distance_km: input.route.total_distance_km,
        total_time_hr: input.route.total_duration_hr,
        generated_at: chrono::Local::now().format("%d/%m/%Y %H:%M").to_string(),
    };

    let context = Context::from_serialize(&page)
        .map_err(|e| FleaRouteError::Render(format!("template context: {e}")))?;

    tera.render(&output.template_name, &context)
        .map_err(|e| FleaRouteError::Render(format!("{}: {e}", template_path.display())))
}

/// Write rendered HTML, replacing any previous file.
pub fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FleaRouteError::io(parent, e))?;
    }
    std::fs::write(path, html).map_err(|e| FleaRouteError::io(path, e))
}

/// Render the page and write it to `output.path`.
pub fn render_to_file(input: &PageInput<'_>, output: &OutputConfig) -> Result<PathBuf> {
    let html = render_page(input, output)?;
    write_page(&output.path, &html)?;

    info!(path = %output.path.display(), bytes = html.len(), "map saved");

    Ok(output.path.clone())
}
