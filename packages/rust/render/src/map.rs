//! Leaflet map fragment: route overlay plus start and step markers.

use serde::Serialize;
use tera::{Context, Tera};

use flearoute_shared::{Coordinates, FleaRouteError, GeocodedFleaMarket, Result, RouteResult};

/// Embedded map fragment template.
const MAP_TEMPLATE: &str = include_str!("map.html");

/// DOM id of the map container.
const MAP_ID: &str = "flearoute-map";

/// Overlay name shown in the layer control.
const ROUTE_LAYER_NAME: &str = "Itinéraire";

/// A marker drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MapMarker {
    /// A text label, `html` is pre-escaped markup.
    Label { lat: f64, lon: f64, html: String },
    /// An icon pin with an HTML-escaped popup.
    Pin {
        lat: f64,
        lon: f64,
        color: String,
        icon: String,
        popup: String,
    },
}

impl MapMarker {
    fn label(at: Coordinates, text: &str, extra_class: Option<&str>) -> Self {
        let class = match extra_class {
            Some(extra) => format!("flearoute-label {extra}"),
            None => "flearoute-label".to_string(),
        };
        Self::Label {
            lat: at.latitude,
            lon: at.longitude,
            html: format!(r#"<div class="{class}">{}</div>"#, tera::escape_html(text)),
        }
    }

    fn pin(at: Coordinates, color: &str, icon: &str, popup: &str) -> Self {
        Self::Pin {
            lat: at.latitude,
            lon: at.longitude,
            color: color.into(),
            icon: icon.into(),
            popup: tera::escape_html(popup),
        }
    }
}

/// Everything needed to draw the route map.
#[derive(Debug, Clone, Serialize)]
pub struct RouteMap {
    /// `[lat, lon]`, Leaflet order.
    pub center: [f64; 2],
    pub zoom: u8,
    pub route_name: String,
    pub geometry: serde_json::Value,
    pub markers: Vec<MapMarker>,
}

impl RouteMap {
    /// Render the map as an HTML fragment (styles, container, scripts).
    pub fn to_html(&self) -> Result<String> {
        let map_json = serde_json::to_string(self)
            .map_err(|e| FleaRouteError::Render(format!("map data: {e}")))?
            // keep the payload from closing the surrounding <script>
            .replace("</", "<\\/");

        let mut context = Context::new();
        context.insert("map_id", MAP_ID);
        context.insert("map_json", &map_json);

        Tera::one_off(MAP_TEMPLATE, &context, false)
            .map_err(|e| FleaRouteError::Render(format!("map template: {e}")))
    }
}

/// Build the map: start label and flag, then a label and pin per market in
/// route order.
pub fn build_route_map(
    start_town: &str,
    start: Coordinates,
    markets: &[GeocodedFleaMarket],
    route: &RouteResult,
    zoom: u8,
) -> RouteMap {
    let mut markers = Vec::with_capacity(2 + markets.len() * 2);

    markers.push(MapMarker::label(
        start,
        &format!("Départ – {start_town}"),
        Some("flearoute-start"),
    ));
    markers.push(MapMarker::pin(
        start,
        "green",
        "flag-checkered",
        &format!("{start_town} – {} km", route.total_distance_km),
    ));

    for (i, market) in markets.iter().enumerate() {
        let town = market.town();
        let distance = route.leg_distance_km.get(i).copied().unwrap_or_default();

        markers.push(MapMarker::label(
            market.coordinates,
            &format!("Étape {} – {town}", i + 1),
            None,
        ));
        markers.push(MapMarker::pin(
            market.coordinates,
            "blue",
            "map-marker",
            &format!("{town} – {distance} km"),
        ));
    }

    RouteMap {
        center: [start.latitude, start.longitude],
        zoom,
        route_name: ROUTE_LAYER_NAME.to_string(),
        geometry: route.geometry.clone(),
        markers,
    }
}
