//! End-to-end trip pipeline: listing → detail pages → geocode/filter → route → HTML.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use flearoute_geocoding::{Geocoder, NominatimGeocoder, geocode_and_filter};
use flearoute_listing::ListingClient;
use flearoute_render::{PageInput, render_to_file};
use flearoute_routing::{OpenRouteServiceClient, RouteProvider, plan_route};
use flearoute_shared::{AppConfig, FleaRouteError, Result, SearchParams};

/// Configuration for one trip computation.
#[derive(Debug, Clone)]
pub struct TripConfig {
    /// Validated start town and radius.
    pub search: SearchParams,
    /// Service endpoints, vocabulary and output settings.
    pub app: AppConfig,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct TripResult {
    /// Where the page was written.
    pub output_path: PathBuf,
    /// Listing date as printed by the site.
    pub date: String,
    /// Number of markets on the route.
    pub market_count: usize,
    pub total_distance_km: f64,
    pub total_duration_hr: f64,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each detail page request.
    fn detail_fetched(&self, town: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &TripResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail_fetched(&self, _town: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &TripResult) {}
}

/// Build the real HTTP collaborators from config and run the pipeline.
pub async fn plan_trip(
    config: &TripConfig,
    api_key: &str,
    progress: &dyn ProgressReporter,
) -> Result<TripResult> {
    let listing = ListingClient::new(&config.app.listing)?;
    let geocoder = NominatimGeocoder::new(&config.app.geocoding)?;
    let router = OpenRouteServiceClient::new(&config.app.routing, api_key)?;

    run_trip(config, &listing, &geocoder, &router, progress).await
}

/// Run the full pipeline with the given collaborators.
///
/// 1. Load the listing page (fatal on failure)
/// 2. Read detail pages for location phrases (failures skipped)
/// 3. Geocode the start town (fatal) and every market, keep those within radius
/// 4. Route the closed loop (fatal on failure)
/// 5. Render and write the page
#[instrument(skip_all, fields(start = %config.search.start_town, radius_km = config.search.radius_km))]
pub async fn run_trip<G: Geocoder, R: RouteProvider>(
    config: &TripConfig,
    listing: &ListingClient,
    geocoder: &G,
    router: &R,
    progress: &dyn ProgressReporter,
) -> Result<TripResult> {
    let start_time = Instant::now();
    let search = &config.search;

    info!("starting trip pipeline");

    // --- Phase 1: Listing ---
    progress.phase("Loading flea-market listing");
    let page = listing.fetch_listing_page().await?;

    // --- Phase 2: Detail pages ---
    progress.phase("Reading detail pages");
    let locations = listing
        .collect_locations(&page.listings, |current, total, town| {
            progress.detail_fetched(town, current, total)
        })
        .await;

    info!(date = %page.date, towns = locations.len(), "flea market locations collected");

    // --- Phase 3: Geocode + filter ---
    progress.phase("Geocoding flea markets");
    let (start, markets) = geocode_and_filter(
        geocoder,
        &search.start_town,
        &locations,
        f64::from(search.radius_km),
        &config.app.geocoding.country,
    )
    .await?;

    if markets.is_empty() {
        return Err(FleaRouteError::validation(format!(
            "no flea markets found within {} km of {}",
            search.radius_km, search.start_town
        )));
    }

    // --- Phase 4: Route ---
    progress.phase("Computing route");
    let route = plan_route(router, start, &markets).await?;

    // --- Phase 5: Render ---
    progress.phase("Rendering map");
    let input = PageInput {
        start_town: &search.start_town,
        start,
        date: &page.date,
        markets: &markets,
        route: &route,
    };
    let output_path = render_to_file(&input, &config.app.output)?;

    let result = TripResult {
        output_path,
        date: page.date,
        market_count: markets.len(),
        total_distance_km: route.total_distance_km,
        total_duration_hr: route.total_duration_hr,
        elapsed: start_time.elapsed(),
    };

    progress.done(&result);

    info!(
        path = %result.output_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "trip pipeline complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use flearoute_shared::{GeocodingConfig, ListingConfig, OutputConfig, RoutingConfig};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const MARKET_ITEM: &str = "Rue de la République, stands 9h-18h";

    fn scratch_output(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flearoute-e2e-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("route.html")
    }

    fn trip_config(server: &MockServer, town: &str, radius_km: i64, output: PathBuf) -> TripConfig {
        TripConfig {
            search: SearchParams::new(town, radius_km).unwrap(),
            app: AppConfig {
                listing: ListingConfig {
                    site_url: format!("{}/", server.uri()),
                    ..ListingConfig::default()
                },
                geocoding: GeocodingConfig {
                    base_url: server.uri(),
                    ..GeocodingConfig::default()
                },
                routing: RoutingConfig {
                    base_url: server.uri(),
                    ..RoutingConfig::default()
                },
                output: OutputConfig {
                    path: output,
                    template_dir: PathBuf::from("../../../templates"),
                    ..OutputConfig::default()
                },
            },
        }
    }

    async fn mount_listing(server: &MockServer, town: &str) {
        let index = format!(
            r#"<html><body>
                <h2 id="datejour">Dimanche 12 octobre</h2>
                <div class="deptardt"><ul>
                    <li><a href="{uri}/brocante/{slug}.html" title="Brocante">{town}</a></li>
                    <li><a href="http://phishing.test/{slug}.html" title="Brocante">Villeurbanne</a></li>
                </ul></div>
            </body></html>"#,
            uri = server.uri(),
            slug = town.to_lowercase(),
        );
        let detail = format!(
            r#"<html><body><div class="fiche">
                <ul class="ville-colonne"><li>Organisateur : mairie</li></ul>
                <ul class="ville-colonne">
                    <li>Exposants : 150</li>
                    <li>{MARKET_ITEM}</li>
                </ul>
            </div></body></html>"#
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/brocante/{}.html", town.to_lowercase())))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail))
            .mount(server)
            .await;
    }

    async fn mount_place(server: &MockServer, query: &str, lon: &str, lat: &str) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "lat": lat, "lon": lon, "display_name": query }
            ])))
            .mount(server)
            .await;
    }

    fn loop_route() -> serde_json::Value {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[4.8357, 45.764], [4.836, 45.7636], [4.8357, 45.764]]
                },
                "properties": {
                    "summary": { "distance": 1240.0, "duration": 190.0 },
                    "segments": [
                        {
                            "distance": 610.0,
                            "duration": 95.0,
                            "steps": [{ "distance": 610.0, "duration": 95.0, "instruction": "Prenez Rue de la République" }]
                        },
                        {
                            "distance": 630.0,
                            "duration": 95.0,
                            "steps": [{ "distance": 630.0, "duration": 95.0, "instruction": "Arrivée à Lyon" }]
                        }
                    ]
                }
            }]
        })
    }

    #[tokio::test]
    async fn lyon_round_trip_writes_page() {
        let server = MockServer::start().await;
        mount_listing(&server, "Lyon").await;
        mount_place(&server, "Lyon, France", "4.8357", "45.7640").await;
        mount_place(&server, &format!("{MARKET_ITEM}, Lyon, France"), "4.8360", "45.7636").await;

        Mock::given(method("POST"))
            .and(path("/v2/directions/driving-car/geojson"))
            .and(body_json(serde_json::json!({
                "coordinates": [[4.8357, 45.764], [4.836, 45.7636], [4.8357, 45.764]],
                "instructions": true,
                "language": "fr"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(loop_route()))
            .expect(1)
            .mount(&server)
            .await;

        let output = scratch_output("lyon");
        let config = trip_config(&server, "Lyon", 50, output.clone());

        let result = plan_trip(&config, "test-key", &SilentProgress).await.unwrap();

        assert_eq!(result.market_count, 1);
        assert_eq!(result.date, "Dimanche 12 octobre");
        assert_eq!(result.total_distance_km, 1.24);
        assert_eq!(result.output_path, output);

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("Étape 1 – Lyon"));
        assert!(html.contains("Départ – Lyon"));
        assert!(html.contains("• Prenez Rue de la République – 0.61 km<br>"));
        assert!(!html.contains("Villeurbanne"));

        let _ = std::fs::remove_dir_all(output.parent().unwrap());
    }

    #[tokio::test]
    async fn listing_404_aborts_without_output() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let output = scratch_output("404");
        let config = trip_config(&server, "Lyon", 50, output.clone());

        let err = plan_trip(&config, "test-key", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, FleaRouteError::Network(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn nothing_within_radius_skips_routing() {
        let server = MockServer::start().await;
        mount_listing(&server, "Vienne").await;
        mount_place(&server, "Lyon, France", "4.8357", "45.7640").await;
        // ~26 km south of Lyon
        mount_place(&server, &format!("{MARKET_ITEM}, Vienne, France"), "4.8740", "45.5250").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(loop_route()))
            .expect(0)
            .mount(&server)
            .await;

        let output = scratch_output("radius");
        let config = trip_config(&server, "Lyon", 1, output.clone());

        let err = plan_trip(&config, "test-key", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, FleaRouteError::Validation { .. }));
        assert!(err.to_string().contains("within 1 km of Lyon"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn unknown_start_town_is_fatal() {
        let server = MockServer::start().await;
        mount_listing(&server, "Lyon").await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let output = scratch_output("start");
        let config = trip_config(&server, "Nulle Part", 50, output.clone());

        let err = plan_trip(&config, "test-key", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, FleaRouteError::Geocoding(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn routing_failure_is_fatal() {
        let server = MockServer::start().await;
        mount_listing(&server, "Lyon").await;
        mount_place(&server, "Lyon, France", "4.8357", "45.7640").await;
        mount_place(&server, &format!("{MARKET_ITEM}, Lyon, France"), "4.8360", "45.7636").await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 2004, "message": "Request parameters exceed the server configuration limits." }
            })))
            .mount(&server)
            .await;

        let output = scratch_output("routing");
        let config = trip_config(&server, "Lyon", 50, output.clone());

        let err = plan_trip(&config, "test-key", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, FleaRouteError::Routing(_)));
        assert!(!output.exists());
    }
}
