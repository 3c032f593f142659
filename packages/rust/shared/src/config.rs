//! Application configuration for flearoute.
//!
//! User config lives at `~/.flearoute/flearoute.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FleaRouteError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "flearoute.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".flearoute";

/// Accepted start town names: letters, whitespace and hyphens.
static TOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\s-]+$").expect("town regex"));

// ---------------------------------------------------------------------------
// Config structs (matching flearoute.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listing site settings.
    #[serde(default)]
    pub listing: ListingConfig,

    /// Geocoding service settings.
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Routing service settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Output artifact settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[listing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Index page of the flea-market site. Detail links must share this origin.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Words that mark a list item fragment as a location phrase.
    #[serde(default = "default_location_keywords")]
    pub location_keywords: Vec<String>,

    /// HTTP timeout for listing and detail pages.
    #[serde(default = "default_listing_timeout")]
    pub timeout_secs: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            location_keywords: default_location_keywords(),
            timeout_secs: default_listing_timeout(),
        }
    }
}

fn default_site_url() -> String {
    "http://www.sabradou.com".into()
}
fn default_location_keywords() -> Vec<String> {
    [
        "centre",
        "rue",
        "quartier",
        "place",
        "digue",
        "plage",
        "parking",
        "route",
        "pature",
        "salle",
        "avenue",
        "hameau",
        "boulevard",
        "chemin",
        "stade",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_listing_timeout() -> u64 {
    30
}

/// `[geocoding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible search API.
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// User-Agent sent with every lookup (Nominatim requires one).
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,

    /// Country appended to every free-text query.
    #[serde(default = "default_country")]
    pub country: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            user_agent: default_geocoding_user_agent(),
            country: default_country(),
            timeout_secs: default_geocoding_timeout(),
        }
    }
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}
fn default_geocoding_user_agent() -> String {
    concat!("flearoute/", env!("CARGO_PKG_VERSION")).into()
}
fn default_country() -> String {
    "France".into()
}
fn default_geocoding_timeout() -> u64 {
    5
}

/// `[routing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of an openrouteservice-compatible API.
    #[serde(default = "default_routing_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Routing profile.
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Language of the turn-by-turn instructions.
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_url(),
            api_key_env: default_api_key_env(),
            profile: default_profile(),
            language: default_language(),
            timeout_secs: default_routing_timeout(),
        }
    }
}

fn default_routing_url() -> String {
    "https://api.openrouteservice.org".into()
}
fn default_api_key_env() -> String {
    "API_KEY".into()
}
fn default_profile() -> String {
    "driving-car".into()
}
fn default_language() -> String {
    "fr".into()
}
fn default_routing_timeout() -> u64 {
    30
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the rendered page is written (overwritten on every run).
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Directory holding the page template.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Page template file name inside `template_dir`.
    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Initial map zoom level.
    #[serde(default = "default_zoom")]
    pub zoom_start: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            template_dir: default_template_dir(),
            template_name: default_template_name(),
            zoom_start: default_zoom(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("route.html")
}
fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}
fn default_template_name() -> String {
    "template.html".into()
}
fn default_zoom() -> u8 {
    12
}

// ---------------------------------------------------------------------------
// Search parameters (runtime, from CLI arguments)
// ---------------------------------------------------------------------------

/// Validated user request: where to start and how far to look.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Start (and end) town of the trip.
    pub start_town: String,
    /// Search radius around the start town, in kilometers.
    pub radius_km: u32,
}

impl SearchParams {
    /// Validate raw CLI input.
    ///
    /// The town must consist of letters, spaces and hyphens; the radius must be
    /// strictly positive.
    pub fn new(start_town: &str, radius_km: i64) -> Result<Self> {
        let start_town = start_town.trim();
        if start_town.is_empty() || !TOWN_RE.is_match(start_town) {
            return Err(FleaRouteError::validation(format!(
                "invalid town name '{start_town}': only letters, spaces and hyphens are allowed"
            )));
        }

        if radius_km <= 0 {
            return Err(FleaRouteError::validation(
                "the radius must be a positive integer",
            ));
        }
        let radius_km = u32::try_from(radius_km).map_err(|_| {
            FleaRouteError::validation(format!("radius {radius_km} km is too large"))
        })?;

        Ok(Self {
            start_town: start_town.to_string(),
            radius_km,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.flearoute/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FleaRouteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.flearoute/flearoute.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FleaRouteError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        FleaRouteError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Read the routing API key from the process environment.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    resolve_api_key_with(config, |key| std::env::var(key))
}

/// Read the routing API key through the given env lookup.
///
/// Split out so tests can supply a map instead of touching the real environment.
pub fn resolve_api_key_with<F>(config: &AppConfig, lookup: F) -> Result<String>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let var_name = &config.routing.api_key_env;
    match lookup(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(FleaRouteError::config(format!(
            "routing API key not found. Set the {var_name} environment variable \
             (a local .env file works too).\n\
             Get a key at https://openrouteservice.org/dev/#/signup"
        ))),
    }
}
