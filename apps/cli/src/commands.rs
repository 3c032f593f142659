//! CLI definition, tracing setup, and the trip command.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use flearoute_core::pipeline::{ProgressReporter, TripConfig, TripResult, plan_trip};
use flearoute_shared::{AppConfig, SearchParams, load_config, load_config_from, resolve_api_key};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// flearoute: a driving loop through today's flea markets.
#[derive(Parser, Debug)]
#[command(
    name = "flearoute",
    version,
    about = "Plan a driving loop through the flea markets around a town and render it as an HTML map.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Town to start from and return to (letters, spaces and hyphens).
    pub start_town: String,

    /// Search radius in kilometres around the start town.
    #[arg(allow_negative_numbers = true)]
    pub radius_km: i64,

    /// Config file (defaults to ~/.flearoute/flearoute.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the HTML page.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory holding the page template.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "flearoute=info",
        1 => "flearoute=debug",
        _ => "flearoute=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Trip command
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let search = SearchParams::new(&cli.start_town, cli.radius_km)?;

    let mut app = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_overrides(&mut app, &cli);

    let api_key = resolve_api_key(&app)?;

    info!(
        start = %search.start_town,
        radius_km = search.radius_km,
        output = %app.output.path.display(),
        "planning flea-market trip"
    );

    let config = TripConfig { search, app };
    let reporter = CliProgress::new();

    let result = plan_trip(&config, &api_key, &reporter).await?;

    println!();
    println!("  Route generated!");
    println!("  Date:      {}", result.date);
    println!("  Markets:   {}", result.market_count);
    println!("  Distance:  {} km", result.total_distance_km);
    println!("  Duration:  {} h", result.total_duration_hr);
    println!("  Map:       {}", result.output_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(app: &mut AppConfig, cli: &Cli) {
    if let Some(output) = &cli.output {
        app.output.path = output.clone();
    }
    if let Some(dir) = &cli.template_dir {
        app.output.template_dir = dir.clone();
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail_fetched(&self, town: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {town}"));
    }

    fn done(&self, _result: &TripResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    // Clear the spinner on early error returns too.
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "flearoute",
            "Saint-Omer",
            "25",
            "--output",
            "out/map.html",
            "--template-dir",
            "tpl",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.start_town, "Saint-Omer");
        assert_eq!(cli.radius_km, 25);
        assert_eq!(cli.verbose, 2);

        let mut app = AppConfig::default();
        apply_overrides(&mut app, &cli);
        assert_eq!(app.output.path, PathBuf::from("out/map.html"));
        assert_eq!(app.output.template_dir, PathBuf::from("tpl"));
        assert_eq!(app.output.template_name, "template.html");
    }

    #[test]
    fn negative_radius_reaches_validation() {
        let cli = Cli::try_parse_from(["flearoute", "Lille", "-5"]).unwrap();
        assert_eq!(cli.radius_km, -5);
        assert!(SearchParams::new(&cli.start_town, cli.radius_km).is_err());
    }

    #[test]
    fn non_numeric_radius_is_rejected() {
        assert!(Cli::try_parse_from(["flearoute", "Lille", "ten"]).is_err());
    }

    #[test]
    fn missing_radius_is_rejected() {
        assert!(Cli::try_parse_from(["flearoute", "Lille"]).is_err());
    }
}
