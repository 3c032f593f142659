//! flearoute CLI: plan a driving loop through nearby flea markets.
//!
//! Scrapes the day's flea-market listing, keeps the markets within a radius
//! of the start town, routes a closed loop through them and writes an HTML
//! map with the itinerary.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the key may already be in the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
