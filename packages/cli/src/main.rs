#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line host for the crime grid map.
//!
//! With a subcommand it answers one question (which cities exist, which
//! filters a city offers, which gangs it maps) or renders one map state as
//! a MapLibre style document. Without one it opens an interactive session
//! where every menu choice is forwarded to the map as a UI event.

mod interactive;
mod setup;

use clap::{Parser, Subcommand};
use crime_grid_crime_models::DisplayMode;
use crime_grid_map::UiEvent;
use crime_grid_source::IncidentSource;
use crime_grid_source::registry::{all_cities, selected_city};
use crime_grid_source::socrata::discover_options;

#[derive(Parser)]
#[command(name = "crime_grid_cli", about = "Crime heatmap and gang territory viewer")]
struct Cli {
    /// City id (overrides the `CRIME_GRID_CITY` env var; default "chicago")
    #[arg(long, global = true)]
    city: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configured cities
    Cities,
    /// Show the years and crime types that can be selected
    Options,
    /// List the gang territories available for highlighting
    Gangs,
    /// Render one map state and print it as a style document
    Render {
        /// Year to show (defaults to the city's preferred year)
        #[arg(long)]
        year: Option<i32>,
        /// Crime type to show (defaults to the city's preferred type)
        #[arg(long)]
        crime_type: Option<String>,
        /// Incident display: heatmap, pins, or none
        #[arg(long, default_value = "heatmap")]
        mode: DisplayMode,
        /// Gang territory to highlight
        #[arg(long)]
        gang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Cities)) {
        println!("{:<14} {:<20} GANG BOUNDARIES", "ID", "NAME");
        println!("{}", "-".repeat(50));
        for city in &all_cities() {
            println!(
                "{:<14} {:<20} {}",
                city.id(),
                city.name(),
                if city.gang_boundaries.is_some() { "yes" } else { "no" }
            );
        }
        return Ok(());
    }

    let city = selected_city(cli.city)?;
    log::info!("Using city {}", city.name());

    let Some(command) = cli.command else {
        return interactive::run(&city).await;
    };

    match command {
        Commands::Cities => {} // handled above
        Commands::Options => {
            let source = city.incident_source(setup::http_client()?);
            let options = discover_options(&source.fetch_sample().await?);
            println!("Years: {}", join(&options.years));
            println!("Crime types:");
            for crime_type in &options.crime_types {
                println!("  {crime_type}");
            }
        }
        Commands::Gangs => {
            let cache = setup::gang_cache(&city, setup::http_client()?);
            match cache.get().await {
                Ok(dataset) => {
                    for name in dataset.names() {
                        println!("{name}");
                    }
                }
                Err(e) => println!("No gang territories for {}: {e}", city.name()),
            }
        }
        Commands::Render {
            year,
            crime_type,
            mode,
            gang,
        } => {
            let mut session = setup::build_session(&city, mode)?;
            session.initialize().await?;

            if let Some(year) = year {
                session.handle(UiEvent::YearSelected(year)).await?;
            }
            if let Some(crime_type) = crime_type {
                session.handle(UiEvent::CrimeTypeSelected(crime_type)).await?;
            }
            if gang.is_some() {
                session.handle(UiEvent::GangSelected(gang)).await?;
            }

            if let Some(summary) = session.summary() {
                log::info!(
                    "{} {} incidents in {}",
                    summary.count,
                    summary.crime_type,
                    summary.year
                );
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&session.surface().to_style())?
            );
        }
    }

    Ok(())
}

fn join(values: &[i32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_parses_display_mode() {
        let cli = Cli::try_parse_from(["crime_grid_cli", "render", "--mode", "pins"]).unwrap();

        assert!(matches!(
            cli.command,
            Some(Commands::Render {
                mode: DisplayMode::Pins,
                ..
            })
        ));
    }

    #[test]
    fn render_rejects_unknown_display_mode() {
        assert!(Cli::try_parse_from(["crime_grid_cli", "render", "--mode", "dots"]).is_err());
    }

    #[test]
    fn city_flag_is_global() {
        let cli = Cli::try_parse_from(["crime_grid_cli", "gangs", "--city", "new_york"]).unwrap();

        assert_eq!(cli.city.as_deref(), Some("new_york"));
        assert!(matches!(cli.command, Some(Commands::Gangs)));
    }
}
