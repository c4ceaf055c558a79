//! Interactive map session.
//!
//! Stands in for the browser UI: each `dialoguer` prompt is one of the
//! page's selectors, and every choice is forwarded to the session as a
//! [`UiEvent`]. After each event the counts and zoom readouts are printed.

use crime_grid_crime_models::DisplayMode;
use crime_grid_map::{InMemorySurface, MapSession, UiEvent};
use crime_grid_source::city_def::CityDefinition;
use dialoguer::{Input, Select};

use crate::setup;

/// Menu entries, one per selector on the map page.
enum Action {
    Year,
    CrimeType,
    DisplayMode,
    Gang,
    ClearGang,
    ToggleDisplay,
    Zoom,
    ExportStyle,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Year,
        Self::CrimeType,
        Self::DisplayMode,
        Self::Gang,
        Self::ClearGang,
        Self::ToggleDisplay,
        Self::Zoom,
        Self::ExportStyle,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Year => "Select year",
            Self::CrimeType => "Select crime type",
            Self::DisplayMode => "Select display mode",
            Self::Gang => "Highlight gang territory",
            Self::ClearGang => "Clear gang highlight",
            Self::ToggleDisplay => "Toggle incident layer",
            Self::Zoom => "Set zoom",
            Self::ExportStyle => "Print style document",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive session for `city` until the user quits.
///
/// # Errors
///
/// Returns an error if the session cannot be initialized, a prompt fails,
/// or the map rejects a layer change.
pub async fn run(city: &CityDefinition) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = setup::build_session(city, DisplayMode::default())?;
    session.initialize().await?;

    println!("{}", city.name());
    print_readouts(&session);

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let event = match Action::ALL[idx] {
            Action::Year => {
                let years = &session.options().years;
                let current = years
                    .iter()
                    .position(|y| *y == session.filter().year())
                    .unwrap_or(0);
                let labels: Vec<String> = years.iter().map(ToString::to_string).collect();
                let choice = Select::new()
                    .with_prompt("Year")
                    .items(&labels)
                    .default(current)
                    .max_length(20)
                    .interact()?;
                UiEvent::YearSelected(years[choice])
            }
            Action::CrimeType => {
                let types = &session.options().crime_types;
                let current = types
                    .iter()
                    .position(|t| t == session.filter().crime_type())
                    .unwrap_or(0);
                let choice = Select::new()
                    .with_prompt("Crime type")
                    .items(types)
                    .default(current)
                    .max_length(20)
                    .interact()?;
                UiEvent::CrimeTypeSelected(types[choice].clone())
            }
            Action::DisplayMode => {
                let modes = DisplayMode::all();
                let labels: Vec<&str> = modes.iter().map(AsRef::as_ref).collect();
                let current = modes
                    .iter()
                    .position(|m| *m == session.filter().display_mode())
                    .unwrap_or(0);
                let choice = Select::new()
                    .with_prompt("Display")
                    .items(&labels)
                    .default(current)
                    .interact()?;
                UiEvent::DisplayModeSelected(modes[choice])
            }
            Action::Gang => {
                let names = session.gang_names();
                if names.is_empty() {
                    println!("No gang territories available.");
                    continue;
                }
                let choice = Select::new()
                    .with_prompt("Gang")
                    .items(names)
                    .max_length(20)
                    .interact()?;
                UiEvent::GangSelected(Some(names[choice].clone()))
            }
            Action::ClearGang => UiEvent::GangSelected(None),
            Action::ToggleDisplay => UiEvent::ToggleDisplay,
            Action::Zoom => {
                let zoom: f64 = Input::new()
                    .with_prompt("Zoom level")
                    .default(session.surface().viewport().zoom)
                    .interact_text()?;
                UiEvent::ZoomChanged(session.surface_mut().set_zoom(zoom))
            }
            Action::ExportStyle => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&session.surface().to_style())?
                );
                continue;
            }
            Action::Quit => break,
        };

        session.handle(event).await?;
        print_readouts(&session);
    }

    Ok(())
}

fn print_readouts(session: &MapSession<InMemorySurface>) {
    match session.summary() {
        Some(summary) => println!(
            "{} {} incidents in {}",
            summary.count, summary.crime_type, summary.year
        ),
        None => println!("No incidents loaded"),
    }
    println!("Display: {}", session.filter().display_mode());
    if let Some(gang) = session.highlighter().selected() {
        println!("Highlighted: {gang}");
    }
    println!("Zoom: {}", session.layers().zoom_readout());
}
