mod app;
mod headless;
mod render;
mod settings;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eframe::egui;
use log::{info, warn};
use par_core::sim::DEFAULT_STEP_INTERVAL;
use par_core::{RunwayDatabase, SnapshotStore, TelemetryListener, TrafficGenerator};

use app::ParApp;
use settings::Settings;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Redraw tick shared by the window and headless mode.
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "par-display", version)]
#[command(about = "Precision approach radar style display for live approach traffic")]
struct Cli {
    /// Telemetry listen address (host:port)
    #[arg(long)]
    listen: Option<String>,

    /// Airport identifier to load from reference data
    #[arg(long, requires = "runway")]
    airport: Option<String>,

    /// Runway end at --airport (e.g. 28L)
    #[arg(long, requires = "airport")]
    runway: Option<String>,

    /// Directory containing runways.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Feed synthetic approach traffic
    #[arg(long)]
    simulate: bool,

    /// Run without a window and log frame counts
    #[arg(long)]
    headless: bool,

    /// Trail dots per target
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=20))]
    history_dots: Option<u8>,

    /// Draw ground traffic
    #[arg(long)]
    show_ground: bool,
}

impl Cli {
    /// Overlay command-line flags on the stored settings.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(listen) = &self.listen {
            settings.listen_address.clone_from(listen);
        }
        if let Some(data_dir) = &self.data_dir {
            settings.data_dir = Some(data_dir.clone());
        }
        if let Some(dots) = self.history_dots {
            settings.history_dots = usize::from(dots);
        }
        settings.simulate |= self.simulate;
        settings.show_ground |= self.show_ground;
    }
}

fn load_reference_data(settings: &Settings) -> RunwayDatabase {
    let Some(dir) = settings.reference_data_dir() else {
        warn!("No data directory available, runway lookup disabled");
        return RunwayDatabase::new();
    };

    match RunwayDatabase::load_directory(&dir) {
        Ok(db) => db,
        Err(e) => {
            warn!("No runway data loaded from {}: {e}", dir.display());
            RunwayDatabase::new()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load settings, using defaults: {e}");
        Settings::default()
    });
    cli.apply_to(&mut settings);
    if let Ok(path) = Settings::config_path() {
        info!("Settings file: {}", path.display());
    }

    let runways = load_reference_data(&settings);
    if let (Some(airport), Some(runway)) = (&cli.airport, &cli.runway) {
        match runways.configuration_for(airport, runway) {
            Some(config) => {
                info!("Using runway {}", config.label());
                settings.runway = Some(config);
            }
            None => warn!("Runway {airport} {runway} not found, keeping previous configuration"),
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let store = SnapshotStore::default();

    let _listener = runtime.block_on(TelemetryListener::bind(&settings.listen_address, store.clone()))?;

    let simulation = if settings.simulate {
        let _guard = runtime.enter();
        let config = settings.runway.clone().unwrap_or_default();
        Some(TrafficGenerator::new(config, settings.simulated_targets).spawn(store.clone(), DEFAULT_STEP_INTERVAL))
    } else {
        None
    };

    if cli.headless {
        let display = settings.display_settings();
        runtime.block_on(headless::run(store, settings.runway.clone(), display, &runways));
        drop(simulation);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("PAR Display"),
        ..Default::default()
    };

    eframe::run_native(
        "PAR Display",
        options,
        Box::new(move |_cc| Ok(Box::new(ParApp::new(store, runways, simulation, settings)))),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "par-display",
            "--listen",
            "0.0.0.0:4000",
            "--history-dots",
            "12",
            "--simulate",
        ]);
        let mut settings = Settings::default();
        cli.apply_to(&mut settings);

        assert_eq!(settings.listen_address, "0.0.0.0:4000");
        assert_eq!(settings.history_dots, 12);
        assert!(settings.simulate);
        assert!(!settings.show_ground);
    }

    #[test]
    fn test_cli_rejects_out_of_range_dots() {
        assert!(Cli::try_parse_from(["par-display", "--history-dots", "0"]).is_err());
        assert!(Cli::try_parse_from(["par-display", "--history-dots", "21"]).is_err());
    }

    #[test]
    fn test_cli_airport_requires_runway() {
        assert!(Cli::try_parse_from(["par-display", "--airport", "KSFO"]).is_err());
        assert!(Cli::try_parse_from(["par-display", "--airport", "KSFO", "--runway", "28L"]).is_ok());
    }
}
