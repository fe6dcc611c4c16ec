use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ecoride::api::AppState;
use ecoride::emissions::{TripInput, VehicleType};
use ecoride::location_matcher::{self, MatchOutcome};
use ecoride::rides::RideBoard;
use ecoride::session::{MemoryStorage, MockSessionStore, PersistentStorage, SessionStore};
use ecoride::{EcoRideConfig, telemetry, web};

#[derive(Parser)]
#[command(
    name = "ecoride",
    version,
    about = "EcoRide carpooling: carbon savings calculator, location matching and ride board"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Estimate the CO2 saved by sharing a trip
    Estimate {
        /// Trip distance in km (1-1000)
        #[arg(long)]
        distance: Option<f64>,
        /// sedan, suv, hatchback, minivan or truck
        #[arg(long)]
        vehicle: Option<String>,
        /// People in the car, driver included (1-6)
        #[arg(long)]
        passengers: Option<u32>,
    },
    /// Look an address up in the gazetteer
    Locate { query: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = EcoRideConfig::load_from_path(cli.config.clone())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    telemetry::init(&config.logging)?;

    match cli.command {
        Some(Command::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Some(Command::Estimate {
            distance,
            vehicle,
            passengers,
        }) => estimate(&config, distance, vehicle.as_deref(), passengers),
        Some(Command::Locate { query }) => {
            locate(&query);
            Ok(())
        }
        None => {
            print_overview(&config, cli.config.as_ref(), cli.verbose);
            Ok(())
        }
    }
}

async fn serve(config: EcoRideConfig) -> Result<()> {
    let session: Box<dyn SessionStore + Send> = match config.session.backend.as_str() {
        "persistent" => {
            let storage = PersistentStorage::open(&config.session.data_dir).with_context(|| {
                format!("Failed to open session storage at {}", config.session.data_dir)
            })?;
            Box::new(MockSessionStore::new(storage))
        }
        _ => Box::new(MockSessionStore::new(MemoryStorage::new())),
    };

    let state = AppState::new(
        session,
        RideBoard::with_mock_rides(),
        config.calculator.clone(),
    )
    .shared();

    web::run(&config.server, state).await
}

fn estimate(
    config: &EcoRideConfig,
    distance: Option<f64>,
    vehicle: Option<&str>,
    passengers: Option<u32>,
) -> Result<()> {
    let vehicle = match vehicle {
        Some(raw) => VehicleType::parse(raw)?,
        None => config.default_vehicle(),
    };
    let input = TripInput::clamped(
        distance.unwrap_or(config.calculator.default_distance_km),
        vehicle,
        passengers.unwrap_or(config.calculator.default_passengers),
    );
    let result = input.estimate();

    println!(
        "🚗 {} km by {} with {} people",
        input.distance_km, input.vehicle, input.passenger_count
    );
    println!("   CO₂ per person:          {}", result.format_per_person());
    println!("   CO₂ saved by carpooling: {}", result.format_saved());
    println!("   🌳 Trees to absorb it:   {}", result.format_trees());
    Ok(())
}

fn locate(query: &str) {
    match location_matcher::match_location(query, location_matcher::default_gazetteer()) {
        MatchOutcome::Exact(location) | MatchOutcome::Unique(location) => {
            println!("📍 {} ({})", location.address, location.format_coordinates());
        }
        MatchOutcome::Ambiguous(candidates) => {
            println!("Several locations match '{query}':");
            for (index, location) in candidates.iter().enumerate() {
                println!("  {}. {}", index + 1, location.address);
            }
        }
        MatchOutcome::NotFound if query.trim().is_empty() => {
            println!("{}", location_matcher::EMPTY_QUERY_MESSAGE);
        }
        MatchOutcome::NotFound => {
            println!(
                "Location not found. {}",
                location_matcher::NOT_FOUND_MESSAGE
            );
        }
    }
}

fn print_overview(config: &EcoRideConfig, config_path: Option<&PathBuf>, verbose: bool) {
    println!("EcoRide {}", ecoride::VERSION);
    println!("Run `ecoride serve` to start the API or `ecoride --help` for all commands.");

    if verbose {
        let path = config_path
            .cloned()
            .or_else(EcoRideConfig::get_config_path)
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
        println!("Using config from: {path}");
        println!("Listen address: {}:{}", config.server.host, config.server.port);
        println!("Session backend: {}", config.session.backend);
        println!("Log level: {}", config.logging.level);
    }
}
