//! Urban land-surface-temperature query tool.
//!
//! Runs one pipeline invocation against the configured imagery service
//! and prints the JSON result on stdout:
//! - `cities`: list the configured query targets
//! - `stats`: min/max/mean/stdDev temperature statistics
//! - `heatmap`: display-normalized heatmap points
//! - `plant`: above-threshold planting candidates

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lst_common::CityRegistry;
use lst_pipeline::{
    HttpImageryService, ImageryClientConfig, LstService, LstSource, PipelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "lst-query")]
#[command(about = "Query satellite land-surface temperature for a city")]
struct Args {
    /// Imagery service endpoint
    #[arg(long, env = "IMAGERY_URL", default_value = "http://localhost:8089")]
    endpoint: String,

    /// Imagery project identifier
    #[arg(long, env = "IMAGERY_PROJECT")]
    project: Option<String>,

    /// Imagery API token
    #[arg(long, env = "IMAGERY_TOKEN")]
    api_token: Option<String>,

    /// Cities YAML file (defaults to the built-in registry)
    #[arg(long, env = "CITIES_FILE")]
    cities_file: Option<PathBuf>,

    /// Candidate trailing-day windows, narrowest first
    #[arg(long, value_delimiter = ',', default_values_t = [30u32, 90, 180])]
    windows: Vec<u32>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available cities
    Cities,
    /// Temperature statistics for a city
    Stats {
        city: String,
        /// Satellite source (modis or landsat)
        #[arg(long, default_value = "modis")]
        source: String,
        /// Region radius in kilometers
        #[arg(long, default_value = "10.0")]
        radius_km: f64,
    },
    /// Normalized heatmap points for a city
    Heatmap {
        city: String,
        #[arg(long, default_value = "modis")]
        source: String,
        #[arg(long, default_value = "10.0")]
        radius_km: f64,
    },
    /// Planting-priority hotspots for a city
    Plant {
        city: String,
        #[arg(long, default_value = "modis")]
        source: String,
        #[arg(long, default_value = "10.0")]
        radius_km: f64,
        /// Hotspot threshold in Celsius
        #[arg(long, default_value = "35.0")]
        threshold: f64,
        /// Maximum number of points
        #[arg(long, default_value = "30")]
        max_points: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing; logs go to stderr so stdout stays clean JSON.
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cities = match &args.cities_file {
        Some(path) => CityRegistry::from_yaml_file(path)
            .with_context(|| format!("failed to load cities from {}", path.display()))?,
        None => CityRegistry::builtin(),
    };

    if let Command::Cities = args.command {
        let list: Vec<_> = cities.iter().collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    // Acquire the imagery client once, up front; an unreachable
    // endpoint fails the run before any query is attempted.
    let client_config = ImageryClientConfig {
        base_url: args.endpoint.clone(),
        project: args.project.clone(),
        api_token: args.api_token.clone(),
        ..Default::default()
    };
    let imagery = HttpImageryService::connect(client_config)
        .await
        .context("failed to connect to the imagery service")?;
    info!(endpoint = %args.endpoint, "connected to imagery service");

    let pipeline_config = PipelineConfig {
        windows_days: args.windows.clone(),
        ..Default::default()
    };
    let service = LstService::new(Arc::new(imagery), cities, pipeline_config);

    let output = match args.command {
        Command::Cities => unreachable!("handled above"),
        Command::Stats {
            city,
            source,
            radius_km,
        } => {
            let source = LstSource::parse(&source)?;
            let report = service.get_statistics(&city, source, radius_km).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Heatmap {
            city,
            source,
            radius_km,
        } => {
            let source = LstSource::parse(&source)?;
            let report = service.get_heatmap(&city, source, radius_km).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Plant {
            city,
            source,
            radius_km,
            threshold,
            max_points,
        } => {
            let source = LstSource::parse(&source)?;
            let report = service
                .get_planting_points(&city, source, radius_km, threshold, max_points)
                .await?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{}", output);
    Ok(())
}
