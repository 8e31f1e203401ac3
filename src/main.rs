pub mod attributes;
pub mod config;
pub mod data;
pub mod filter;
pub mod generator;
pub mod geometry;
pub mod processing;
pub mod server;
pub mod types;
pub mod zones;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the zone map API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Compose the filtered zone collection once and write it as GeoJSON
    Filter {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Deselect a value, e.g. `landUse=Forest` or `ownership=private`
        #[arg(short, long, value_name = "DIMENSION=VALUE")]
        exclude: Vec<String>,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Generate synthetic cadastral plots
    Generate {
        #[arg(short = 'n', long, default_value_t = 250)]
        count: usize,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn parse_exclusion(raw: &str) -> Result<(types::Dimension, &str)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected DIMENSION=VALUE, got '{}'", raw))?;
    let dimension = types::Dimension::parse(name)
        .ok_or_else(|| anyhow!("Unknown filter dimension: {}", name))?;
    Ok((dimension, value))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving zones with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let features = data::load_data(&app_config)?;
            let catalog = data::discover_catalog(&features, &app_config.filters);
            let composer = processing::Composer::new(features, &app_config.thresholds);

            server::start_server(app_config, composer, catalog).await?;
        }
        Commands::Filter {
            config,
            exclude,
            output,
        } => {
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load both sources and select everything
            let features = data::load_data(&app_config)?;
            let catalog = data::discover_catalog(&features, &app_config.filters);
            let mut filters = types::FilterState::all_active(&catalog);

            // 2. Apply exclusions
            for raw in exclude {
                let (dimension, value) = parse_exclusion(raw)?;
                filters = filters.without(dimension, value);
            }

            // 3. Compose
            let composer = processing::Composer::new(features, &app_config.thresholds);
            let composed = composer.compose(&filters);
            info!(
                "Total cadastral zones after filters: {} (fingerprint {:?})",
                composed.collection.features.len(),
                composed.fingerprint
            );

            let json = serde_json::to_string_pretty(&composed.collection)?;
            match output {
                Some(path) => fs::write(path, json)
                    .with_context(|| format!("Failed to write output: {:?}", path))?,
                None => println!("{}", json),
            }
        }
        Commands::Generate {
            count,
            seed,
            output,
        } => {
            let params = generator::GeneratorParams {
                count: *count,
                ..Default::default()
            };
            let collection = generator::generate_zones(&params, *seed);
            fs::write(output, serde_json::to_string_pretty(&collection)?)
                .with_context(|| format!("Failed to write output: {:?}", output))?;
            info!("Generated {} zones into {:?}", collection.features.len(), output);
        }
    }

    Ok(())
}
