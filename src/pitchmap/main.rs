//! Lit pitch map generator.
//!
//! Queries Overpass for lit pitches, resolves way centroids, classifies each
//! feature against the region box and writes an interactive HTML map.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pitchmap::config::Config;
use pitchmap::export::save_csv;
use pitchmap::overpass::OverpassClient;
use pitchmap::render::MapDocument;
use pitchmap::PitchPipeline;

#[derive(Parser, Debug)]
#[command(name = "pitchmap")]
#[command(about = "Map lit sports pitches from OpenStreetMap")]
struct Args {
    /// TOML config file (built-in Vancouver defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output HTML file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write every row to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Overpass interpreter URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Resolve centroids for relations as well as ways
    #[arg(long)]
    resolve_relations: bool,

    /// Hide the centroid progress bar
    #[arg(long)]
    no_progress: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(output) = &self.output {
            config.map.output = output.clone();
        }
        if let Some(csv) = &self.csv {
            config.map.csv_output = Some(csv.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.overpass.endpoint = endpoint.clone();
        }
        if self.resolve_relations {
            config.search.resolve_relations = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = args.load_config()?;

    info!("Pitchmap");
    info!(
        "Searching {} for {} features",
        config.search.bbox.to_overpass(),
        config
            .search
            .filters
            .iter()
            .map(|f| format!("{}={}", f.key, f.value))
            .collect::<Vec<_>>()
            .join(" + ")
    );

    let client = OverpassClient::new(&config.overpass).context("Failed to set up Overpass client")?;
    info!("Using Overpass endpoint {}", client.endpoint());

    let table = PitchPipeline::new(&client, &config)
        .with_progress(!args.no_progress)
        .run()
        .await
        .context("Failed to build pitch table")?;

    if let Some(csv_path) = &config.map.csv_output {
        save_csv(&table, &config.region.name, csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    }

    let map_file = &config.map.output;
    MapDocument::new(&config.map, &config.region.name)
        .save(&table, map_file)
        .with_context(|| format!("Failed to write {}", map_file.display()))?;

    println!(
        "Map with satellite imagery has been saved as {}",
        map_file.display()
    );

    Ok(())
}
