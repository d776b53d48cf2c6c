use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use firemap_rasterizer::overlay::convert;
use firemap_rasterizer::{ForecastUnit, GeoFootprint, RasterSource};

/// Converts a wildfire forecast TIFF into a PNG map overlay
#[derive(Parser, Debug)]
#[command(name = "firemap-rasterizer", version)]
struct Args {
    /// Raster file path or http(s) URL
    source: String,

    /// Latitude of the overlay center
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the overlay center
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Where to write the PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    bbox: GeoFootprint,
    width: usize,
    height: usize,
    min: f64,
    max: f64,
    unit: ForecastUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = RasterSource::parse(&args.source);
    let overlay = convert(source, args.lat, args.lng)
        .await
        .with_context(|| format!("Failed to convert {}", args.source))?;

    if let Some(path) = &args.output {
        std::fs::write(path, &overlay.image)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = overlay.image.len(), "Wrote overlay");
    }

    let summary = Summary {
        bbox: overlay.rectangle,
        width: overlay.width,
        height: overlay.height,
        min: overlay.min,
        max: overlay.max,
        unit: ForecastUnit::from_path(&args.source),
        output: args.output.as_ref(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
