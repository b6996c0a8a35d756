use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gps_track_filter::config::FilterConfig;
use gps_track_filter::diagnostics::{legs, summarize};
use gps_track_filter::pipeline;
use gps_track_filter::track::TrackRecord;
use gps_track_filter::Fix;

#[derive(Parser, Debug)]
#[command(name = "track_filter")]
#[command(about = "Repair timestamps, drop teleports and smooth a recorded GPS track", long_about = None)]
struct Args {
    /// Path to a track record (.rwt/.json, optionally .gz)
    #[arg(long)]
    track: PathBuf,

    /// JSON file with filter parameters (camelCase keys, all optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process noise added per second
    #[arg(long)]
    model_precision: Option<f64>,

    /// Measurement noise of a single fix
    #[arg(long)]
    sensor_precision: Option<f64>,

    /// Implied speed (m/s) above which a fix is dropped
    #[arg(long)]
    outline_speed: Option<f64>,

    /// Implied speed (m/s) at or below which the receiver counts as parked
    #[arg(long)]
    zero_speed_drift: Option<f64>,

    /// Print per-leg speed and bearing for the raw and filtered tracks
    #[arg(long, default_value_t = false)]
    legs: bool,

    /// Write the filtered track as a track record
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> FilterConfig {
        FilterConfig {
            model_precision: self.model_precision,
            sensor_precision: self.sensor_precision,
            outline_speed: self.outline_speed,
            zero_speed_drift: self.zero_speed_drift,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => FilterConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => FilterConfig::default(),
    };
    let params = file_config.merge(args.overrides()).resolve()?;
    log::info!(
        "Filter parameters: model {} sensor {} outline {} m/s drift {} m/s",
        params.model_precision,
        params.sensor_precision,
        params.outline_speed,
        params.zero_speed_drift
    );

    let record = TrackRecord::load(&args.track)
        .with_context(|| format!("failed to load track {}", args.track.display()))?;
    let raw = record.to_fixes();
    let filtered = pipeline::clean(raw.clone(), &params)
        .with_context(|| format!("failed to clean track {}", record.id))?;

    println!("Track {} ({} .. {})", record.id, record.start_at, record.end_at);
    println!("  Raw:      {:>6} fixes, {}", raw.len(), summarize(&raw)?);
    println!("  Filtered: {:>6} fixes, {}", filtered.len(), summarize(&filtered)?);

    if args.legs {
        print_legs("Raw", &raw)?;
        print_legs("Filtered", &filtered)?;
    }

    if let Some(path) = &args.output {
        TrackRecord::from_fixes(record.id, &filtered)?
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Filtered track written to {}", path.display());
    }

    Ok(())
}

fn print_legs(label: &str, fixes: &[Fix]) -> Result<()> {
    println!("\n=== {label} legs ===");
    println!("{:>6} {:>13} {:>7}", "index", "speed", "bearing");
    for leg in legs(fixes) {
        println!("{}", leg.with_context(|| format!("bad leg in {label} track"))?);
    }
    Ok(())
}
