use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use groundspeed::{
    io::{self, SequenceLayout},
    EstimatorConfig, SpeedEstimator,
};

/// Estimate ground speed (km/s) from a sequence of overlapping images
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Images in capture order. Takes precedence over `--sequence-dir`
    images: Vec<PathBuf>,

    /// Directory holding a numbered capture sequence (`sequence-01.jpg`, ...)
    #[arg(long)]
    sequence_dir: Option<PathBuf>,

    /// File name stem of the numbered sequence
    #[arg(long, default_value = "sequence")]
    stem: String,

    /// File extension of the numbered sequence
    #[arg(long, default_value = "jpg")]
    extension: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames of the numbered sequence
    #[arg(long)]
    frames: Option<usize>,

    /// Seconds between two captures
    #[arg(long)]
    interval: Option<f64>,

    /// Ground sample distance in cm per pixel
    #[arg(long)]
    gsd: Option<f64>,

    #[arg(long)]
    max_features: Option<usize>,

    #[arg(long)]
    radius_ratio: Option<f64>,

    #[arg(long)]
    keep_ratio: Option<f64>,

    /// Time budget per frame pair in milliseconds
    #[arg(long)]
    pair_budget_ms: Option<u64>,

    /// Known speed in km/s to report the percentage error against
    #[arg(long)]
    reference: Option<f64>,

    /// Where the final speed is written
    #[arg(short, long, default_value = "result.txt")]
    output: PathBuf,
}

impl Args {
    fn config(&self) -> Result<EstimatorConfig> {
        let mut config = match &self.config {
            Some(path) => EstimatorConfig::from_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => EstimatorConfig::default(),
        };

        if let Some(frames) = self.frames {
            config.total_frames = frames;
        }
        if let Some(interval) = self.interval {
            config.time_interval_secs = interval;
        }
        if let Some(gsd) = self.gsd {
            config.ground_sample_distance_cm = gsd;
        }
        if let Some(max_features) = self.max_features {
            config.max_features_per_image = max_features;
        }
        if let Some(radius_ratio) = self.radius_ratio {
            config.radius_ratio = radius_ratio;
        }
        if let Some(keep_ratio) = self.keep_ratio {
            config.keep_ratio = keep_ratio;
        }
        if self.pair_budget_ms.is_some() {
            config.pair_budget_ms = self.pair_budget_ms;
        }
        if self.reference.is_some() {
            config.reference_speed_km_s = self.reference;
        }

        config.validate()?;
        Ok(config)
    }

    fn image_paths(&self, config: &EstimatorConfig) -> Result<Vec<PathBuf>> {
        if !self.images.is_empty() {
            return Ok(self.images.clone());
        }
        let Some(directory) = &self.sequence_dir else {
            bail!("no images given, pass image paths or --sequence-dir");
        };
        let layout = SequenceLayout {
            directory: directory.clone(),
            stem: self.stem.clone(),
            extension: self.extension.clone(),
        };
        Ok(layout.paths(config.total_frames))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.config()?;
    let paths = args.image_paths(&config)?;

    let images = io::load_sequence(&paths).context("loading image sequence")?;
    let estimator = SpeedEstimator::new(config)?;
    let estimate = estimator.estimate(&images)?;

    io::write_result(&args.output, &estimate)?;
    println!("{}", estimate.formatted());

    if let Some(reference) = estimator.config().reference_speed_km_s {
        let error = estimate.percentage_error(reference);
        info!(reference, error, "compared against reference speed");
        println!("percentage error: {error:.2}%");
    }

    Ok(())
}
