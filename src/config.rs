use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    algorithms::displacement::DEFAULT_KEEP_RATIO,
    error::{Result, SpeedError},
    speed::region::DEFAULT_RADIUS_RATIO,
};

/// Tunables of a speed estimation run.
///
/// The ratios and the capture cadence are empirical knobs, calibrated per platform:
/// - `time_interval_secs` too small leaves displacements buried in detector noise,
///   too large lets features leave the overlap between frames.
/// - fewer `max_features_per_image` tends to give more reliable correspondences
///   at the cost of coverage.
/// - `radius_ratio` trades peripheral distortion against the number of usable matches.
/// - `keep_ratio` is the share of largest displacements averaged per pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Length of a numbered capture sequence
    pub total_frames: usize,
    pub time_interval_secs: f64,
    pub max_features_per_image: usize,
    /// Ground sample distance in centimeters per pixel at the imaging altitude
    pub ground_sample_distance_cm: f64,
    pub radius_ratio: f64,
    pub keep_ratio: f64,
    /// FAST intensity threshold
    pub fast_threshold: u8,
    /// Gaussian pre-blur applied before sampling descriptors
    pub blur_sigma: f32,
    /// Optional time budget for the computation of one frame pair
    pub pair_budget_ms: Option<u64>,
    /// Leave pairs without any central correspondence out of the median instead of counting them as `0`
    pub exclude_degenerate_pairs: bool,
    /// Worker threads, defaults to the rayon global pool
    pub threads: Option<usize>,
    /// Known ground truth used for the percentage error report
    pub reference_speed_km_s: Option<f64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            total_frames: 42,
            time_interval_secs: 2.0,
            max_features_per_image: 1000,
            ground_sample_distance_cm: 12648.0,
            radius_ratio: DEFAULT_RADIUS_RATIO,
            keep_ratio: DEFAULT_KEEP_RATIO,
            fast_threshold: 20,
            blur_sigma: 2.0,
            pair_budget_ms: None,
            exclude_degenerate_pairs: false,
            threads: None,
            reference_speed_km_s: None,
        }
    }
}

impl EstimatorConfig {
    /// Read a TOML file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SpeedError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn pair_budget(&self) -> Option<Duration> {
        self.pair_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(message: String) -> Result<()> {
            Err(SpeedError::InvalidConfig { message })
        }

        if !(self.time_interval_secs > 0.0) || !self.time_interval_secs.is_finite() {
            return Err(SpeedError::NonPositiveInterval {
                seconds: self.time_interval_secs,
            });
        }
        if self.total_frames < 2 {
            return Err(SpeedError::TooFewFrames {
                frames: self.total_frames,
            });
        }
        if self.max_features_per_image == 0 {
            return invalid("max_features_per_image must be at least 1".into());
        }
        if !(self.ground_sample_distance_cm > 0.0) || !self.ground_sample_distance_cm.is_finite() {
            return invalid(format!(
                "ground_sample_distance_cm must be positive, got {}",
                self.ground_sample_distance_cm
            ));
        }
        if !(self.radius_ratio >= 0.0) {
            return invalid(format!("radius_ratio must be non-negative, got {}", self.radius_ratio));
        }
        if !(self.keep_ratio > 0.0 && self.keep_ratio <= 1.0) {
            return invalid(format!("keep_ratio must lie in (0, 1], got {}", self.keep_ratio));
        }
        if !(self.blur_sigma > 0.0) {
            return invalid(format!("blur_sigma must be positive, got {}", self.blur_sigma));
        }
        if self.threads == Some(0) {
            return invalid("threads must be at least 1".into());
        }
        if let Some(reference) = self.reference_speed_km_s {
            if !(reference > 0.0) {
                return invalid(format!("reference_speed_km_s must be positive, got {reference}"));
            }
        }
        Ok(())
    }
}
