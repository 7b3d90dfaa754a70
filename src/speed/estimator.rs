use std::time::{Duration, Instant};

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    algorithms::{displacement::robust_displacement, statistics::lower_median},
    config::EstimatorConfig,
    error::{PairError, Result, SpeedError},
    speed::{
        conversion::to_speed,
        features::{FeatureExtractor, SizedFeature},
        frame::Frame,
        matching::{CrossCheckMatcher, Hamming},
        region::filter_central,
    },
};

/// What became of one consecutive frame pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Estimated { displacement_px: f64, speed_km_s: f64 },
    /// No correspondence survived filtering, counts as a speed of `0`
    Degenerate,
    Failed(PairError),
}

/// Result record owned by the pair `(index, index + 1)`
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub index: usize,
    /// Cross-checked matches before the central region filter
    pub matches: usize,
    /// Correspondences inside the central region
    pub central: usize,
    pub outcome: PairOutcome,
}

impl PairReport {
    /// Speed this pair contributes to the median, if any.
    pub fn speed(&self, exclude_degenerate: bool) -> Option<f64> {
        match &self.outcome {
            PairOutcome::Estimated { speed_km_s, .. } => Some(*speed_km_s),
            PairOutcome::Degenerate if !exclude_degenerate => Some(0.0),
            PairOutcome::Degenerate | PairOutcome::Failed(_) => None,
        }
    }
}

/// Final speed of a sequence together with the per pair reports it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedEstimate {
    pub speed_km_s: f64,
    pub pairs: Vec<PairReport>,
    /// Number of pairs that entered the median
    pub used_pairs: usize,
}

impl SpeedEstimate {
    /// Median over the pairs that produced a speed. Failed pairs never take part,
    /// degenerate ones count as `0` unless `exclude_degenerate` is set.
    pub fn from_reports(pairs: Vec<PairReport>, exclude_degenerate: bool) -> Result<Self> {
        let speeds: Vec<f64> = pairs
            .iter()
            .filter_map(|pair| pair.speed(exclude_degenerate))
            .collect();

        let speed_km_s = lower_median(&speeds).ok_or(SpeedError::NoUsablePairs)?;

        let degenerate = pairs
            .iter()
            .filter(|p| p.outcome == PairOutcome::Degenerate)
            .count();
        let failed = pairs
            .iter()
            .filter(|p| matches!(p.outcome, PairOutcome::Failed(_)))
            .count();
        info!(
            speed_km_s,
            pairs = pairs.len(),
            used = speeds.len(),
            degenerate,
            failed,
            "estimated ground speed"
        );

        Ok(Self {
            speed_km_s,
            used_pairs: speeds.len(),
            pairs,
        })
    }

    /// Fixed point representation with 4 fractional digits, as persisted.
    pub fn formatted(&self) -> String {
        format!("{:.4}", self.speed_km_s)
    }

    /// Deviation from a known speed, in percent of that speed.
    pub fn percentage_error(&self, reference_km_s: f64) -> f64 {
        (self.speed_km_s - reference_km_s).abs() / reference_km_s * 100.0
    }
}

/// Cooperative time budget of a single pair.
///
/// Matching polls it while scanning descriptors and stops early; the cheaper
/// stages after it are checked once they finish.
struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn expires_at(&self) -> Option<Instant> {
        self.budget.map(|budget| self.started + budget)
    }

    fn overrun(&self, stage: &'static str) -> PairError {
        PairError::BudgetExceeded {
            stage,
            elapsed: self.started.elapsed(),
            budget: self.budget.unwrap_or_default(),
        }
    }

    fn check(&self, stage: &'static str) -> Result<(), PairError> {
        match self.budget {
            Some(budget) if self.started.elapsed() > budget => Err(self.overrun(stage)),
            _ => Ok(()),
        }
    }
}

/// Drives extraction, matching, filtering and conversion over every
/// consecutive pair of a sequence and reduces the pair speeds to their median.
///
/// Pairs are independent of each other. Each one produces its own [`PairReport`],
/// collected in pair order.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    config: EstimatorConfig,
    extractor: FeatureExtractor,
    matcher: CrossCheckMatcher<Hamming>,
}

impl SpeedEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.fast_threshold, config.blur_sigma),
            matcher: CrossCheckMatcher::new(Hamming),
            config,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate the ground speed in km/s from images captured `time_interval_secs` apart.
    pub fn estimate(&self, images: &[GrayImage]) -> Result<SpeedEstimate> {
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                pool.install(|| self.estimate_in_pool(images))
            }
            None => self.estimate_in_pool(images),
        }
    }

    fn estimate_in_pool(&self, images: &[GrayImage]) -> Result<SpeedEstimate> {
        check_sequence(images)?;
        let frames = self.extract_frames(images);
        self.estimate_frames(&frames)
    }

    /// Features of every image, in sequence order.
    pub fn extract_frames(&self, images: &[GrayImage]) -> Vec<Frame<SizedFeature>> {
        images
            .par_iter()
            .map(|image| Frame::from_image(image, &self.extractor, self.config.max_features_per_image))
            .collect()
    }

    /// Reduce already extracted frames to one speed.
    pub fn estimate_frames(&self, frames: &[Frame<SizedFeature>]) -> Result<SpeedEstimate> {
        if frames.len() < 2 {
            return Err(SpeedError::TooFewFrames {
                frames: frames.len(),
            });
        }

        let pairs: Vec<PairReport> = frames
            .par_windows(2)
            .enumerate()
            .map(|(index, pair)| self.estimate_pair(index, &pair[0], &pair[1]))
            .collect();

        SpeedEstimate::from_reports(pairs, self.config.exclude_degenerate_pairs)
    }

    /// Run matching, filtering, displacement and conversion for the pair `(previous, next)`.
    pub fn estimate_pair(
        &self,
        index: usize,
        previous: &Frame<SizedFeature>,
        next: &Frame<SizedFeature>,
    ) -> PairReport {
        let deadline = Deadline::start(self.config.pair_budget());
        let mut report = PairReport {
            index,
            matches: 0,
            central: 0,
            outcome: PairOutcome::Degenerate,
        };

        let matches = self.matcher.match_features_until(
            &previous.features,
            &next.features,
            deadline.expires_at(),
        );
        let Some(matches) = matches else {
            let err = deadline.overrun("matching");
            warn!(pair = index, %err, "dropping pair");
            report.outcome = PairOutcome::Failed(err);
            return report;
        };
        report.matches = matches.len();

        let central = filter_central(
            &previous.features,
            &next.features,
            &matches,
            previous.shape,
            self.config.radius_ratio,
        );
        report.central = central.len();
        if central.is_empty() {
            warn!(pair = index, matches = report.matches, "no central correspondences");
            return report;
        }

        let displacement_px =
            robust_displacement(&central.source, &central.target, self.config.keep_ratio);
        if let Err(err) = deadline.check("displacement") {
            warn!(pair = index, %err, "dropping pair");
            report.outcome = PairOutcome::Failed(err);
            return report;
        }

        let speed_km_s = to_speed(
            displacement_px,
            self.config.ground_sample_distance_cm,
            self.config.time_interval_secs,
        );
        debug!(
            pair = index,
            matches = report.matches,
            central = report.central,
            displacement_px,
            speed_km_s,
            "pair estimated"
        );

        report.outcome = PairOutcome::Estimated {
            displacement_px,
            speed_km_s,
        };
        report
    }
}

/// At least two frames, all of the same size.
fn check_sequence(images: &[GrayImage]) -> Result<()> {
    if images.len() < 2 {
        return Err(SpeedError::TooFewFrames {
            frames: images.len(),
        });
    }

    let expected = images[0].dimensions();
    for (index, image) in images.iter().enumerate().skip(1) {
        if image.dimensions() != expected {
            return Err(SpeedError::ShapeMismatch {
                index,
                expected,
                found: image.dimensions(),
            });
        }
    }
    Ok(())
}
