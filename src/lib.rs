//! Estimate the ground speed of a moving camera from a sequence of overlapping
//! grayscale images taken at a fixed interval.
//!
//! Every consecutive pair goes through FAST/BRIEF feature extraction, cross-checked
//! Hamming matching, a central region filter and a trimmed mean of the pixel
//! displacements. Pixel displacements are scaled to km/s through the ground sample
//! distance, and the median over all pairs is the final estimate.

pub mod algorithms;
pub mod config;
pub mod error;
pub mod io;
pub mod speed;

pub use config::EstimatorConfig;
pub use error::{PairError, SpeedError};
pub use speed::estimator::{PairOutcome, PairReport, SpeedEstimate, SpeedEstimator};
