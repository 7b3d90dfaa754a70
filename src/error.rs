use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Faults that make a whole estimation run meaningless.
#[derive(Error, Debug)]
pub enum SpeedError {
    #[error("at least 2 frames are required, got {frames}")]
    TooFewFrames { frames: usize },

    #[error("time interval must be positive, got {seconds} s")]
    NonPositiveInterval { seconds: f64 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("frame {index} is {found:?} pixels but the sequence started with {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("failed to read image {path}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read configuration {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write result to {path}")]
    ResultWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no frame pair produced a usable speed estimate")]
    NoUsablePairs,
}

/// Faults confined to a single frame pair. The pair is left out of the final median.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PairError {
    #[error("{stage} exceeded the pair budget ({elapsed:?} > {budget:?})")]
    BudgetExceeded {
        stage: &'static str,
        elapsed: Duration,
        budget: Duration,
    },
}

pub type Result<T, E = SpeedError> = std::result::Result<T, E>;
