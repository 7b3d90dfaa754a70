//! Ground speed estimation from consecutive overlapping images

pub mod conversion;
pub mod estimator;
pub mod features;
pub mod frame;
pub mod matching;
pub mod region;
