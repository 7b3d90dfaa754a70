//! Collection of general algorithms used by the speed estimation pipeline,
//! independent of frames, configuration and physical units

pub mod brief;
pub mod displacement;
pub mod statistics;
