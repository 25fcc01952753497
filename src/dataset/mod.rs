//! Preparation of class-per-directory soil photo datasets

/// Random geometric augmentation
pub mod augment;
/// Labeled sample discovery
pub mod samples;
/// Subdivision into training tiles
pub mod split;

pub use samples::LabeledSample;
