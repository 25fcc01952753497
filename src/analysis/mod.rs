//! Classification passes, tile aggregation and model evaluation

/// Per-label tallies and proportion reports
pub mod aggregation;
/// Ground-truth evaluation of whole-image predictions
pub mod evaluation;
/// End-to-end percentage classification of a photograph
pub mod pipeline;

pub use aggregation::{LabelShare, ProportionReport, TileCounts};
pub use pipeline::{ClassificationPass, PassConfig, classify_image};
