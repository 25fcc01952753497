//! Soil type mixture estimation from tiled photo classification
//!
//! A soil photograph is resized to a square canvas, cut into equal tiles,
//! every tile is labeled by a small convolutional classifier and the
//! labels are tallied into the proportion of gravel, sand and silt.

#![forbid(unsafe_code)]

/// Classification passes, aggregation and evaluation
pub mod analysis;
/// Dataset subdivision, augmentation and sample discovery
pub mod dataset;
/// Input/output operations, configuration and error handling
pub mod io;
/// Soil labels, the classifier seam and the convolutional network
pub mod model;
/// Image tiling
pub mod spatial;

pub use io::error::{Result, SoilError};
