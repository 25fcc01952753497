//! Classifier seam between the tiling pass and whatever model backs it
//!
//! The pass only needs "tile in, label out". Models that expose
//! confidences implement [`Classifier::predict`]; plain functions can be
//! used directly through the blanket closure implementation.

use crate::io::error::{Result, computation_error};
use crate::model::SoilLabel;
use image::RgbImage;

/// Per-label confidences produced for one image or tile
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    scores: Vec<(SoilLabel, f32)>,
}

impl Prediction {
    /// Wrap per-label scores in model output order
    pub const fn new(scores: Vec<(SoilLabel, f32)>) -> Self {
        Self { scores }
    }

    /// A prediction that puts all confidence on a single label
    pub fn certain(label: SoilLabel) -> Self {
        Self {
            scores: vec![(label, 1.0)],
        }
    }

    /// Scores in model output order
    pub fn scores(&self) -> &[(SoilLabel, f32)] {
        &self.scores
    }

    /// Confidence for `label`, if the model outputs it
    pub fn score(&self, label: SoilLabel) -> Option<f32> {
        self.scores
            .iter()
            .find(|(candidate, _)| *candidate == label)
            .map(|&(_, score)| score)
    }

    /// Highest-confidence label; ties resolve to the earliest output
    ///
    /// # Errors
    ///
    /// Returns a computation error if the prediction is empty or every score is NaN
    pub fn top(&self) -> Result<SoilLabel> {
        let mut best: Option<(SoilLabel, f32)> = None;
        for &(label, score) in &self.scores {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((label, score)),
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| computation_error("argmax", &"prediction has no usable scores"))
    }
}

/// Maps a fixed-size RGB tile to a soil label
///
/// Implementations must be deterministic for a fixed model and input and
/// shareable across the worker threads of a classification pass.
pub trait Classifier: Sync {
    /// Produce per-label confidences for `tile`
    ///
    /// # Errors
    ///
    /// Returns an error if the tile cannot be evaluated by the model
    fn predict(&self, tile: &RgbImage) -> Result<Prediction>;

    /// Label with the highest confidence for `tile`
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails or yields no usable score
    fn classify(&self, tile: &RgbImage) -> Result<SoilLabel> {
        self.predict(tile)?.top()
    }
}

impl<F> Classifier for F
where
    F: Fn(&RgbImage) -> SoilLabel + Sync,
{
    fn predict(&self, tile: &RgbImage) -> Result<Prediction> {
        Ok(Prediction::certain(self(tile)))
    }

    fn classify(&self, tile: &RgbImage) -> Result<SoilLabel> {
        Ok(self(tile))
    }
}
