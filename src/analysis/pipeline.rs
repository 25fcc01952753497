//! End-to-end percentage classification of one soil photograph
//!
//! The photo is resized to a square canonical canvas, cut into tiles,
//! every tile is classified and the labels are tallied into a
//! [`ProportionReport`] covering the whole canvas.

use crate::analysis::aggregation::{ProportionReport, TileCounts};
use crate::io::configuration::{CANONICAL_RESOLUTION, PARALLEL_TILE_THRESHOLD, TILE_DIMENSION};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{load_rgb, resize_to_canonical};
use crate::model::{Classifier, SoilLabel};
use crate::spatial::{TileOffset, Tiler};
use image::RgbImage;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

/// Geometry and scheduling of a classification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    /// Side length the source is resized to before tiling
    pub resolution: u32,
    /// Tile side length
    pub tile_dimension: u32,
    /// Tile count from which tiles are classified on the thread pool
    pub parallel_threshold: usize,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            resolution: CANONICAL_RESOLUTION,
            tile_dimension: TILE_DIMENSION,
            parallel_threshold: PARALLEL_TILE_THRESHOLD,
        }
    }
}

impl PassConfig {
    /// Reject geometries that cannot produce a tile
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the resolution or tile
    /// dimension is zero. A tile larger than the canvas is accepted here
    /// and surfaces later as a zero-tile computation error.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(invalid_parameter(
                "resolution",
                &self.resolution,
                &"must be positive",
            ));
        }
        if self.tile_dimension == 0 {
            return Err(invalid_parameter(
                "tile_dimension",
                &self.tile_dimension,
                &"must be positive",
            ));
        }
        Ok(())
    }

    /// Number of tiles a canvas of this configuration yields
    pub const fn tiles_per_image(&self) -> usize {
        if self.tile_dimension == 0 {
            return 0;
        }
        let per_side = (self.resolution / self.tile_dimension) as usize;
        per_side * per_side
    }
}

/// Outcome of classifying one photograph
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationPass {
    /// Fractions of each reported soil type
    pub report: ProportionReport,
    /// Raw per-label tally behind the report
    pub counts: TileCounts,
    /// Tiles cut from the canvas
    pub tiles: usize,
    /// Wall-clock time from loading to aggregation
    pub elapsed: Duration,
}

/// Classify the photograph at `path` and report soil type proportions
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The image cannot be opened or decoded
/// - The classifier fails on a tile
/// - No tile received a reported label
pub fn classify_image<C>(
    path: &Path,
    classifier: &C,
    config: &PassConfig,
    progress: Option<&ProgressBar>,
) -> Result<ClassificationPass>
where
    C: Classifier + ?Sized,
{
    let start = Instant::now();
    config.validate()?;

    let image = load_rgb(path)?;
    let canvas = resize_to_canonical(&image, config.resolution);
    let counts = count_tiles(&canvas, classifier, config, progress)?;
    let report = counts.proportions()?;
    let elapsed = start.elapsed();

    tracing::info!(
        path = %path.display(),
        counted = counts.counted(),
        ignored = counts.ignored(),
        elapsed_ms = elapsed.as_millis(),
        "Classified image"
    );

    Ok(ClassificationPass {
        report,
        tiles: counts.counted() + counts.ignored(),
        counts,
        elapsed,
    })
}

/// Tile `canvas` as-is and tally the classifier's label for every tile
///
/// Fans out over the rayon pool once the tile count reaches
/// `config.parallel_threshold`; the tally is identical either way.
///
/// # Errors
///
/// Returns an error if the tile dimension is zero or the classifier fails
pub fn count_tiles<C>(
    canvas: &RgbImage,
    classifier: &C,
    config: &PassConfig,
    progress: Option<&ProgressBar>,
) -> Result<TileCounts>
where
    C: Classifier + ?Sized,
{
    let tiler = Tiler::new(canvas, config.tile_dimension)?;
    let offsets: Vec<TileOffset> = tiler.layout().offsets().collect();

    if let Some(bar) = progress {
        bar.set_length(offsets.len() as u64);
        bar.set_position(0);
    }

    let classify_one = |offset: TileOffset| -> Result<Option<SoilLabel>> {
        let Some(tile) = tiler.crop(offset) else {
            return Ok(None);
        };
        let label = classifier.classify(&tile.pixels)?;
        if let Some(bar) = progress {
            bar.inc(1);
        }
        Ok(Some(label))
    };

    let parallel = offsets.len() >= config.parallel_threshold.max(1);
    tracing::debug!(
        tiles = offsets.len(),
        dimension = config.tile_dimension,
        parallel,
        "Classifying tiles"
    );

    if parallel {
        offsets
            .par_iter()
            .map(|&offset| {
                classify_one(offset).map(|label| label.into_iter().collect::<TileCounts>())
            })
            .try_reduce(TileCounts::new, |left, right| Ok(left.merge(right)))
    } else {
        offsets
            .iter()
            .try_fold(TileCounts::new(), |mut counts, &offset| -> Result<TileCounts> {
                if let Some(label) = classify_one(offset)? {
                    counts.record(label);
                }
                Ok(counts)
            })
    }
}
