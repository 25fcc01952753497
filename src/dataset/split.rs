//! Subdivision of a class-per-directory dataset into small training tiles

use crate::dataset::samples::{class_directory, list_images};
use crate::io::configuration::{DATASET_TILE_DIMENSION, OUTPUT_EXTENSION, REPORTED_LABELS};
use crate::io::error::{Result, file_system_error, invalid_parameter};
use crate::io::image::{load_rgb, output_stem, save_rgb};
use crate::model::SoilLabel;
use crate::spatial::Tiler;
use image::RgbImage;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// What to cut and how to treat existing output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Tile side length in pixels
    pub dimension: u32,
    /// Class directories to process
    pub classes: Vec<SoilLabel>,
    /// Write into output class directories that already exist
    pub overwrite: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            dimension: DATASET_TILE_DIMENSION,
            classes: REPORTED_LABELS.to_vec(),
            overwrite: false,
        }
    }
}

/// Totals of a dataset split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Source images read
    pub images: usize,
    /// Tiles written
    pub tiles: usize,
    /// Requested classes with no input directory
    pub missing_classes: usize,
}

/// File name of the tile at pixel offset (`row`, `col`) cut from `source`
///
/// The source extension is part of the name, so `a.jpg` and `a.png` in
/// one class directory yield distinct tiles.
pub fn tile_file_name(source: &Path, row: u32, col: u32) -> String {
    format!("{}_img{row}_{col}.{OUTPUT_EXTENSION}", output_stem(source))
}

/// Cut `image`, loaded from `source`, into complete tiles and write each
/// into `output_dir`
///
/// Returns the paths written, in row-major order.
///
/// # Errors
///
/// Returns an error if the dimension is zero or a tile cannot be saved
pub fn split_image(
    image: &RgbImage,
    source: &Path,
    dimension: u32,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let tiler = Tiler::new(image, dimension)?;
    let mut written = Vec::with_capacity(tiler.layout().tile_count());
    for tile in tiler.tiles() {
        let path = output_dir.join(tile_file_name(source, tile.offset.row, tile.offset.col));
        save_rgb(&tile.pixels, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Split every image of each requested class under `input_root` into
/// tiles under `output_root/<Class>/`
///
/// # Errors
///
/// Returns an error if:
/// - The tile dimension is zero
/// - An output class directory exists and `overwrite` is off
/// - A directory cannot be read or created
/// - An image cannot be loaded or a tile cannot be saved
pub fn split_dataset(
    input_root: &Path,
    output_root: &Path,
    options: &SplitOptions,
    progress: Option<&ProgressBar>,
) -> Result<SplitSummary> {
    if options.dimension == 0 {
        return Err(invalid_parameter(
            "dimension",
            &options.dimension,
            &"must be positive",
        ));
    }

    let mut summary = SplitSummary::default();
    for &label in &options.classes {
        let Some(input_dir) = class_directory(input_root, label)? else {
            tracing::warn!(
                root = %input_root.display(),
                class = %label,
                "No input directory for class"
            );
            summary.missing_classes += 1;
            continue;
        };

        let output_dir = output_root.join(label.name());
        if output_dir.exists() && !options.overwrite {
            return Err(invalid_parameter(
                "output",
                &output_dir.display(),
                &"directory already exists (use --force to write into it)",
            ));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| file_system_error(&output_dir, "create directory", e))?;

        let files = list_images(&input_dir)?;
        if let Some(bar) = progress {
            bar.inc_length(files.len() as u64);
        }

        for file in files {
            let image = load_rgb(&file)?;
            let written = split_image(&image, &file, options.dimension, &output_dir)?;
            tracing::debug!(
                path = %file.display(),
                tiles = written.len(),
                "Split image"
            );
            summary.images += 1;
            summary.tiles += written.len();
            if let Some(bar) = progress {
                bar.inc(1);
            }
        }
    }

    tracing::info!(
        images = summary.images,
        tiles = summary.tiles,
        output = %output_root.display(),
        "Dataset split complete"
    );
    Ok(summary)
}
