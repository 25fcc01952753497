//! Random geometric augmentation of training photographs
//!
//! Each variant is one affine warp built from a random rotation, shear,
//! zoom and shift, optionally mirrored horizontally. Output pixels are
//! mapped back into the source and sampled bilinearly; samples that land
//! outside the source repeat the nearest edge pixel.

use crate::dataset::samples::{class_directory, list_images};
use crate::io::configuration::{
    AUGMENT_HEIGHT_SHIFT_RANGE, AUGMENT_ROTATION_RANGE, AUGMENT_SHEAR_RANGE,
    AUGMENT_WIDTH_SHIFT_RANGE, AUGMENT_ZOOM_RANGE, MODEL_INPUT_SIZE, OUTPUT_EXTENSION,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{load_rgb, output_stem, resize_to_canonical, save_rgb};
use crate::model::SoilLabel;
use image::{Rgb, RgbImage};
use indicatif::ProgressBar;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::path::Path;

/// Ranges the random transforms are drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentationConfig {
    /// Mirror left-right with probability one half
    pub horizontal_flip: bool,
    /// Zoom factors are drawn from `[1 - zoom_range, 1 + zoom_range]` per axis
    pub zoom_range: f64,
    /// Maximum rotation in degrees, either direction
    pub rotation_range: f64,
    /// Maximum shear angle in degrees, either direction
    pub shear_range: f64,
    /// Maximum vertical shift as a fraction of the output height
    pub height_shift_range: f64,
    /// Maximum horizontal shift as a fraction of the output width
    pub width_shift_range: f64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            horizontal_flip: true,
            zoom_range: AUGMENT_ZOOM_RANGE,
            rotation_range: AUGMENT_ROTATION_RANGE,
            shear_range: AUGMENT_SHEAR_RANGE,
            height_shift_range: AUGMENT_HEIGHT_SHIFT_RANGE,
            width_shift_range: AUGMENT_WIDTH_SHIFT_RANGE,
        }
    }
}

impl AugmentationConfig {
    /// Reject negative, non-finite or degenerate ranges
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error naming the first bad range
    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("zoom_range", self.zoom_range),
            ("rotation_range", self.rotation_range),
            ("shear_range", self.shear_range),
            ("height_shift_range", self.height_shift_range),
            ("width_shift_range", self.width_shift_range),
        ];
        for (name, value) in ranges {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid_parameter(
                    name,
                    &value,
                    &"must be finite and non-negative",
                ));
            }
        }
        // A zoom factor of zero would collapse the image to one pixel
        if self.zoom_range >= 1.0 {
            return Err(invalid_parameter(
                "zoom_range",
                &self.zoom_range,
                &"must be below 1",
            ));
        }
        Ok(())
    }

    /// Draw one random transform within the configured ranges
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Transform {
        Transform {
            flip: self.horizontal_flip && rng.random_bool(0.5),
            rotation_degrees: symmetric(rng, self.rotation_range),
            shear_degrees: symmetric(rng, self.shear_range),
            zoom_x: 1.0 + symmetric(rng, self.zoom_range),
            zoom_y: 1.0 + symmetric(rng, self.zoom_range),
            shift_x: symmetric(rng, self.width_shift_range),
            shift_y: symmetric(rng, self.height_shift_range),
        }
    }
}

fn symmetric<R: Rng>(rng: &mut R, range: f64) -> f64 {
    if range > 0.0 {
        rng.random_range(-range..=range)
    } else {
        0.0
    }
}

/// One concrete augmentation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Mirror left-right
    pub flip: bool,
    /// Counter-clockwise rotation in degrees
    pub rotation_degrees: f64,
    /// Shear angle in degrees
    pub shear_degrees: f64,
    /// Horizontal sampling scale; above one zooms out
    pub zoom_x: f64,
    /// Vertical sampling scale; above one zooms out
    pub zoom_y: f64,
    /// Horizontal shift as a fraction of the width
    pub shift_x: f64,
    /// Vertical shift as a fraction of the height
    pub shift_y: f64,
}

impl Transform {
    /// The transform that leaves an image unchanged
    pub const IDENTITY: Self = Self {
        flip: false,
        rotation_degrees: 0.0,
        shear_degrees: 0.0,
        zoom_x: 1.0,
        zoom_y: 1.0,
        shift_x: 0.0,
        shift_y: 0.0,
    };

    /// Resize `image` to `size` x `size` and warp it
    pub fn apply(&self, image: &RgbImage, size: u32) -> RgbImage {
        let source = resize_to_canonical(image, size.max(1));
        let extent = f64::from(source.width());
        let center = (extent - 1.0) / 2.0;
        let (sin_r, cos_r) = self.rotation_degrees.to_radians().sin_cos();
        let (sin_s, cos_s) = self.shear_degrees.to_radians().sin_cos();

        RgbImage::from_fn(source.width(), source.height(), |x, y| {
            let out_x = if self.flip {
                extent - 1.0 - f64::from(x)
            } else {
                f64::from(x)
            };
            let px = (out_x - center) * self.zoom_x;
            let py = (f64::from(y) - center) * self.zoom_y;

            let sx = px - sin_s * py;
            let sy = cos_s * py;

            let rx = cos_r * sx - sin_r * sy;
            let ry = sin_r * sx + cos_r * sy;

            sample_bilinear(
                &source,
                rx + center + self.shift_x * extent,
                ry + center + self.shift_y * extent,
            )
        })
    }
}

fn sample_bilinear(image: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let max_x = f64::from(image.width().saturating_sub(1));
    let max_y = f64::from(image.height().saturating_sub(1));
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let (x0, y0) = (x.floor(), y.floor());
    let (x1, y1) = ((x0 + 1.0).min(max_x), (y0 + 1.0).min(max_y));
    let (fx, fy) = (x - x0, y - y0);

    let top_left = image.get_pixel(x0 as u32, y0 as u32);
    let top_right = image.get_pixel(x1 as u32, y0 as u32);
    let bottom_left = image.get_pixel(x0 as u32, y1 as u32);
    let bottom_right = image.get_pixel(x1 as u32, y1 as u32);

    let mut out = [0u8; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let channel = |pixel: &Rgb<u8>| f64::from(pixel.0.get(c).copied().unwrap_or(0));
        let top = channel(top_left).mul_add(1.0 - fx, channel(top_right) * fx);
        let bottom = channel(bottom_left).mul_add(1.0 - fx, channel(bottom_right) * fx);
        *value = top.mul_add(1.0 - fy, bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Seeded source of augmented variants at a fixed output size
#[derive(Debug, Clone)]
pub struct Augmenter {
    config: AugmentationConfig,
    size: u32,
    rng: StdRng,
}

impl Augmenter {
    /// Create an augmenter producing `size` x `size` variants
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or `size` is zero
    pub fn new(config: AugmentationConfig, size: u32, seed: u64) -> Result<Self> {
        config.validate()?;
        if size == 0 {
            return Err(invalid_parameter("size", &size, &"must be positive"));
        }
        Ok(Self {
            config,
            size,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Augmenter with default ranges at the model input size
    ///
    /// # Errors
    ///
    /// Propagates [`Augmenter::new`] validation
    pub fn with_defaults(seed: u64) -> Result<Self> {
        Self::new(
            AugmentationConfig::default(),
            MODEL_INPUT_SIZE as u32,
            seed,
        )
    }

    /// Draw a transform and apply it to `image`
    pub fn variant(&mut self, image: &RgbImage) -> RgbImage {
        let transform = self.config.sample(&mut self.rng);
        transform.apply(image, self.size)
    }
}

/// Totals of a dataset augmentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    /// Source images read
    pub images: usize,
    /// Variants written
    pub variants: usize,
}

/// Write `variants` augmented copies of every image of each class under
/// `input_root` to `output_root/<Class>/<stem>_<ext>_aug<n>.jpg`
///
/// # Errors
///
/// Returns an error if a directory cannot be read or an image cannot be
/// loaded or saved
pub fn augment_dataset(
    input_root: &Path,
    output_root: &Path,
    classes: &[SoilLabel],
    variants: usize,
    augmenter: &mut Augmenter,
    progress: Option<&ProgressBar>,
) -> Result<AugmentSummary> {
    let mut summary = AugmentSummary::default();
    for &label in classes {
        let Some(input_dir) = class_directory(input_root, label)? else {
            tracing::warn!(
                root = %input_root.display(),
                class = %label,
                "No input directory for class"
            );
            continue;
        };
        let output_dir = output_root.join(label.name());

        let files = list_images(&input_dir)?;
        if let Some(bar) = progress {
            bar.inc_length(files.len() as u64);
        }

        for file in files {
            let image = load_rgb(&file)?;
            let stem = output_stem(&file);
            for n in 0..variants {
                let path = output_dir.join(format!("{stem}_aug{n}.{OUTPUT_EXTENSION}"));
                save_rgb(&augmenter.variant(&image), &path)?;
                summary.variants += 1;
            }
            summary.images += 1;
            if let Some(bar) = progress {
                bar.inc(1);
            }
        }
    }

    tracing::info!(
        images = summary.images,
        variants = summary.variants,
        output = %output_root.display(),
        "Dataset augmentation complete"
    );
    Ok(summary)
}
