//! Classification constants and runtime configuration defaults

// Percentage classification pass
/// Side length every source image is resized to before tiling
pub const CANONICAL_RESOLUTION: u32 = 1024;
/// Side length of the tiles fed to the classifier
pub const TILE_DIMENSION: u32 = 256;

// Dataset subdivision
/// Side length of the tiles cut when subdividing a training set
pub const DATASET_TILE_DIMENSION: u32 = 64;
/// File name fragment marking desktop metadata files to skip
pub const IGNORED_FILE_MARKER: &str = ".ini";
/// Extension of written tiles and augmented variants
pub const OUTPUT_EXTENSION: &str = "jpg";

// Network shape
/// Square input size of the network
pub const MODEL_INPUT_SIZE: usize = 256;
/// Number of convolution + pooling blocks
pub const MODEL_CONV_LAYERS: usize = 3;
/// Number of hidden fully connected layers
pub const MODEL_DENSE_LAYERS: usize = 2;
// Kept small so the network does not overfit the small soil dataset
/// Filter count of every convolution and width of every hidden dense layer
pub const MODEL_LAYER_SIZE: usize = 28;
/// Convolution kernel side length
pub const MODEL_KERNEL_SIZE: usize = 3;
/// Max pooling window side length
pub const MODEL_POOL_SIZE: usize = 2;
/// Model weights loaded when no path is given
pub const DEFAULT_MODEL_PATH: &str = "soil.mpk";
/// Extension of the weight record of a saved model
pub const MODEL_WEIGHTS_EXTENSION: &str = "mpk";
/// Extension of the configuration stored next to the weights
pub const MODEL_CONFIG_EXTENSION: &str = "json";

// Training
/// Passes over the training set
pub const TRAIN_EPOCHS: usize = 20;
/// Samples per optimizer step
pub const TRAIN_BATCH_SIZE: usize = 32;
/// Adam learning rate
pub const TRAIN_LEARNING_RATE: f64 = 1e-3;
/// Share of the samples held out for validation when no validation set is given
pub const TRAIN_VALIDATION_FRACTION: f64 = 0.2;
/// Extension of the scratch directory the learner writes metrics into
pub const TRAINING_ARTIFACT_EXTENSION: &str = "training";

// Augmentation defaults
/// Fraction of zoom in or out applied at random
pub const AUGMENT_ZOOM_RANGE: f64 = 0.2;
/// Maximum rotation in degrees
pub const AUGMENT_ROTATION_RANGE: f64 = 10.0;
/// Maximum shear angle in degrees
pub const AUGMENT_SHEAR_RANGE: f64 = 0.2;
/// Maximum vertical shift as a fraction of height
pub const AUGMENT_HEIGHT_SHIFT_RANGE: f64 = 0.1;
/// Maximum horizontal shift as a fraction of width
pub const AUGMENT_WIDTH_SHIFT_RANGE: f64 = 0.1;
/// Number of augmented variants written per source image
pub const DEFAULT_AUGMENT_VARIANTS: usize = 4;

// Parallelism
/// Tile count from which classification fans out over the thread pool
pub const PARALLEL_TILE_THRESHOLD: usize = 4;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;

// Default values for configurable parameters
/// Fixed seed for reproducible augmentation and model initialization
pub const DEFAULT_SEED: u64 = 42;

// Logging
/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Log filter used with `--quiet`
pub const QUIET_LOG_FILTER: &str = "warn";

/// Labels counted by the percentage pass, in report order
pub const REPORTED_LABELS: [crate::model::SoilLabel; 3] = [
    crate::model::SoilLabel::Gravel,
    crate::model::SoilLabel::Sand,
    crate::model::SoilLabel::Silt,
];
