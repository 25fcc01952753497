//! Command-line interface for classification, evaluation and dataset preparation

use crate::analysis::evaluation::evaluate_all;
use crate::analysis::pipeline::{PassConfig, classify_image};
use crate::dataset::augment::{AugmentationConfig, Augmenter, augment_dataset};
use crate::dataset::samples::collect_samples;
use crate::dataset::split::{SplitOptions, split_dataset};
use crate::io::configuration::{
    CANONICAL_RESOLUTION, DATASET_TILE_DIMENSION, DEFAULT_AUGMENT_VARIANTS, DEFAULT_MODEL_PATH,
    DEFAULT_SEED, MODEL_INPUT_SIZE, PARALLEL_TILE_THRESHOLD, REPORTED_LABELS, TILE_DIMENSION,
    TRAIN_BATCH_SIZE, TRAIN_EPOCHS, TRAIN_LEARNING_RATE, TRAINING_ARTIFACT_EXTENSION,
};
use crate::io::error::{Result, file_system_error, invalid_parameter};
use crate::io::image::has_image_extension;
use crate::io::progress::ProgressManager;
use crate::io::report::{format_evaluation, format_pass, format_summary, pass_to_json};
use crate::model::{ConvNet, ConvNetConfig, SoilDataset, TrainingConfig, train_network};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "soilmix")]
#[command(
    author,
    version,
    about = "Estimate soil type mixtures by classifying photo tiles"
)]
/// Command-line arguments for the soil mixture tool
pub struct Cli {
    /// Suppress progress bars and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Subcommands of the soil mixture tool
#[derive(Subcommand)]
pub enum Command {
    /// Estimate soil type percentages of a photo or a directory of photos
    Classify(ClassifyArgs),
    /// Check whole-image predictions against a class-per-directory dataset
    Evaluate(EvaluateArgs),
    /// Cut a class-per-directory dataset into small training tiles
    Split(SplitArgs),
    /// Write randomly augmented copies of a class-per-directory dataset
    Augment(AugmentArgs),
    /// Train a model on a class-per-directory dataset
    Train(TrainArgs),
    /// Write an untrained model with freshly initialized weights
    InitModel(InitModelArgs),
}

/// Arguments of `classify`
#[derive(Args)]
pub struct ClassifyArgs {
    /// Image file or directory of images
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Model artifact to classify tiles with
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Side length images are resized to before tiling
    #[arg(short, long, default_value_t = CANONICAL_RESOLUTION)]
    pub resolution: u32,

    /// Tile side length
    #[arg(short, long, default_value_t = TILE_DIMENSION)]
    pub tile: u32,

    /// Print one JSON record per image instead of the text summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `evaluate`
#[derive(Args)]
pub struct EvaluateArgs {
    /// Dataset root holding one directory per soil type
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Model artifact to evaluate
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Print the per-label confidences of every sample
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments of `split`
#[derive(Args)]
pub struct SplitArgs {
    /// Dataset root holding one directory per soil type
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Root the tiles are written under
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Tile side length
    #[arg(short, long, default_value_t = DATASET_TILE_DIMENSION)]
    pub tile: u32,

    /// Write into output class directories that already exist
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments of `augment`
#[derive(Args)]
pub struct AugmentArgs {
    /// Dataset root holding one directory per soil type
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Root the variants are written under
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Variants written per source image
    #[arg(short = 'n', long, default_value_t = DEFAULT_AUGMENT_VARIANTS)]
    pub variants: usize,

    /// Side length of the written variants
    #[arg(long, default_value_t = MODEL_INPUT_SIZE)]
    pub size: usize,

    /// Random seed for reproducible augmentation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Disable horizontal mirroring
    #[arg(long)]
    pub no_flip: bool,
}

/// Arguments of `train`
#[derive(Args)]
pub struct TrainArgs {
    /// Dataset root holding one directory per soil type
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Separate validation dataset; without it part of ROOT is held out
    #[arg(long, value_name = "ROOT")]
    pub valid: Option<PathBuf>,

    /// Path of the model to write
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub output: PathBuf,

    /// Passes over the training set
    #[arg(short, long, default_value_t = TRAIN_EPOCHS)]
    pub epochs: usize,

    /// Samples per optimizer step
    #[arg(short, long, default_value_t = TRAIN_BATCH_SIZE)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = TRAIN_LEARNING_RATE)]
    pub learning_rate: f64,

    /// Seed for the hold-out split, batch order and augmentation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Square input size of the network
    #[arg(long, default_value_t = MODEL_INPUT_SIZE)]
    pub input_size: usize,

    /// Train on the images as they are, without random augmentation
    #[arg(long)]
    pub no_augment: bool,
}

/// Arguments of `init-model`
#[derive(Args)]
pub struct InitModelArgs {
    /// Path of the model to write
    #[arg(value_name = "OUTPUT", default_value = DEFAULT_MODEL_PATH)]
    pub output: PathBuf,

    /// Square input size of the network
    #[arg(long, default_value_t = MODEL_INPUT_SIZE)]
    pub input_size: usize,
}

/// Runs the parsed command with progress tracking
pub struct CommandRunner {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl CommandRunner {
    /// Create a runner for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Run the selected subcommand, writing results to `out`
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the subcommand or by writing its output
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Command::Classify(args) => {
                let files = collect_images(&args.target)?;
                let model = ConvNet::load(&args.model)?;
                let config = PassConfig {
                    resolution: args.resolution,
                    tile_dimension: args.tile,
                    parallel_threshold: PARALLEL_TILE_THRESHOLD,
                };
                config.validate()?;
                if files.is_empty() {
                    tracing::warn!(path = %args.target.display(), "No images to classify");
                    return Ok(());
                }
                Self::classify(
                    self.progress_manager.as_mut(),
                    &files,
                    &model,
                    &config,
                    args.json,
                    out,
                )
            }
            Command::Evaluate(args) => {
                let model = ConvNet::load(&args.model)?;
                let samples = collect_samples(&args.root)?;
                let bar = self
                    .progress_manager
                    .as_ref()
                    .map(|pm| pm.start_file(&args.root, "samples"));
                let (evaluations, summary) = evaluate_all(&model, &samples, bar.as_ref())?;
                if let (Some(pm), Some(bar)) = (&self.progress_manager, &bar) {
                    pm.complete_file(bar);
                    pm.finish();
                }
                if args.verbose {
                    for evaluation in &evaluations {
                        write_output(out, &format_evaluation(evaluation))?;
                    }
                }
                write_output(out, &format_summary(&summary))
            }
            Command::Split(args) => {
                let options = SplitOptions {
                    dimension: args.tile,
                    classes: REPORTED_LABELS.to_vec(),
                    overwrite: args.force,
                };
                let bar = self
                    .progress_manager
                    .as_ref()
                    .map(|pm| pm.start_file(&args.input, "images"));
                let summary = split_dataset(&args.input, &args.output, &options, bar.as_ref())?;
                if let (Some(pm), Some(bar)) = (&self.progress_manager, &bar) {
                    pm.complete_file(bar);
                    pm.finish();
                }
                write_output(
                    out,
                    &format!(
                        "Wrote {} tiles from {} images to {}\n",
                        summary.tiles,
                        summary.images,
                        args.output.display()
                    ),
                )
            }
            Command::Augment(args) => {
                let config = AugmentationConfig {
                    horizontal_flip: !args.no_flip,
                    ..AugmentationConfig::default()
                };
                let size = u32::try_from(args.size)
                    .map_err(|e| invalid_parameter("size", &args.size, &e))?;
                let mut augmenter = Augmenter::new(config, size, args.seed)?;
                let bar = self
                    .progress_manager
                    .as_ref()
                    .map(|pm| pm.start_file(&args.input, "images"));
                let summary = augment_dataset(
                    &args.input,
                    &args.output,
                    &REPORTED_LABELS,
                    args.variants,
                    &mut augmenter,
                    bar.as_ref(),
                )?;
                if let (Some(pm), Some(bar)) = (&self.progress_manager, &bar) {
                    pm.complete_file(bar);
                    pm.finish();
                }
                write_output(
                    out,
                    &format!(
                        "Wrote {} variants of {} images to {}\n",
                        summary.variants,
                        summary.images,
                        args.output.display()
                    ),
                )
            }
            Command::Train(args) => Self::train(args, out),
            Command::InitModel(args) => {
                let config = ConvNetConfig {
                    input_size: args.input_size,
                    ..ConvNetConfig::default()
                };
                let model = ConvNet::untrained(config)?;
                model.save(&args.output)?;
                tracing::info!(
                    path = %args.output.display(),
                    "Wrote untrained model"
                );
                write_output(
                    out,
                    &format!("Wrote model to {}\n", args.output.display()),
                )
            }
        }
    }

    fn train<W: Write>(args: &TrainArgs, out: &mut W) -> Result<()> {
        let network = ConvNetConfig {
            input_size: args.input_size,
            ..ConvNetConfig::default()
        };
        let config = TrainingConfig {
            epochs: args.epochs,
            batch_size: args.batch_size,
            learning_rate: args.learning_rate,
            seed: args.seed,
            augment: !args.no_augment,
            artifact_dir: args.output.with_extension(TRAINING_ARTIFACT_EXTENSION),
            ..TrainingConfig::default()
        };
        config.validate()?;

        let dataset = SoilDataset::new(&collect_samples(&args.root)?, &network.labels);
        let (train, valid) = match &args.valid {
            Some(valid_root) => (
                dataset,
                SoilDataset::new(&collect_samples(valid_root)?, &network.labels),
            ),
            None => dataset.split(config.validation_fraction, config.seed),
        };
        let (train_len, valid_len) = (train.items().len(), valid.items().len());

        let model = train_network(&network, &config, train, valid)?;
        model.save(&args.output)?;
        write_output(
            out,
            &format!(
                "Trained on {train_len} samples ({valid_len} validation) for {} epochs; wrote model to {}\n",
                config.epochs,
                args.output.display()
            ),
        )
    }

    fn classify<W: Write>(
        mut progress_manager: Option<&mut ProgressManager>,
        files: &[PathBuf],
        model: &ConvNet,
        config: &PassConfig,
        json: bool,
        out: &mut W,
    ) -> Result<()> {
        if let Some(pm) = progress_manager.as_deref_mut() {
            pm.initialize(files.len());
        }

        for file in files {
            let bar = progress_manager
                .as_deref()
                .map(|pm| pm.start_file(file, "tiles"));
            let pass = classify_image(file, model, config, bar.as_ref())?;
            if let (Some(pm), Some(bar)) = (progress_manager.as_deref(), &bar) {
                pm.complete_file(bar);
            }

            let text = if json {
                let mut line = pass_to_json(file, &pass)?;
                line.push('\n');
                line
            } else {
                format_pass(file, &pass)
            };
            write_output(out, &text)?;
        }

        if let Some(pm) = progress_manager.as_deref() {
            pm.finish();
        }
        Ok(())
    }
}

/// Image files named by `target`: the file itself, or the images directly inside a directory
///
/// # Errors
///
/// Returns an error if the target is neither an image file nor a directory,
/// or the directory cannot be listed
pub fn collect_images(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        if has_image_extension(target) {
            Ok(vec![target.to_path_buf()])
        } else {
            Err(invalid_parameter(
                "target",
                &target.display(),
                &"file is not a supported image",
            ))
        }
    } else if target.is_dir() {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(target)
            .map_err(|e| file_system_error(target, "read directory", e))?;
        for entry in entries {
            let path = entry
                .map_err(|e| file_system_error(target, "read directory entry", e))?
                .path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    } else {
        Err(invalid_parameter(
            "target",
            &target.display(),
            &"must be an image file or directory",
        ))
    }
}

fn write_output<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| file_system_error("<output>", "write output", e))
}
