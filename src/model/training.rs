//! Supervised training of the soil network with burn's learner
//!
//! Items are loaded lazily from their paths. Training items pass through a
//! fresh random augmentation every time they are batched; validation items
//! are only resized. The optimizer is Adam on categorical cross-entropy.

use crate::dataset::augment::{AugmentationConfig, Augmenter};
use crate::dataset::samples::LabeledSample;
use crate::io::configuration::{
    DEFAULT_SEED, TRAIN_BATCH_SIZE, TRAIN_EPOCHS, TRAIN_LEARNING_RATE, TRAIN_VALIDATION_FRACTION,
};
use crate::io::error::{Result, file_system_error, invalid_parameter};
use crate::io::image::load_rgb;
use crate::model::SoilLabel;
use crate::model::network::{ConvNet, ConvNetConfig, InferenceBackend, SoilNet, pixels_chw};
use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::optim::AdamConfig;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Int, Tensor};
use burn::train::metric::{AccuracyMetric, LossMetric};
use burn::train::{
    ClassificationOutput, LearnerBuilder, LearningStrategy, TrainOutput, TrainStep, ValidStep,
};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArrayDevice;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Backend the learner differentiates through
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Hyperparameters of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Passes over the training set
    pub epochs: usize,
    /// Samples per optimizer step
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Share held out for validation by [`SoilDataset::split`]
    pub validation_fraction: f64,
    /// Seed for the hold-out split, batch order and augmentation
    pub seed: u64,
    /// Augment training items as they are batched
    pub augment: bool,
    /// Scratch directory for the learner's metric logs, removed afterwards
    pub artifact_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: TRAIN_EPOCHS,
            batch_size: TRAIN_BATCH_SIZE,
            learning_rate: TRAIN_LEARNING_RATE,
            validation_fraction: TRAIN_VALIDATION_FRACTION,
            seed: DEFAULT_SEED,
            augment: true,
            artifact_dir: std::env::temp_dir().join("soilmix_training"),
        }
    }
}

impl TrainingConfig {
    /// Reject hyperparameters the learner cannot run with
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error naming the first bad value
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(invalid_parameter("epochs", &self.epochs, &"must be positive"));
        }
        if self.batch_size == 0 {
            return Err(invalid_parameter(
                "batch_size",
                &self.batch_size,
                &"must be positive",
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(invalid_parameter(
                "learning_rate",
                &self.learning_rate,
                &"must be finite and positive",
            ));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(invalid_parameter(
                "validation_fraction",
                &self.validation_fraction,
                &"must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// One training item: an image path and its output-unit index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoilItem {
    /// Image file
    pub path: PathBuf,
    /// Index of the ground-truth label among the model's labels
    pub target: usize,
}

/// Labeled samples restricted to the labels a model outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoilDataset {
    items: Vec<SoilItem>,
}

impl SoilDataset {
    /// Keep the samples whose label is one of `labels`
    pub fn new(samples: &[LabeledSample], labels: &[SoilLabel]) -> Self {
        let items: Vec<SoilItem> = samples
            .iter()
            .filter_map(|sample| {
                labels
                    .iter()
                    .position(|&label| label == sample.label)
                    .map(|target| SoilItem {
                        path: sample.path.clone(),
                        target,
                    })
            })
            .collect();

        let skipped = samples.len() - items.len();
        if skipped > 0 {
            tracing::warn!(skipped, "Skipping samples with labels the model does not output");
        }
        Self { items }
    }

    /// Items in dataset order
    pub fn items(&self) -> &[SoilItem] {
        &self.items
    }

    /// Shuffle with `seed` and hold out `fraction` of the items for validation
    ///
    /// With two or more items both halves keep at least one.
    #[must_use]
    pub fn split(mut self, fraction: f64, seed: u64) -> (Self, Self) {
        self.items.shuffle(&mut StdRng::seed_from_u64(seed));
        let len = self.items.len();
        let held_out = ((len as f64) * fraction).round() as usize;
        let held_out = held_out.max(1).min(len.saturating_sub(1));
        let valid = self.items.split_off(len - held_out);
        (self, Self { items: valid })
    }
}

impl Dataset<SoilItem> for SoilDataset {
    fn get(&self, index: usize) -> Option<SoilItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Image and target tensors of one batch
#[derive(Clone, Debug)]
pub struct SoilBatch<B: Backend> {
    /// `[batch, 3, size, size]` pixels scaled to [0, 1]
    pub images: Tensor<B, 4>,
    /// Output-unit index of every image
    pub targets: Tensor<B, 1, Int>,
}

/// Loads, optionally augments and stacks items into [`SoilBatch`]es
#[derive(Clone)]
pub struct SoilBatcher<B: Backend> {
    device: B::Device,
    size: usize,
    augmenter: Option<Arc<Mutex<Augmenter>>>,
}

impl<B: Backend> SoilBatcher<B> {
    /// Batcher resizing every image to `size` x `size`
    pub const fn new(device: B::Device, size: usize) -> Self {
        Self {
            device,
            size,
            augmenter: None,
        }
    }

    /// Draw a random variant of every image from `augmenter`
    #[must_use]
    pub fn with_augmenter(mut self, augmenter: Augmenter) -> Self {
        self.augmenter = Some(Arc::new(Mutex::new(augmenter)));
        self
    }

    fn pixels(&self, item: &SoilItem) -> Vec<f32> {
        let image = match load_rgb(&item.path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "Batching a blank image in place of an unreadable sample");
                return vec![0.0; 3 * self.size * self.size];
            }
        };
        match &self.augmenter {
            Some(augmenter) => {
                let variant = augmenter
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .variant(&image);
                pixels_chw(&variant, self.size)
            }
            None => pixels_chw(&image, self.size),
        }
    }
}

impl<B: Backend> Batcher<B, SoilItem, SoilBatch<B>> for SoilBatcher<B> {
    fn batch(&self, items: Vec<SoilItem>, _device: &B::Device) -> SoilBatch<B> {
        let batch_size = items.len();
        let mut pixels = Vec::with_capacity(batch_size * 3 * self.size * self.size);
        let mut targets = Vec::with_capacity(batch_size);
        for item in &items {
            pixels.extend(self.pixels(item));
            targets.push(item.target as i64);
        }

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, 3, self.size, self.size]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        SoilBatch { images, targets }
    }
}

impl<B: AutodiffBackend> TrainStep<SoilBatch<B>, ClassificationOutput<B>> for SoilNet<B> {
    fn step(&self, batch: SoilBatch<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward_classification(batch.images, batch.targets);
        let grads = item.loss.backward();
        TrainOutput::new(self, grads, item)
    }
}

impl<B: Backend> ValidStep<SoilBatch<B>, ClassificationOutput<B>> for SoilNet<B> {
    fn step(&self, batch: SoilBatch<B>) -> ClassificationOutput<B> {
        self.forward_classification(batch.images, batch.targets)
    }
}

/// Train a fresh network shaped by `network` on `train`, reporting
/// accuracy and loss on `valid` after every epoch
///
/// # Errors
///
/// Returns an error if:
/// - Either configuration is invalid
/// - The training set is empty
/// - The artifact directory cannot be created
/// - The trained module does not fit `network`
pub fn train_network(
    network: &ConvNetConfig,
    config: &TrainingConfig,
    train: SoilDataset,
    valid: SoilDataset,
) -> Result<ConvNet> {
    network.validate()?;
    config.validate()?;
    if train.is_empty() {
        return Err(invalid_parameter(
            "samples",
            &0,
            &"no training samples carry a label the model outputs",
        ));
    }
    let size = network.input_size;

    std::fs::create_dir_all(&config.artifact_dir)
        .map_err(|e| file_system_error(&config.artifact_dir, "create directory", e))?;

    let mut batcher_train = SoilBatcher::<TrainingBackend>::new(NdArrayDevice::default(), size);
    if config.augment {
        let augmenter = Augmenter::new(AugmentationConfig::default(), size as u32, config.seed)?;
        batcher_train = batcher_train.with_augmenter(augmenter);
    }
    let batcher_valid = SoilBatcher::<InferenceBackend>::new(NdArrayDevice::default(), size);

    tracing::info!(
        train = train.len(),
        valid = valid.len(),
        epochs = config.epochs,
        batch_size = config.batch_size,
        learning_rate = config.learning_rate,
        augment = config.augment,
        "Training model"
    );

    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(0)
        .build(train);
    let dataloader_valid = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.batch_size)
        .num_workers(0)
        .build(valid);

    let model = network.init::<TrainingBackend>(&NdArrayDevice::default())?;
    let artifact_dir = config.artifact_dir.to_string_lossy().to_string();
    let learner = LearnerBuilder::new(&artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .learning_strategy(LearningStrategy::SingleDevice(NdArrayDevice::default()))
        .num_epochs(config.epochs)
        .summary()
        .build(model, AdamConfig::new().init(), config.learning_rate);

    let trained = learner.fit(dataloader_train, dataloader_valid);

    if let Err(e) = std::fs::remove_dir_all(&config.artifact_dir) {
        tracing::warn!(
            path = %config.artifact_dir.display(),
            error = %e,
            "Could not remove training artifacts"
        );
    }

    let model = ConvNet::new(network.clone(), trained.model)?;
    tracing::info!(epochs = config.epochs, "Training complete");
    Ok(model)
}
