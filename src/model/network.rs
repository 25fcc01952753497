//! Small convolutional soil classifier on the burn ndarray backend
//!
//! Architecture: `conv_layers` blocks of (3x3 valid convolution, ReLU,
//! 2x2 max pool), flatten, `dense_layers` blocks of (linear, ReLU), then a
//! linear output over the model's labels. Softmax turns the output into
//! confidences at prediction time.
//!
//! A saved model is two files side by side: the burn record holding the
//! weights (`soil.mpk`) and the [`ConvNetConfig`] as JSON (`soil.json`).

use crate::io::configuration::{
    MODEL_CONFIG_EXTENSION, MODEL_CONV_LAYERS, MODEL_DENSE_LAYERS, MODEL_INPUT_SIZE,
    MODEL_KERNEL_SIZE, MODEL_LAYER_SIZE, MODEL_POOL_SIZE, MODEL_WEIGHTS_EXTENSION,
    REPORTED_LABELS,
};
use crate::io::error::{SoilError, computation_error, file_system_error, invalid_parameter};
use crate::model::SoilLabel;
use crate::model::classifier::{Classifier, Prediction};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::loss::CrossEntropyLossConfig;
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::record::{DefaultFileRecorder, FullPrecisionSettings};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use burn::train::ClassificationOutput;
use burn_ndarray::{NdArray, NdArrayDevice};
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Backend models are loaded on for inference
pub type InferenceBackend = NdArray<f32>;

// Weights are stored as f32
type ModelRecorder = DefaultFileRecorder<FullPrecisionSettings>;

/// Shape of a [`SoilNet`]
#[derive(Config, Debug, PartialEq, Eq)]
pub struct ConvNetConfig {
    /// Square input side length in pixels
    #[config(default = "MODEL_INPUT_SIZE")]
    pub input_size: usize,
    /// Number of convolution + pooling blocks
    #[config(default = "MODEL_CONV_LAYERS")]
    pub conv_layers: usize,
    /// Number of hidden dense layers
    #[config(default = "MODEL_DENSE_LAYERS")]
    pub dense_layers: usize,
    /// Filters per convolution and width of each hidden dense layer
    #[config(default = "MODEL_LAYER_SIZE")]
    pub layer_size: usize,
    /// Convolution kernel side length
    #[config(default = "MODEL_KERNEL_SIZE")]
    pub kernel_size: usize,
    /// Pooling window side length
    #[config(default = "MODEL_POOL_SIZE")]
    pub pool_size: usize,
    /// Output labels, in output-unit order
    #[config(default = "REPORTED_LABELS.to_vec()")]
    pub labels: Vec<SoilLabel>,
}

impl Default for ConvNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvNetConfig {
    /// Check that the configuration describes a buildable network
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if a size is zero, the labels
    /// are empty or repeated, or the input shrinks to nothing before the
    /// dense layers
    pub fn validate(&self) -> crate::io::error::Result<()> {
        if self.layer_size == 0 {
            return Err(invalid_parameter(
                "layer_size",
                &self.layer_size,
                &"must be positive",
            ));
        }
        if self.kernel_size == 0 {
            return Err(invalid_parameter(
                "kernel_size",
                &self.kernel_size,
                &"must be positive",
            ));
        }
        if self.pool_size == 0 {
            return Err(invalid_parameter(
                "pool_size",
                &self.pool_size,
                &"must be positive",
            ));
        }
        if self.labels.is_empty() {
            return Err(invalid_parameter("labels", &"[]", &"at least one label is required"));
        }
        let unique: HashSet<_> = self.labels.iter().collect();
        if unique.len() != self.labels.len() {
            return Err(invalid_parameter(
                "labels",
                &format!("{:?}", self.labels),
                &"labels must be unique",
            ));
        }
        self.feature_map_size().map(|_| ())
    }

    /// Side length of the last feature map before flattening
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the input is too small for
    /// the configured number of convolution blocks
    pub fn feature_map_size(&self) -> crate::io::error::Result<usize> {
        let mut size = self.input_size;
        for _ in 0..self.conv_layers {
            // Valid convolution shrinks by kernel - 1, pooling floors
            size = size
                .checked_sub(self.kernel_size.saturating_sub(1))
                .filter(|&s| s > 0)
                .map(|s| s / self.pool_size.max(1))
                .filter(|&s| s > 0)
                .ok_or_else(|| {
                    invalid_parameter(
                        "input_size",
                        &self.input_size,
                        &format!("too small for {} convolution blocks", self.conv_layers),
                    )
                })?;
        }
        Ok(size)
    }

    /// Length of the flattened feature vector
    ///
    /// # Errors
    ///
    /// Propagates [`ConvNetConfig::feature_map_size`] failures
    pub fn flattened_len(&self) -> crate::io::error::Result<usize> {
        let size = self.feature_map_size()?;
        Ok(self.feature_channels() * size * size)
    }

    const fn feature_channels(&self) -> usize {
        if self.conv_layers == 0 {
            3
        } else {
            self.layer_size
        }
    }

    /// Build an untrained network on `device` with burn's default initializers
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::io::error::Result<SoilNet<B>> {
        self.validate()?;
        let kernel = [self.kernel_size, self.kernel_size];
        let window = [self.pool_size, self.pool_size];

        let mut convs = Vec::with_capacity(self.conv_layers);
        let mut channels = 3;
        for _ in 0..self.conv_layers {
            convs.push(Conv2dConfig::new([channels, self.layer_size], kernel).init(device));
            channels = self.layer_size;
        }

        let mut hidden = Vec::with_capacity(self.dense_layers);
        let mut width = self.flattened_len()?;
        for _ in 0..self.dense_layers {
            hidden.push(LinearConfig::new(width, self.layer_size).init(device));
            width = self.layer_size;
        }

        Ok(SoilNet {
            convs,
            pool: MaxPool2dConfig::new(window).with_strides(window).init(),
            hidden,
            output: LinearConfig::new(width, self.labels.len()).init(device),
            activation: Relu::new(),
        })
    }
}

/// The burn module behind a [`ConvNet`]
#[derive(Module, Debug)]
pub struct SoilNet<B: Backend> {
    convs: Vec<Conv2d<B>>,
    pool: MaxPool2d,
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> SoilNet<B> {
    /// Raw class scores for a `[batch, 3, size, size]` image tensor
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut features = images;
        for conv in &self.convs {
            features = self
                .pool
                .forward(self.activation.forward(conv.forward(features)));
        }

        let [batch_size, channels, height, width] = features.dims();
        let mut hidden = features.reshape([batch_size, channels * height * width]);
        for layer in &self.hidden {
            hidden = self.activation.forward(layer.forward(hidden));
        }

        self.output.forward(hidden)
    }

    /// Forward pass with categorical cross-entropy against `targets`
    pub fn forward_classification(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput::new(loss, output, targets)
    }
}

/// Paths of the weight record and the configuration of the model at `path`
pub fn artifact_paths(path: &Path) -> (PathBuf, PathBuf) {
    (
        path.with_extension(MODEL_WEIGHTS_EXTENSION),
        path.with_extension(MODEL_CONFIG_EXTENSION),
    )
}

/// Channel-first pixel values of `image` resized to `size` x `size`, scaled to [0, 1]
pub fn pixels_chw(image: &RgbImage, size: usize) -> Vec<f32> {
    let resized;
    let source = if image.width() as usize == size && image.height() as usize == size {
        image
    } else {
        resized = imageops::resize(image, size as u32, size as u32, FilterType::Triangle);
        &resized
    };

    let plane = size * size;
    let mut values = vec![0.0; 3 * plane];
    for (x, y, pixel) in source.enumerate_pixels() {
        let offset = y as usize * size + x as usize;
        for (channel, &value) in pixel.0.iter().enumerate() {
            if let Some(slot) = values.get_mut(channel * plane + offset) {
                *slot = f32::from(value) / 255.0;
            }
        }
    }
    values
}

/// Convolutional classifier loaded once and shared read-only across tiles
///
/// The module sits behind a lock; each prediction clones it out, so tiles
/// are still classified concurrently.
#[derive(Debug)]
pub struct ConvNet {
    config: ConvNetConfig,
    network: Mutex<SoilNet<InferenceBackend>>,
}

impl ConvNet {
    /// Wrap a module, checking its tensors against `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a tensor shape
    /// disagrees with it
    pub fn new(config: ConvNetConfig, network: SoilNet<InferenceBackend>) -> crate::io::error::Result<Self> {
        config.validate()?;
        check_shapes(&config, &network)?;
        Ok(Self {
            config,
            network: Mutex::new(network),
        })
    }

    /// Freshly initialized, untrained network
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn untrained(config: ConvNetConfig) -> crate::io::error::Result<Self> {
        let network = config.init::<InferenceBackend>(&NdArrayDevice::default())?;
        Self::new(config, network)
    }

    /// Load the configuration and weights saved at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be read
    /// - The configuration or the weight record cannot be decoded
    /// - A tensor shape disagrees with the stored configuration
    pub fn load<P: AsRef<Path>>(path: P) -> crate::io::error::Result<Self> {
        let (weights_path, config_path) = artifact_paths(path.as_ref());

        let bytes = std::fs::read(&config_path)
            .map_err(|e| file_system_error(&config_path, "read model configuration", e))?;
        let config = ConvNetConfig::load_binary(&bytes).map_err(|e| SoilError::ModelLoad {
            path: config_path.clone(),
            reason: format!("{e:?}"),
        })?;

        let device = NdArrayDevice::default();
        let network = config
            .init::<InferenceBackend>(&device)?
            .load_file(&weights_path, &ModelRecorder::new(), &device)
            .map_err(|e| SoilError::ModelLoad {
                path: weights_path.clone(),
                reason: format!("{e:?}"),
            })?;

        let model = Self::new(config, network)?;
        tracing::debug!(
            path = %weights_path.display(),
            labels = ?model.config.labels,
            "Loaded model"
        );
        Ok(model)
    }

    /// Write the weight record and configuration, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or configuration cannot be written,
    /// or the recorder fails to export the weights
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::io::error::Result<()> {
        let (weights_path, config_path) = artifact_paths(path.as_ref());
        if let Some(parent) = weights_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| file_system_error(parent, "create directory", e))?;
        }

        self.config
            .save(&config_path)
            .map_err(|e| file_system_error(&config_path, "write model configuration", e))?;
        self.snapshot()?
            .save_file(&weights_path, &ModelRecorder::new())
            .map_err(|e| SoilError::ModelExport {
                path: weights_path.clone(),
                reason: format!("{e:?}"),
            })
    }

    /// Shape this network was built with
    pub const fn config(&self) -> &ConvNetConfig {
        &self.config
    }

    /// Output labels in output-unit order
    pub fn labels(&self) -> &[SoilLabel] {
        &self.config.labels
    }

    /// Total number of trainable parameters
    ///
    /// # Errors
    ///
    /// Returns a computation error if the module lock is poisoned
    pub fn num_params(&self) -> crate::io::error::Result<usize> {
        Ok(self.snapshot()?.num_params())
    }

    /// A `[1, 3, size, size]` input tensor for `image`
    ///
    /// Images of a different size are resized to the model input first.
    pub fn tensor_from_image(&self, image: &RgbImage) -> Tensor<InferenceBackend, 4> {
        let size = self.config.input_size;
        Tensor::<InferenceBackend, 1>::from_floats(
            pixels_chw(image, size).as_slice(),
            &NdArrayDevice::default(),
        )
        .reshape([1, 3, size, size])
    }

    /// Class probabilities for `image`, in label order
    ///
    /// # Errors
    ///
    /// Returns a computation error if the module lock is poisoned or the
    /// output cannot be read back
    pub fn probabilities(&self, image: &RgbImage) -> crate::io::error::Result<Vec<f32>> {
        let input = self.tensor_from_image(image);
        softmax(self.snapshot()?.forward(input), 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| computation_error("read probabilities", &format!("{e:?}")))
    }

    fn snapshot(&self) -> crate::io::error::Result<SoilNet<InferenceBackend>> {
        self.network
            .lock()
            .map(|network| network.clone())
            .map_err(|e| computation_error("lock model", &e))
    }
}

impl Classifier for ConvNet {
    fn predict(&self, tile: &RgbImage) -> crate::io::error::Result<Prediction> {
        let probabilities = self.probabilities(tile)?;
        Ok(Prediction::new(
            self.config
                .labels
                .iter()
                .copied()
                .zip(probabilities)
                .collect(),
        ))
    }
}

fn check_shapes<B: Backend>(config: &ConvNetConfig, network: &SoilNet<B>) -> crate::io::error::Result<()> {
    expect_count("convs", network.convs.len(), config.conv_layers)?;
    expect_count("hidden", network.hidden.len(), config.dense_layers)?;

    let kernel = config.kernel_size;
    let mut channels = 3;
    for (i, conv) in network.convs.iter().enumerate() {
        expect_shape(
            &format!("convs[{i}].weight"),
            &conv.weight.val().dims(),
            &[config.layer_size, channels, kernel, kernel],
        )?;
        channels = config.layer_size;
    }

    let mut width = config.flattened_len()?;
    for (i, layer) in network.hidden.iter().enumerate() {
        expect_shape(
            &format!("hidden[{i}].weight"),
            &layer.weight.val().dims(),
            &[width, config.layer_size],
        )?;
        width = config.layer_size;
    }

    expect_shape(
        "output.weight",
        &network.output.weight.val().dims(),
        &[width, config.labels.len()],
    )
}

fn expect_count(layer: &str, found: usize, expected: usize) -> crate::io::error::Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(SoilError::ModelFormat {
            layer: layer.to_string(),
            expected: vec![expected],
            found: vec![found],
        })
    }
}

fn expect_shape(layer: &str, found: &[usize], expected: &[usize]) -> crate::io::error::Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(SoilError::ModelFormat {
            layer: layer.to_string(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}
