//! Soil labels, the classifier seam and the convolutional network behind it

/// Classifier trait and per-label predictions
pub mod classifier;
/// Soil type labels
pub mod label;
/// Convolutional network and model artifact handling
pub mod network;
/// Supervised training of the network
pub mod training;

pub use classifier::{Classifier, Prediction};
pub use label::SoilLabel;
pub use network::{ConvNet, ConvNetConfig, InferenceBackend, SoilNet};
pub use training::{SoilDataset, TrainingConfig, train_network};
