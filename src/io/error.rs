//! Error types for image loading, model handling and classification passes

use std::fmt;
use std::path::PathBuf;

/// Main error type for all soil classification operations
#[derive(Debug)]
pub enum SoilError {
    /// Failed to load a source image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save an image (tile or augmented variant) to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Model artifact could not be read or decoded
    ModelLoad {
        /// Path to the model artifact
        path: PathBuf,
        /// Description of the decoding failure
        reason: String,
    },

    /// Model weights or configuration could not be written
    ModelExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Description of the encoding or recorder failure
        reason: String,
    },

    /// Model artifact decoded but its tensors disagree with its configuration
    ModelFormat {
        /// Name of the offending layer or tensor
        layer: String,
        /// Shape the configuration requires
        expected: Vec<usize>,
        /// Shape found in the artifact
        found: Vec<usize>,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Text could not be parsed as a soil label
    UnknownLabel {
        /// The unrecognized text
        text: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced an invalid result
    ///
    /// Raised when a classification pass counts zero tiles, so that
    /// proportions would divide by zero.
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for SoilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::ModelLoad { path, reason } => {
                write!(f, "Failed to load model '{}': {reason}", path.display())
            }
            Self::ModelExport { path, reason } => {
                write!(f, "Failed to export model to '{}': {reason}", path.display())
            }
            Self::ModelFormat {
                layer,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Model tensor '{layer}' has shape {found:?}, expected {expected:?}"
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::UnknownLabel { text } => {
                write!(f, "Unknown soil label '{text}'")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for SoilError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for soil classification results
pub type Result<T> = std::result::Result<T, SoilError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SoilError {
    SoilError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> SoilError {
    SoilError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Wrap an I/O failure with the path and operation it happened on
pub fn file_system_error(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> SoilError {
    SoilError::FileSystem {
        path: path.into(),
        operation,
        source,
    }
}
