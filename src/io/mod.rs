//! Command-line surface, configuration, errors and file I/O

/// Command-line parsing and subcommand execution
pub mod cli;
/// Constants and runtime defaults
pub mod configuration;
/// Error type shared by the whole crate
pub mod error;
/// Image loading, resizing and export
pub mod image;
/// Tracing subscriber setup
pub mod logging;
/// Progress bars for batch operations
pub mod progress;
/// Text and JSON rendering of results
pub mod report;
