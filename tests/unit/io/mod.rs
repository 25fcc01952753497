mod configuration;
mod error;
mod progress;
