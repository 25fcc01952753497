//! Spatial decomposition of images into classifier-sized tiles

/// Non-overlapping square tiling
pub mod tiles;

pub use tiles::{Tile, TileLayout, TileOffset, Tiler};
