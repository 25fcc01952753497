//! Non-overlapping square tiling of RGB images
//!
//! Scans top-to-bottom, left-to-right in steps of the tile dimension and
//! keeps only candidates that fit entirely inside the image. Right and
//! bottom margins narrower than one tile are left unused; an image
//! smaller than one tile yields no tiles at all.

use crate::io::error::{Result, invalid_parameter};
use image::RgbImage;
use image::imageops;
use std::ops::Range;

/// Top-left pixel position of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileOffset {
    /// Pixel row of the top edge
    pub row: u32,
    /// Pixel column of the left edge
    pub col: u32,
}

/// Tile grid geometry for an image of a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    width: u32,
    height: u32,
    dimension: u32,
}

impl TileLayout {
    /// Describe the tiling of a `width` x `height` image into `dimension`-sized squares
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if `dimension` is zero
    pub fn new(width: u32, height: u32, dimension: u32) -> Result<Self> {
        if dimension == 0 {
            return Err(invalid_parameter(
                "tile_dimension",
                &dimension,
                &"must be positive",
            ));
        }
        Ok(Self {
            width,
            height,
            dimension,
        })
    }

    /// Tile side length in pixels
    pub const fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Number of complete tile rows
    pub const fn rows(&self) -> u32 {
        self.height / self.dimension
    }

    /// Number of complete tile columns
    pub const fn cols(&self) -> u32 {
        self.width / self.dimension
    }

    /// Total number of tiles the layout emits
    pub const fn tile_count(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    /// Row-major iterator over tile offsets; can be cloned to restart
    pub const fn offsets(&self) -> TileOffsets {
        TileOffsets {
            layout: *self,
            next: 0,
        }
    }

    fn offset_at(&self, index: usize) -> Option<TileOffset> {
        let cols = self.cols() as usize;
        if cols == 0 || index >= self.tile_count() {
            return None;
        }
        Some(TileOffset {
            row: (index / cols) as u32 * self.dimension,
            col: (index % cols) as u32 * self.dimension,
        })
    }
}

/// Lazy row-major sequence of tile offsets
#[derive(Debug, Clone)]
pub struct TileOffsets {
    layout: TileLayout,
    next: usize,
}

impl Iterator for TileOffsets {
    type Item = TileOffset;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.layout.offset_at(self.next)?;
        self.next += 1;
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layout.tile_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileOffsets {}

/// A square crop of a source image
#[derive(Debug, Clone)]
pub struct Tile {
    /// Where the tile sits in the source image
    pub offset: TileOffset,
    /// Copied tile pixels
    pub pixels: RgbImage,
}

impl Tile {
    /// Pixel rows covered by this tile
    pub fn row_span(&self) -> Range<u32> {
        self.offset.row..self.offset.row + self.pixels.height()
    }

    /// Pixel columns covered by this tile
    pub fn col_span(&self) -> Range<u32> {
        self.offset.col..self.offset.col + self.pixels.width()
    }
}

/// Slices one image into tiles on demand
#[derive(Debug, Clone, Copy)]
pub struct Tiler<'a> {
    image: &'a RgbImage,
    layout: TileLayout,
}

impl<'a> Tiler<'a> {
    /// Prepare to tile `image` with squares of side `dimension`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if `dimension` is zero
    pub fn new(image: &'a RgbImage, dimension: u32) -> Result<Self> {
        Ok(Self {
            image,
            layout: TileLayout::new(image.width(), image.height(), dimension)?,
        })
    }

    /// Geometry of the tiling
    pub const fn layout(&self) -> TileLayout {
        self.layout
    }

    /// Copy out the tile at `offset`
    ///
    /// Returns `None` if the tile would extend past the image.
    pub fn crop(&self, offset: TileOffset) -> Option<Tile> {
        let dimension = self.layout.dimension;
        let fits_rows = offset.row.checked_add(dimension)? <= self.image.height();
        let fits_cols = offset.col.checked_add(dimension)? <= self.image.width();
        if !(fits_rows && fits_cols) {
            return None;
        }
        let pixels =
            imageops::crop_imm(self.image, offset.col, offset.row, dimension, dimension)
                .to_image();
        Some(Tile { offset, pixels })
    }

    /// Lazy row-major iterator over every complete tile
    pub const fn tiles(&self) -> Tiles<'a> {
        Tiles {
            tiler: *self,
            offsets: self.layout.offsets(),
        }
    }
}

/// Iterator produced by [`Tiler::tiles`]
#[derive(Debug, Clone)]
pub struct Tiles<'a> {
    tiler: Tiler<'a>,
    offsets: TileOffsets,
}

impl Iterator for Tiles<'_> {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        self.tiler.crop(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}
