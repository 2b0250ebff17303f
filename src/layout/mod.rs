//! Sprite grid layout.
//!
//! Packs `tile_count` square tiles of side `tile_size` into rows no wider than
//! `max_width`. Rows fill left-to-right, top-to-bottom, in input order; the last
//! row may be partial but is always counted at full height.
//!
//! All arithmetic is integer floor/ceil; there is no single-row special case.
//! Callers wanting one row pass a `max_width` of at least `tile_count * tile_size`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest width/height a WebP image can carry.
pub const WEBP_MAX_DIMENSION: u32 = 16_383;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no tiles to lay out")]
    EmptyInput,
    #[error("tile index {index} out of range (tile_count {tile_count})")]
    IndexOutOfRange { index: usize, tile_count: usize },
    #[error("tile size must be at least 1px")]
    ZeroTileSize,
    #[error("tile size {tile_size} exceeds max width {max_width}")]
    TileWiderThanCanvas { tile_size: u32, max_width: u32 },
    #[error("canvas for {tile_count} tiles of {tile_size}px overflows u32")]
    CanvasOverflow { tile_count: usize, tile_size: u32 },
}

/// Grid geometry for one sprite sheet. Immutable once computed.
///
/// Only [`compute_layout`] builds one; the placement helpers rely on its
/// non-zero `tile_size` and `tiles_per_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub tile_count: usize,
    pub tile_size: u32,
    pub max_width: u32,
    pub tiles_per_row: u32,
    pub row_count: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Where one tile lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
}

pub fn compute_layout(tile_count: usize, tile_size: u32, max_width: u32) -> Result<Layout, LayoutError> {
    if tile_count == 0 {
        return Err(LayoutError::EmptyInput);
    }
    if tile_size == 0 {
        return Err(LayoutError::ZeroTileSize);
    }
    if tile_size > max_width {
        return Err(LayoutError::TileWiderThanCanvas { tile_size, max_width });
    }
    let overflow = || LayoutError::CanvasOverflow { tile_count, tile_size };

    let tiles_per_row = max_width / tile_size;
    let per_row = tiles_per_row as usize;
    let row_count = u32::try_from(tile_count.div_ceil(per_row)).map_err(|_| overflow())?;
    // Occupied columns: a lone partial row is only as wide as its tiles.
    let columns = tile_count.min(per_row) as u32;
    let canvas_width = columns * tile_size; // columns <= tiles_per_row, so <= max_width
    let canvas_height = row_count.checked_mul(tile_size).ok_or_else(overflow)?;

    Ok(Layout { tile_count, tile_size, max_width, tiles_per_row, row_count, canvas_width, canvas_height })
}

pub fn place_tile(layout: &Layout, index: usize) -> Result<Placement, LayoutError> {
    if index >= layout.tile_count {
        return Err(LayoutError::IndexOutOfRange { index, tile_count: layout.tile_count });
    }
    let per_row = layout.tiles_per_row as usize;
    let row = (index / per_row) as u32;
    let col = (index % per_row) as u32;
    Ok(Placement { index, row, col, x: col * layout.tile_size, y: row * layout.tile_size })
}

impl Layout {
    /// Number of columns actually occupied (less than `tiles_per_row` for a single short row).
    pub fn columns(&self) -> u32 {
        self.canvas_width / self.tile_size
    }

    /// Every placement in input order.
    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        let per_row = self.tiles_per_row as usize;
        (0..self.tile_count).map(move |index| {
            let row = (index / per_row) as u32;
            let col = (index % per_row) as u32;
            Placement { index, row, col, x: col * self.tile_size, y: row * self.tile_size }
        })
    }

    /// Inverse of [`place_tile`]: tile index under canvas pixel `(x, y)`, if any.
    /// Cells past the end of a partial last row return `None`.
    pub fn index_at(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.canvas_width || y >= self.canvas_height {
            return None;
        }
        let row = (y / self.tile_size) as usize;
        let col = (x / self.tile_size) as usize;
        let index = row * self.tiles_per_row as usize + col;
        (index < self.tile_count).then_some(index)
    }
}
