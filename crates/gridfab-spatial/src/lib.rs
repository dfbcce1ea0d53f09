//! World layers: position-indexed storage for everything on the map.
//!
//! Two flavors share the [`Tile`] shape:
//! - [`GridWorldLayer`] maps every integer cell to the tileable covering it,
//!   with multi-cell footprints and repair-on-overlap placement.
//! - [`FreeWorldLayer`] tracks continuously moving tiles (mobs,
//!   projectiles) in a flat ordered list with stable ids.

use gridfab_core::fixed::{Fixed64, length_squared};
use gridfab_core::rotation::Rotation;
use serde::{Deserialize, Serialize};

pub mod free;
pub mod grid;

pub use free::FreeWorldLayer;
pub use grid::GridWorldLayer;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `steps` cells away in `rotation`.
    pub fn step(&self, rotation: Rotation, steps: i32) -> GridPosition {
        let (dx, dy) = rotation.offset();
        GridPosition::new(self.x + dx * steps, self.y + dy * steps)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Centre of this cell in free-layer coordinates.
    pub fn center(&self) -> FreePosition {
        let half = Fixed64::from_num(0.5);
        FreePosition::new(Fixed64::from_num(self.x) + half, Fixed64::from_num(self.y) + half)
    }
}

/// A continuous position. Cell `(x, y)` spans `[x, x+1) × [y, y+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FreePosition {
    pub x: Fixed64,
    pub y: Fixed64,
}

impl FreePosition {
    pub fn new(x: Fixed64, y: Fixed64) -> Self {
        Self { x, y }
    }

    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(Fixed64::from_num(x), Fixed64::from_num(y))
    }

    /// The cell containing this position.
    pub fn cell(&self) -> GridPosition {
        GridPosition::new(self.x.floor().to_num::<i32>(), self.y.floor().to_num::<i32>())
    }

    pub fn distance_squared(&self, other: &FreePosition) -> Fixed64 {
        length_squared(other.x - self.x, other.y - self.y)
    }

    /// True when `other` lies within `range` (inclusive).
    pub fn within(&self, other: &FreePosition, range: Fixed64) -> bool {
        self.distance_squared(other) <= range.saturating_mul(range)
    }

    /// Move up to `step` towards `target`, landing exactly on it when close.
    pub fn toward(&self, target: &FreePosition, step: Fixed64) -> FreePosition {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = gridfab_core::fixed::length(dx, dy);
        if dist <= step || dist == Fixed64::ZERO {
            return *target;
        }
        FreePosition::new(self.x + dx * step / dist, self.y + dy * step / dist)
    }

    pub fn offset(&self, dx: Fixed64, dy: Fixed64) -> FreePosition {
        FreePosition::new(self.x + dx, self.y + dy)
    }
}

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// The size of a tileable in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Default for Footprint {
    fn default() -> Self {
        Self::single()
    }
}

impl Footprint {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// A 1x1 footprint.
    pub fn single() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    /// The footprint after turning to `rotation`: width and height swap
    /// for horizontal facings.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        if rotation.is_horizontal() {
            Self {
                width: self.height,
                height: self.width,
            }
        } else {
            *self
        }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// All covered cells for an anchor at `origin` (the minimum corner),
    /// x outer, y inner.
    pub fn tiles(&self, origin: GridPosition) -> impl Iterator<Item = GridPosition> {
        let w = self.width as i32;
        let h = self.height as i32;
        let ox = origin.x;
        let oy = origin.y;
        (0..w).flat_map(move |dx| (0..h).map(move |dy| GridPosition::new(ox + dx, oy + dy)))
    }

    pub fn contains(&self, origin: GridPosition, pos: GridPosition) -> bool {
        pos.x >= origin.x
            && pos.y >= origin.y
            && pos.x < origin.x + self.width as i32
            && pos.y < origin.y + self.height as i32
    }

    /// The cells `distance` steps beyond the edge facing `rotation`
    /// (`distance` 1 is directly adjacent).
    pub fn edge_cells(
        &self,
        origin: GridPosition,
        rotation: Rotation,
        distance: i32,
    ) -> Vec<GridPosition> {
        let w = self.width as i32;
        let h = self.height as i32;
        match rotation {
            Rotation::Up => (0..w)
                .map(|dx| GridPosition::new(origin.x + dx, origin.y + h - 1 + distance))
                .collect(),
            Rotation::Down => (0..w)
                .map(|dx| GridPosition::new(origin.x + dx, origin.y - distance))
                .collect(),
            Rotation::Right => (0..h)
                .map(|dy| GridPosition::new(origin.x + w - 1 + distance, origin.y + dy))
                .collect(),
            Rotation::Left => (0..h)
                .map(|dy| GridPosition::new(origin.x - distance, origin.y + dy))
                .collect(),
        }
    }

    /// Centre of the footprint anchored at `origin`.
    pub fn center(&self, origin: GridPosition) -> FreePosition {
        let two = Fixed64::from_num(2);
        FreePosition::new(
            Fixed64::from_num(origin.x) + Fixed64::from_num(self.width) / two,
            Fixed64::from_num(origin.y) + Fixed64::from_num(self.height) / two,
        )
    }
}

// ---------------------------------------------------------------------------
// Tile / Tileable
// ---------------------------------------------------------------------------

/// A tileable together with where it sits. Grid tiles carry their anchor
/// cell; free tiles carry a continuous position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile<T, P = GridPosition> {
    pub tileable: T,
    pub position: P,
}

/// Anything that occupies grid space.
///
/// `Default` is the empty placeholder a layer fills unused cells with and
/// repairs partially overwritten footprints back to.
pub trait Tileable: Default {
    /// Cells covered, already accounting for rotation.
    fn footprint(&self) -> Footprint;

    /// True for the empty placeholder.
    fn is_default(&self) -> bool;
}

/// Errors from layer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("footprint {width}x{height} at ({}, {}) leaves the layer", .position.x, .position.y)]
    OutOfBounds {
        position: GridPosition,
        width: u32,
        height: u32,
    },
    #[error("free tile is not tracked by this layer")]
    UnknownFreeTile,
}
