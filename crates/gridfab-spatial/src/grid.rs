//! Fixed-size grid layer with multi-cell tileables.

use crate::{Footprint, FreePosition, GridPosition, SpatialError, Tile, Tileable};
use gridfab_core::fixed::Fixed64;
use gridfab_core::id::EntityId;
use slotmap::SlotMap;
use std::collections::BTreeSet;

/// A tileable's slot in the layer arena.
#[derive(Debug, Clone)]
struct Slot<T> {
    tile: Tile<T>,
    /// Footprint recorded at install time, so a detached tileable still
    /// knows which cells it owns.
    footprint: Footprint,
}

/// A `width × height` grid where every cell points at the tileable that
/// covers it.
///
/// Every cell is always covered: unused cells hold their own default
/// tileable. A multi-cell tileable is stored once and referenced from each
/// of its cells; its tile position is the anchor (minimum corner).
#[derive(Debug, Clone)]
pub struct GridWorldLayer<T> {
    width: u32,
    height: u32,
    /// Indexed `x * height + y`.
    cells: Vec<EntityId>,
    slots: SlotMap<EntityId, Slot<T>>,
}

impl<T: Tileable> GridWorldLayer<T> {
    /// Create a layer filled with default tileables.
    pub fn new(width: u32, height: u32) -> Self {
        let mut layer = Self {
            width,
            height,
            cells: Vec::with_capacity((width * height) as usize),
            slots: SlotMap::with_key(),
        };
        layer.fill_defaults();
        layer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// True when every cell of `footprint` anchored at `pos` is on the layer.
    pub fn footprint_in_bounds(&self, pos: GridPosition, footprint: Footprint) -> bool {
        self.in_bounds(pos)
            && self.in_bounds(GridPosition::new(
                pos.x + footprint.width as i32 - 1,
                pos.y + footprint.height as i32 - 1,
            ))
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.x as usize * self.height as usize + pos.y as usize)
    }

    fn fill_defaults(&mut self) {
        self.cells.clear();
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                let id = self.slots.insert(Slot {
                    tile: Tile {
                        tileable: T::default(),
                        position: GridPosition::new(x, y),
                    },
                    footprint: Footprint::single(),
                });
                self.cells.push(id);
            }
        }
    }

    fn install_default(&mut self, pos: GridPosition) {
        let Some(index) = self.index(pos) else {
            return;
        };
        let id = self.slots.insert(Slot {
            tile: Tile {
                tileable: T::default(),
                position: pos,
            },
            footprint: Footprint::single(),
        });
        self.cells[index] = id;
    }

    // -- Point queries --

    /// The tile covering `pos`, or `None` outside the layer.
    pub fn get_tile(&self, pos: GridPosition) -> Option<&Tile<T>> {
        let id = self.id_at(pos)?;
        self.slots.get(id).map(|s| &s.tile)
    }

    pub fn get_tile_mut(&mut self, pos: GridPosition) -> Option<&mut Tile<T>> {
        let id = self.id_at(pos)?;
        self.slots.get_mut(id).map(|s| &mut s.tile)
    }

    /// Id of the tileable covering `pos`.
    pub fn id_at(&self, pos: GridPosition) -> Option<EntityId> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn get(&self, id: EntityId) -> Option<&Tile<T>> {
        self.slots.get(id).map(|s| &s.tile)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Tile<T>> {
        self.slots.get_mut(id).map(|s| &mut s.tile)
    }

    /// Footprint a tileable was installed with.
    pub fn footprint_of(&self, id: EntityId) -> Option<Footprint> {
        self.slots.get(id).map(|s| s.footprint)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(id)
    }

    /// True when `pos` is covered by a default tileable.
    pub fn is_default_at(&self, pos: GridPosition) -> bool {
        self.get_tile(pos).is_some_and(|t| t.tileable.is_default())
    }

    // -- Placement --

    /// Install `tileable` with its anchor at `pos`, returning its new id.
    ///
    /// Whatever was under the new footprint is dropped. A multi-cell
    /// tileable that is only partly covered has its remaining cells
    /// repaired back to defaults, so no cell is left pointing at a
    /// tileable that no longer exists.
    pub fn replace_tileable(
        &mut self,
        pos: GridPosition,
        tileable: T,
    ) -> Result<EntityId, SpatialError> {
        let footprint = tileable.footprint();
        if !self.footprint_in_bounds(pos, footprint) {
            return Err(SpatialError::OutOfBounds {
                position: pos,
                width: footprint.width,
                height: footprint.height,
            });
        }

        let covered: BTreeSet<GridPosition> = footprint.tiles(pos).collect();
        let mut displaced: Vec<EntityId> = Vec::new();
        for cell in &covered {
            if let Some(id) = self.id_at(*cell)
                && !displaced.contains(&id)
            {
                displaced.push(id);
            }
        }

        for id in displaced {
            let Some(old) = self.slots.remove(id) else {
                continue;
            };
            for cell in old.footprint.tiles(old.tile.position) {
                if !covered.contains(&cell) {
                    self.install_default(cell);
                }
            }
        }

        let id = self.slots.insert(Slot {
            tile: Tile {
                tileable,
                position: pos,
            },
            footprint,
        });
        for cell in &covered {
            if let Some(index) = self.index(*cell) {
                self.cells[index] = id;
            }
        }
        Ok(id)
    }

    /// Put a default tileable back over the whole footprint of `id`.
    /// Returns the removed tileable.
    pub fn clear_tileable(&mut self, id: EntityId) -> Option<T> {
        let old = self.slots.remove(id)?;
        for cell in old.footprint.tiles(old.tile.position) {
            self.install_default(cell);
        }
        Some(old.tile.tileable)
    }

    /// Reset every cell to a default tileable.
    pub fn clear_all_entities(&mut self) {
        self.slots.clear();
        self.fill_defaults();
    }

    // -- Ticking support --

    /// Take a tileable out of its slot, leaving a default in its place.
    /// The cells keep pointing at `id` until [`attach`](Self::attach).
    pub fn detach(&mut self, id: EntityId) -> Option<T> {
        self.slots
            .get_mut(id)
            .map(|s| std::mem::take(&mut s.tile.tileable))
    }

    /// Put a detached tileable back. Returns it if the slot has since
    /// been removed.
    pub fn attach(&mut self, id: EntityId, tileable: T) -> Result<(), T> {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.tile.tileable = tileable;
                Ok(())
            }
            None => Err(tileable),
        }
    }

    // -- Traversal --

    /// Every tileable once, at its anchor, in row-major order (x outer,
    /// y inner).
    pub fn anchors(&self) -> Vec<(EntityId, GridPosition)> {
        let mut result = Vec::new();
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                let pos = GridPosition::new(x, y);
                let Some(id) = self.id_at(pos) else {
                    continue;
                };
                if self.slots.get(id).is_some_and(|s| s.tile.position == pos) {
                    result.push((id, pos));
                }
            }
        }
        result
    }

    /// Non-default tileables, once each, in row-major anchor order.
    pub fn occupied(&self) -> Vec<(EntityId, &Tile<T>)> {
        self.anchors()
            .into_iter()
            .filter_map(|(id, _)| self.slots.get(id).map(|s| (id, &s.tile)))
            .filter(|(_, tile)| !tile.tileable.is_default())
            .collect()
    }

    /// Non-default tileables whose footprint centre lies within `range` of
    /// `center`, nearest first. Ties keep row-major anchor order.
    pub fn within_range(
        &self,
        center: FreePosition,
        range: Fixed64,
    ) -> Vec<(EntityId, Fixed64)> {
        let reach = range.ceil().to_num::<i32>() + 1;
        let cell = center.cell();
        let limit = range.saturating_mul(range);

        let mut seen = BTreeSet::new();
        let mut found = Vec::new();
        for x in (cell.x - reach)..=(cell.x + reach) {
            for y in (cell.y - reach)..=(cell.y + reach) {
                let Some(id) = self.id_at(GridPosition::new(x, y)) else {
                    continue;
                };
                if !seen.insert(id) {
                    continue;
                }
                let Some(slot) = self.slots.get(id) else {
                    continue;
                };
                if slot.tile.tileable.is_default() {
                    continue;
                }
                let d2 = center.distance_squared(&slot.footprint.center(slot.tile.position));
                if d2 <= limit {
                    found.push((id, d2, slot.tile.position));
                }
            }
        }
        found.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then(a.2.x.cmp(&b.2.x))
                .then(a.2.y.cmp(&b.2.y))
        });
        found.into_iter().map(|(id, d2, _)| (id, d2)).collect()
    }

    /// Number of non-default tileables.
    pub fn occupied_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| !s.tile.tileable.is_default())
            .count()
    }
}
