//! Free-moving tiles: mobs and projectiles at continuous positions.

use crate::{FreePosition, SpatialError, Tile};
use gridfab_core::fixed::Fixed64;
use gridfab_core::id::FreeTileId;
use slotmap::SlotMap;

/// An ordered collection of free tiles with stable ids.
///
/// Iteration follows insertion order. Removing a tile keeps the relative
/// order of the rest.
#[derive(Debug, Clone)]
pub struct FreeWorldLayer<T> {
    tiles: SlotMap<FreeTileId, Tile<T, FreePosition>>,
    order: Vec<FreeTileId>,
}

impl<T> Default for FreeWorldLayer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FreeWorldLayer<T> {
    pub fn new() -> Self {
        Self {
            tiles: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Append a tile at `position`.
    pub fn add_tileable(&mut self, position: FreePosition, tileable: T) -> FreeTileId {
        let id = self.tiles.insert(Tile { tileable, position });
        self.order.push(id);
        id
    }

    /// Move a tile. Its place in iteration order is unchanged.
    pub fn update_tile(&mut self, id: FreeTileId, position: FreePosition) -> Result<(), SpatialError> {
        let tile = self.tiles.get_mut(id).ok_or(SpatialError::UnknownFreeTile)?;
        tile.position = position;
        Ok(())
    }

    pub fn remove_tile(&mut self, id: FreeTileId) -> Option<Tile<T, FreePosition>> {
        let tile = self.tiles.remove(id)?;
        self.order.retain(|other| *other != id);
        Some(tile)
    }

    pub fn get(&self, id: FreeTileId) -> Option<&Tile<T, FreePosition>> {
        self.tiles.get(id)
    }

    pub fn get_mut(&mut self, id: FreeTileId) -> Option<&mut Tile<T, FreePosition>> {
        self.tiles.get_mut(id)
    }

    pub fn contains(&self, id: FreeTileId) -> bool {
        self.tiles.contains_key(id)
    }

    /// Ids in iteration order. A snapshot, so callers may mutate the layer
    /// while walking it.
    pub fn ids(&self) -> Vec<FreeTileId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FreeTileId, &Tile<T, FreePosition>)> {
        self.order
            .iter()
            .filter_map(|id| self.tiles.get(*id).map(|tile| (*id, tile)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.order.clear();
    }

    /// Tiles within `range` of `center` (inclusive), nearest first. Equal
    /// distances keep iteration order.
    pub fn within_range(&self, center: FreePosition, range: Fixed64) -> Vec<(FreeTileId, Fixed64)> {
        let limit = range.saturating_mul(range);
        let mut found: Vec<(usize, FreeTileId, Fixed64)> = self
            .iter()
            .enumerate()
            .filter_map(|(index, (id, tile))| {
                let d2 = center.distance_squared(&tile.position);
                (d2 <= limit).then_some((index, id, d2))
            })
            .collect();
        found.sort_by(|a, b| a.2.cmp(&b.2).then(a.0.cmp(&b.0)));
        found.into_iter().map(|(_, id, d2)| (id, d2)).collect()
    }
}

impl<T: Default> FreeWorldLayer<T> {
    /// Take a tile's value out for an update, leaving a default behind.
    pub fn detach(&mut self, id: FreeTileId) -> Option<T> {
        self.tiles
            .get_mut(id)
            .map(|tile| std::mem::take(&mut tile.tileable))
    }

    /// Put a detached value back. Returns it if the tile was removed in
    /// the meantime.
    pub fn attach(&mut self, id: FreeTileId, tileable: T) -> Result<(), T> {
        match self.tiles.get_mut(id) {
            Some(tile) => {
                tile.tileable = tileable;
                Ok(())
            }
            None => Err(tileable),
        }
    }
}
