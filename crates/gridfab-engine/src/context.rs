//! What an attribute sees while its entity ticks.

use gridfab_core::id::{EntityId, FreeTileId};
use gridfab_core::rotation::Rotation;
use gridfab_spatial::{Footprint, FreePosition, GridPosition};

use crate::entity::AttributeTable;
use crate::world::World;

/// Where the ticking entity lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Grid { id: EntityId, anchor: GridPosition },
    Free { id: FreeTileId },
}

/// Mutable view handed to every attribute of one entity for one tick.
///
/// The entity itself is detached from its layer while this exists, so
/// `world` never aliases `table`.
pub struct TickContext<'a> {
    pub world: &'a mut World,
    pub table: &'a mut AttributeTable,
    pub placement: Placement,
    /// Footprint after rotation.
    pub size: Footprint,
    pub rotation: Rotation,
    /// Set by an attribute to remove the entity after this tick.
    pub despawn: bool,
}

impl TickContext<'_> {
    /// Id and anchor when ticking on the grid.
    pub fn grid(&self) -> Option<(EntityId, GridPosition)> {
        match self.placement {
            Placement::Grid { id, anchor } => Some((id, anchor)),
            Placement::Free { .. } => None,
        }
    }

    pub fn free_id(&self) -> Option<FreeTileId> {
        match self.placement {
            Placement::Free { id } => Some(id),
            Placement::Grid { .. } => None,
        }
    }

    /// Centre of the entity in free coordinates.
    pub fn center(&self) -> FreePosition {
        match self.placement {
            Placement::Grid { anchor, .. } => self.size.center(anchor),
            Placement::Free { id } => self
                .world
                .free()
                .get(id)
                .map(|tile| tile.position)
                .unwrap_or_default(),
        }
    }
}
