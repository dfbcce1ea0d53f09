//! Power conduction: linking conductors and exposing the live layer as a
//! [`PowerGraph`].

use gridfab_core::id::EntityId;
use gridfab_core::rotation::Rotation;
use gridfab_power::{PowerConduct, PowerGraph, PowerStorage};
use gridfab_spatial::{Footprint, GridPosition, GridWorldLayer};

use crate::entity::Entity;
use crate::world::World;

/// Relink a conductor: along each cardinal line out to its range, the
/// first other conductor found is linked both ways. Construction sites are
/// looked past, not linked. Last tick's links are
/// kept one more tick by [`PowerConduct::begin_refresh`].
pub(crate) fn refresh(
    world: &mut World,
    id: EntityId,
    anchor: GridPosition,
    size: Footprint,
    conduct: &mut PowerConduct,
) {
    conduct.begin_refresh();
    let range = conduct.range() as i32;
    for rotation in Rotation::ALL {
        if let Some(other) = first_conductor(&world.live, id, anchor, size, rotation, range) {
            conduct.link(other);
            if let Some(peer) = world
                .live
                .get_mut(other)
                .and_then(|t| t.tileable.attributes.conduct.as_mut())
            {
                peer.link(id);
            }
        }
    }
}

fn first_conductor(
    layer: &GridWorldLayer<Entity>,
    id: EntityId,
    anchor: GridPosition,
    size: Footprint,
    rotation: Rotation,
    range: i32,
) -> Option<EntityId> {
    for distance in 1..=range {
        for cell in size.edge_cells(anchor, rotation, distance) {
            let Some(other) = layer.id_at(cell) else {
                continue;
            };
            if other == id {
                continue;
            }
            let is_conductor = layer.get(other).is_some_and(|t| {
                !t.tileable.is_under_construction() && t.tileable.attributes.conduct.is_some()
            });
            if is_conductor {
                return Some(other);
            }
        }
    }
    None
}

/// The live layer seen as a conduction graph. Entities still under
/// construction neither conduct nor supply power.
pub(crate) struct LiveGraph<'a> {
    layer: &'a mut GridWorldLayer<Entity>,
}

impl<'a> LiveGraph<'a> {
    pub(crate) fn new(layer: &'a mut GridWorldLayer<Entity>) -> Self {
        Self { layer }
    }
}

impl PowerGraph for LiveGraph<'_> {
    fn neighbours(&self, id: EntityId) -> Vec<EntityId> {
        self.layer
            .get(id)
            .filter(|t| !t.tileable.is_under_construction())
            .and_then(|t| t.tileable.attributes.conduct.as_ref())
            .map(PowerConduct::neighbours)
            .unwrap_or_default()
    }

    fn storage_mut(&mut self, id: EntityId) -> Option<&mut PowerStorage> {
        self.layer
            .get_mut(id)
            .filter(|t| !t.tileable.is_under_construction())
            .and_then(|t| t.tileable.attributes.power.as_mut())
    }
}
