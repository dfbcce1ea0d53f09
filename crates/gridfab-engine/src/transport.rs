//! Moving materials and liquids between neighbouring grid entities.
//!
//! Material transport tries directions, then destinations along the edge
//! facing that direction, then candidate resources, all in an order
//! shuffled by the world RNG. The first destination that accepts a
//! candidate travelling in that direction and has room for it wins. Items
//! are removed from the source and added to the destination in the same
//! step, tagged with the direction they travelled. Liquid transport
//! follows the same shuffled order.

use gridfab_core::id::EntityId;
use gridfab_core::resource::{Count, Resource};
use gridfab_core::rotation::{Rotation, RotationSet};
use gridfab_spatial::{Footprint, GridPosition, GridWorldLayer, Tileable};
use serde::{Deserialize, Serialize};

use crate::context::TickContext;
use crate::entity::Entity;

/// Push up to `batch` of one stored resource into a neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTransport {
    pub outputs: RotationSet,
    /// Resources allowed out. Empty means any.
    pub resources: Vec<Resource>,
    pub batch: u32,
}

impl MaterialTransport {
    pub fn new(outputs: RotationSet, batch: u32) -> Self {
        Self {
            outputs,
            resources: Vec::new(),
            batch: batch.max(1),
        }
    }

    pub fn only(mut self, resources: &[Resource]) -> Self {
        self.resources = resources.to_vec();
        self
    }

    fn passes(&self, resource: Resource) -> bool {
        self.resources.is_empty() || self.resources.contains(&resource)
    }

    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let Some((self_id, anchor)) = ctx.grid() else {
            return false;
        };
        let TickContext {
            world, table, size, ..
        } = ctx;
        let Some(source) = table.material.as_mut() else {
            return false;
        };
        let candidates: Vec<Count> = source
            .contents()
            .into_iter()
            .filter(|c| self.passes(c.resource()))
            .filter_map(|c| c.with_quantity(c.quantity().min(self.batch)))
            .collect();
        if candidates.is_empty() {
            return false;
        }

        let mut rotations = self.outputs.to_vec();
        world.rng.shuffle(&mut rotations);
        for rotation in rotations {
            let mut destinations = neighbours(&world.live, self_id, anchor, *size, rotation);
            world.rng.shuffle(&mut destinations);
            for destination in destinations {
                let mut counts = candidates.clone();
                world.rng.shuffle(&mut counts);
                let Some(tile) = world.live.get_mut(destination) else {
                    continue;
                };
                let Some(input) = tile.tileable.material_input_mut() else {
                    continue;
                };
                if !input.accepts(rotation) {
                    continue;
                }
                let Some(count) = counts.into_iter().find(|c| input.has_capacity(*c)) else {
                    continue;
                };
                let moved = source.remove(count);
                if let Some(moved) = count.with_quantity(moved) {
                    input.add(moved, rotation);
                }
                return true;
            }
        }
        false
    }
}

/// Push the resident liquid into a neighbour's tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidTransport {
    pub outputs: RotationSet,
    /// Most units moved per tick.
    pub rate: u32,
}

impl LiquidTransport {
    pub fn new(outputs: RotationSet, rate: u32) -> Self {
        Self {
            outputs,
            rate: rate.max(1),
        }
    }

    /// Directions, then destinations along each edge, are tried in an
    /// order shuffled by the world RNG. The first tank that accepts the
    /// travel direction and takes anything wins.
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let Some((self_id, anchor)) = ctx.grid() else {
            return false;
        };
        let TickContext {
            world, table, size, ..
        } = ctx;
        let Some(source) = table.liquid.as_mut() else {
            return false;
        };
        let Some(offer) = source
            .current()
            .and_then(|c| c.with_quantity(c.quantity().min(self.rate)))
        else {
            return false;
        };
        let mut rotations = self.outputs.to_vec();
        world.rng.shuffle(&mut rotations);
        for rotation in rotations {
            let mut destinations = neighbours(&world.live, self_id, anchor, *size, rotation);
            world.rng.shuffle(&mut destinations);
            for destination in destinations {
                let Some(tile) = world.live.get_mut(destination) else {
                    continue;
                };
                if tile.tileable.is_under_construction() {
                    continue;
                }
                let Some(tank) = tile.tileable.attributes.liquid.as_mut() else {
                    continue;
                };
                if !tank.accepts(rotation) {
                    continue;
                }
                let taken = tank.try_add(offer);
                if taken > 0 {
                    source.remove(taken);
                    return true;
                }
            }
        }
        false
    }
}

/// Move the newest stored item one step in the direction it was already
/// travelling.
pub(crate) fn junction(ctx: &mut TickContext<'_>) -> bool {
    let Some((self_id, anchor)) = ctx.grid() else {
        return false;
    };
    let TickContext {
        world, table, size, ..
    } = ctx;
    let Some(source) = table.material.as_mut() else {
        return false;
    };
    let Some((resource, rotation)) = source.peek() else {
        return false;
    };
    let count = Count::new(resource, 1);
    for destination in neighbours(&world.live, self_id, anchor, *size, rotation) {
        let Some(tile) = world.live.get_mut(destination) else {
            continue;
        };
        let Some(input) = tile.tileable.material_input_mut() else {
            continue;
        };
        if input.accepts(rotation) && input.has_capacity(count) {
            source.remove(count);
            input.add(count, rotation);
            return true;
        }
    }
    false
}

/// Distinct non-empty entities directly beyond the edge facing `rotation`,
/// in edge order.
pub(crate) fn neighbours(
    layer: &GridWorldLayer<Entity>,
    self_id: EntityId,
    anchor: GridPosition,
    size: Footprint,
    rotation: Rotation,
) -> Vec<EntityId> {
    let mut found: Vec<EntityId> = Vec::new();
    for cell in size.edge_cells(anchor, rotation, 1) {
        let Some(id) = layer.id_at(cell) else {
            continue;
        };
        if id == self_id || found.contains(&id) {
            continue;
        }
        if layer.get(id).is_some_and(|t| !t.tileable.is_default()) {
            found.push(id);
        }
    }
    found
}
