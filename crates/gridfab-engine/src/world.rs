//! The world: layers, RNG and the tick loop.
//!
//! # Tick order
//!
//! 1. Refresh the mob coordinator when due.
//! 2. Grid pass: every live entity once, at its anchor, row-major (x outer,
//!    y inner). Empty placeholders are skipped.
//! 3. Free pass: mobs and projectiles in list order.
//!
//! While an entity ticks it is detached from its layer, so it can read and
//! write the rest of the world. Its cells keep pointing at its id; anyone
//! looking sees an empty placeholder until it is put back.

use gridfab_core::id::{EntityId, FreeTileId};
use gridfab_core::resource::Resource;
use gridfab_core::rng::SimRng;
use gridfab_core::sim::StateHash;
use gridfab_fluid::LiquidConfig;
use gridfab_spatial::{
    Footprint, FreePosition, FreeWorldLayer, GridPosition, GridWorldLayer, SpatialError, Tileable,
};
use serde::{Deserialize, Serialize};

use crate::context::Placement;
use crate::coordinator::MobCoordinator;
use crate::entity::{Entity, TickOutcome};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    /// Ticks between rebuilds of the mob target cache.
    pub target_refresh_interval: u64,
    /// Applied to every liquid tank placed in this world.
    pub liquid: LiquidConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            seed: 0,
            target_refresh_interval: 60,
            liquid: LiquidConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Empty,
    Deposit(Resource),
}

impl Terrain {
    /// Serialized discriminants, in declaration order.
    pub const TAGS: [&'static str; 2] = ["Empty", "Deposit"];
}

impl Tileable for Terrain {
    fn footprint(&self) -> Footprint {
        Footprint::single()
    }

    fn is_default(&self) -> bool {
        matches!(self, Terrain::Empty)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) terrain: GridWorldLayer<Terrain>,
    pub(crate) live: GridWorldLayer<Entity>,
    /// Placement preview. Never simulated.
    pub(crate) queue: GridWorldLayer<Entity>,
    pub(crate) free: FreeWorldLayer<Entity>,
    pub(crate) coordinator: MobCoordinator,
    pub(crate) rng: SimRng,
    pub(crate) tick: u64,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            terrain: GridWorldLayer::new(config.width, config.height),
            live: GridWorldLayer::new(config.width, config.height),
            queue: GridWorldLayer::new(config.width, config.height),
            free: FreeWorldLayer::new(),
            coordinator: MobCoordinator::new(),
            rng: SimRng::new(config.seed),
            tick: 0,
            config,
        }
    }

    // -- Accessors --

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    pub fn terrain(&self) -> &GridWorldLayer<Terrain> {
        &self.terrain
    }

    pub fn live(&self) -> &GridWorldLayer<Entity> {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut GridWorldLayer<Entity> {
        &mut self.live
    }

    pub fn queue(&self) -> &GridWorldLayer<Entity> {
        &self.queue
    }

    pub fn free(&self) -> &FreeWorldLayer<Entity> {
        &self.free
    }

    pub fn free_mut(&mut self) -> &mut FreeWorldLayer<Entity> {
        &mut self.free
    }

    pub fn coordinator(&self) -> &MobCoordinator {
        &self.coordinator
    }

    /// The live entity covering `pos`, if it is not a placeholder.
    pub fn building_at(&self, pos: GridPosition) -> Option<&Entity> {
        self.live
            .get_tile(pos)
            .map(|t| &t.tileable)
            .filter(|e| !e.is_default())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.live.get(id).map(|t| &t.tileable)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.get_mut(id).map(|t| &mut t.tileable)
    }

    pub fn mob(&self, id: FreeTileId) -> Option<&Entity> {
        self.free.get(id).map(|t| &t.tileable)
    }

    // -- Editing --

    pub fn set_terrain(&mut self, pos: GridPosition, terrain: Terrain) -> Result<(), SpatialError> {
        self.terrain.replace_tileable(pos, terrain).map(|_| ())
    }

    /// Put an entity on the live layer with its anchor at `pos`, replacing
    /// whatever was there.
    pub fn place(&mut self, pos: GridPosition, mut entity: Entity) -> Result<EntityId, SpatialError> {
        if let Some(tank) = entity.attributes.liquid.as_mut() {
            tank.set_config(self.config.liquid);
        }
        for id in displaced(&self.live, pos, &entity) {
            self.coordinator.forget(id);
        }
        let name = entity.name.clone();
        let id = self.live.replace_tileable(pos, entity)?;
        tracing::debug!(%name, x = pos.x, y = pos.y, "placed");
        Ok(id)
    }

    /// Stage an entity on the queue layer without simulating it.
    pub fn queue_placement(&mut self, pos: GridPosition, entity: Entity) -> Result<EntityId, SpatialError> {
        self.queue.replace_tileable(pos, entity)
    }

    /// Move every queued entity onto the live layer in row-major anchor
    /// order, then clear the queue. If any footprint would leave the live
    /// layer nothing is moved and the queue is left as it was.
    pub fn commit_queue(&mut self) -> Result<Vec<EntityId>, SpatialError> {
        let staged: Vec<(GridPosition, EntityId)> = self
            .queue
            .occupied()
            .into_iter()
            .map(|(id, tile)| (tile.position, id))
            .collect();
        for (pos, queued) in &staged {
            let Some(tile) = self.queue.get(*queued) else {
                continue;
            };
            let footprint = tile.tileable.footprint();
            if !self.live.footprint_in_bounds(*pos, footprint) {
                return Err(SpatialError::OutOfBounds {
                    position: *pos,
                    width: footprint.width,
                    height: footprint.height,
                });
            }
        }
        let mut placed = Vec::with_capacity(staged.len());
        for (pos, queued) in staged {
            let Some(entity) = self.queue.clear_tileable(queued) else {
                continue;
            };
            placed.push(self.place(pos, entity)?);
        }
        self.queue.clear_all_entities();
        Ok(placed)
    }

    /// Remove a live entity, leaving empty placeholders.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.coordinator.forget(id);
        self.live.clear_tileable(id)
    }

    /// Add a mob or projectile to the free layer.
    pub fn spawn(&mut self, position: FreePosition, entity: Entity) -> FreeTileId {
        self.free.add_tileable(position, entity)
    }

    /// Damage a live entity. It is removed at once when its health runs
    /// out. Returns true if it was destroyed.
    pub fn damage_building(&mut self, id: EntityId, amount: i32) -> bool {
        let Some(health) = self
            .live
            .get_mut(id)
            .and_then(|t| t.tileable.attributes.health.as_mut())
        else {
            return false;
        };
        if !health.damage(amount) {
            return false;
        }
        if let Some(entity) = self.remove(id) {
            tracing::debug!(name = %entity.name, "building destroyed");
        }
        true
    }

    /// Damage a free-layer entity, removing it when its health runs out.
    pub fn damage_mob(&mut self, id: FreeTileId, amount: i32) -> bool {
        let Some(health) = self
            .free
            .get_mut(id)
            .and_then(|t| t.tileable.attributes.health.as_mut())
        else {
            return false;
        };
        if !health.damage(amount) {
            return false;
        }
        if let Some(tile) = self.free.remove_tile(id) {
            tracing::debug!(name = %tile.tileable.name, "mob killed");
        }
        true
    }

    // -- Simulation --

    /// Advance the world by one tick.
    pub fn tick(&mut self) {
        if self
            .coordinator
            .is_due(self.tick, self.config.target_refresh_interval)
        {
            self.coordinator.refresh(&self.live, self.tick);
        }

        for (id, anchor) in self.live.anchors() {
            if self.live.get(id).is_none_or(|t| t.tileable.is_default()) {
                continue;
            }
            let Some(mut entity) = self.live.detach(id) else {
                continue;
            };
            let outcome = entity.tick(self, Placement::Grid { id, anchor });
            match outcome {
                TickOutcome::Keep => {
                    // Dropped if something replaced it mid-tick.
                    let _ = self.live.attach(id, entity);
                }
                TickOutcome::Despawn => {
                    self.remove(id);
                    tracing::debug!(name = %entity.name, "building despawned");
                }
            }
        }

        for id in self.free.ids() {
            let Some(mut entity) = self.free.detach(id) else {
                continue;
            };
            let outcome = entity.tick(self, Placement::Free { id });
            match outcome {
                TickOutcome::Keep => {
                    let _ = self.free.attach(id, entity);
                }
                TickOutcome::Despawn => {
                    self.free.remove_tile(id);
                    tracing::debug!(name = %entity.name, "despawned");
                }
            }
        }

        self.tick += 1;
        tracing::trace!(tick = self.tick, "world ticked");
    }

    /// Run `n` ticks.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Hash of everything that affects future ticks, independent of arena
    /// ids.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.tick);
        hash.write_u64(self.rng.state());
        for (_, tile) in self.live.occupied() {
            hash.write_i32(tile.position.x);
            hash.write_i32(tile.position.y);
            tile.tileable.hash_into(&mut hash);
        }
        for (_, tile) in self.free.iter() {
            hash.write_fixed64(tile.position.x);
            hash.write_fixed64(tile.position.y);
            tile.tileable.hash_into(&mut hash);
        }
        hash.finish()
    }
}

/// Distinct ids currently under `entity`'s footprint at `pos`.
fn displaced(layer: &GridWorldLayer<Entity>, pos: GridPosition, entity: &Entity) -> Vec<EntityId> {
    let mut found: Vec<EntityId> = Vec::new();
    for cell in entity.footprint().tiles(pos) {
        if let Some(id) = layer.id_at(cell)
            && !found.contains(&id)
        {
            found.push(id);
        }
    }
    found
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("buildings", &self.live.occupied_count())
            .field("free", &self.free.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chest, small_world};

    #[test]
    fn commit_queue_is_all_or_nothing() {
        let mut world = small_world(2, 2);
        world.queue = GridWorldLayer::new(4, 4);
        world.queue_placement(GridPosition::new(0, 0), chest(5)).unwrap();
        world.queue_placement(GridPosition::new(3, 3), chest(5)).unwrap();

        let result = world.commit_queue();
        assert!(matches!(result, Err(SpatialError::OutOfBounds { .. })));
        assert_eq!(world.queue.occupied_count(), 2);
        assert_eq!(world.live.occupied_count(), 0);
    }
}
