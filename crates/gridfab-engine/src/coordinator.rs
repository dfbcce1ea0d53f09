//! Shared mob targeting.

use gridfab_core::id::EntityId;
use gridfab_spatial::{FreePosition, GridWorldLayer, Tileable};

use crate::entity::{Entity, EntityKind};

/// Caches where the buildings are so every mob need not scan the grid.
///
/// The cache is rebuilt every `target_refresh_interval` ticks and is not
/// saved: a loaded world rebuilds it on its first tick.
#[derive(Debug, Clone, Default)]
pub struct MobCoordinator {
    targets: Vec<(EntityId, FreePosition)>,
    refreshed_at: Option<u64>,
}

impl MobCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the cache is missing or at least `interval` ticks old.
    pub fn is_due(&self, tick: u64, interval: u64) -> bool {
        match self.refreshed_at {
            None => true,
            Some(at) => tick.saturating_sub(at) >= interval,
        }
    }

    /// Rebuild from the buildings on `layer`, in row-major anchor order.
    pub fn refresh(&mut self, layer: &GridWorldLayer<Entity>, tick: u64) {
        self.targets = layer
            .occupied()
            .into_iter()
            .filter(|(_, tile)| tile.tileable.kind == EntityKind::Building)
            .map(|(id, tile)| (id, tile.tileable.footprint().center(tile.position)))
            .collect();
        self.refreshed_at = Some(tick);
    }

    /// Drop a destroyed building.
    pub fn forget(&mut self, id: EntityId) {
        self.targets.retain(|(target, _)| *target != id);
    }

    /// Mark the cache stale.
    pub fn invalidate(&mut self) {
        self.refreshed_at = None;
    }

    pub fn targets(&self) -> &[(EntityId, FreePosition)] {
        &self.targets
    }

    /// The closest cached target. Ties go to the earlier target.
    pub fn nearest(&self, from: FreePosition) -> Option<FreePosition> {
        let mut best: Option<(FreePosition, _)> = None;
        for (_, position) in &self.targets {
            let d2 = from.distance_squared(position);
            if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                best = Some((*position, d2));
            }
        }
        best.map(|(position, _)| position)
    }
}
