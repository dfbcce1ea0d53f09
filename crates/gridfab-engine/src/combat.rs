//! Targeting, damage and movement attributes.
//!
//! Targets are always collected nearest first (squared distance, ties in
//! layer order) and the first `max_targets` are hit.

use gridfab_core::fixed::{Fixed64, length};
use gridfab_core::id::{EntityId, FreeTileId};
use gridfab_core::sim::StateHash;
use gridfab_spatial::FreePosition;
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::context::TickContext;
use crate::entity::{Entity, EntityKind};
use crate::world::World;

// ---------------------------------------------------------------------------
// Target collection
// ---------------------------------------------------------------------------

/// Mobs within `range` of `center`, nearest first.
fn mobs_in_range(
    world: &World,
    center: FreePosition,
    range: Fixed64,
    max: u32,
) -> Vec<(FreeTileId, FreePosition)> {
    world
        .free()
        .within_range(center, range)
        .into_iter()
        .filter_map(|(id, _)| {
            let tile = world.free().get(id)?;
            (tile.tileable.kind == EntityKind::Mob).then_some((id, tile.position))
        })
        .take(max as usize)
        .collect()
}

/// Buildings whose centre lies within `range` of `center`, nearest first.
fn buildings_in_range(world: &World, center: FreePosition, range: Fixed64, max: u32) -> Vec<EntityId> {
    world
        .live()
        .within_range(center, range)
        .into_iter()
        .filter(|(id, _)| {
            world
                .live()
                .get(*id)
                .is_some_and(|t| t.tileable.kind == EntityKind::Building)
        })
        .map(|(id, _)| id)
        .take(max as usize)
        .collect()
}

// ---------------------------------------------------------------------------
// Turret
// ---------------------------------------------------------------------------

/// What a projectile does once launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Distance travelled per tick.
    pub speed: Fixed64,
    /// Ticks before the projectile expires.
    pub lifetime: u32,
    /// Hit radius around the projectile.
    pub radius: Fixed64,
    pub damage: i32,
    pub max_targets: u32,
}

impl ProjectileSpec {
    /// A projectile entity flying from `from` towards `to`.
    pub fn launch(&self, from: FreePosition, to: FreePosition) -> Entity {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let dist = length(dx, dy);
        let (vx, vy) = if dist == Fixed64::ZERO {
            (Fixed64::ZERO, Fixed64::ZERO)
        } else {
            (dx * self.speed / dist, dy * self.speed / dist)
        };
        Entity::projectile("projectile").with_chain(vec![Attribute::Projectile(Projectile {
            velocity_x: vx,
            velocity_y: vy,
            lifetime: self.lifetime.max(1),
            radius: self.radius,
            damage: self.damage,
            max_targets: self.max_targets,
        })])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurretFire {
    /// Damage is applied immediately.
    Direct,
    /// One projectile per target is spawned instead.
    Projectile(ProjectileSpec),
}

/// Attack mobs on the free layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turret {
    pub range: Fixed64,
    pub damage: i32,
    pub max_targets: u32,
    pub fire: TurretFire,
}

impl Turret {
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let center = ctx.center();
        let targets = mobs_in_range(ctx.world, center, self.range, self.max_targets);
        if targets.is_empty() {
            return false;
        }
        for (id, position) in targets {
            match &self.fire {
                TurretFire::Direct => {
                    ctx.world.damage_mob(id, self.damage);
                }
                TurretFire::Projectile(spec) => {
                    ctx.world.spawn(center, spec.launch(center, position));
                }
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Strike
// ---------------------------------------------------------------------------

/// Splash damage against buildings on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub range: Fixed64,
    pub damage: i32,
    pub max_targets: u32,
}

impl Strike {
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let center = ctx.center();
        let targets = buildings_in_range(ctx.world, center, self.range, self.max_targets);
        if targets.is_empty() {
            return false;
        }
        for id in targets {
            ctx.world.damage_building(id, self.damage);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// Move a mob towards the nearest building target. Succeeds once within
/// `reach` of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    pub speed: Fixed64,
    pub reach: Fixed64,
}

impl Walk {
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let Some(id) = ctx.free_id() else {
            return false;
        };
        let position = ctx.center();
        let Some(target) = ctx.world.coordinator().nearest(position) else {
            return false;
        };
        if position.within(&target, self.reach) {
            return true;
        }
        let next = position.toward(&target, self.speed);
        if ctx.world.free_mut().update_tile(id, next).is_err() {
            return false;
        }
        next.within(&target, self.reach)
    }
}

// ---------------------------------------------------------------------------
// Projectile
// ---------------------------------------------------------------------------

/// A flying projectile: moves every tick, hits mobs inside its radius and
/// despawns on impact or when its lifetime runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    pub velocity_x: Fixed64,
    pub velocity_y: Fixed64,
    /// Ticks left.
    pub lifetime: u32,
    pub radius: Fixed64,
    pub damage: i32,
    pub max_targets: u32,
}

impl Projectile {
    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let Some(id) = ctx.free_id() else {
            return false;
        };
        let position = ctx.center().offset(self.velocity_x, self.velocity_y);
        if ctx.world.free_mut().update_tile(id, position).is_err() {
            ctx.despawn = true;
            return false;
        }
        self.lifetime = self.lifetime.saturating_sub(1);

        let hits = mobs_in_range(ctx.world, position, self.radius, self.max_targets);
        if !hits.is_empty() {
            for (mob, _) in hits {
                ctx.world.damage_mob(mob, self.damage);
            }
            ctx.despawn = true;
            return true;
        }
        if self.lifetime == 0 {
            ctx.despawn = true;
        }
        false
    }

    pub(crate) fn hash_into(&self, hash: &mut StateHash) {
        hash.write_u32(self.lifetime);
        hash.write_fixed64(self.velocity_x);
        hash.write_fixed64(self.velocity_y);
    }
}
