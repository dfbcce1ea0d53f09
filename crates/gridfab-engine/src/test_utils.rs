//! Shared fixtures for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use gridfab_core::fixed::Fixed64;
use gridfab_core::material::MaterialStorage;
use gridfab_core::resource::{Count, Resource};
use gridfab_core::rotation::{Rotation, RotationSet};
use gridfab_fluid::LiquidStorage;
use gridfab_power::{PowerPriority, PowerStorage};
use gridfab_spatial::Footprint;

use crate::attribute::Attribute;
use crate::combat::{Strike, Turret, TurretFire, Walk};
use crate::entity::Entity;
use crate::transport::{LiquidTransport, MaterialTransport};
use crate::world::{World, WorldConfig};

// ===========================================================================
// Worlds
// ===========================================================================

/// A world of the given size with a fixed seed.
pub fn small_world(width: u32, height: u32) -> World {
    World::new(WorldConfig {
        seed: 7,
        ..WorldConfig::sized(width, height)
    })
}

fn open_storage(capacity: u32) -> MaterialStorage {
    MaterialStorage::new(capacity).expect("fixture capacity must be positive")
}

// ===========================================================================
// Materials
// ===========================================================================

/// Mines one unit every other tick and pushes it out the front.
pub fn drill(rotation: Rotation) -> Entity {
    Entity::building("drill", Footprint::single(), rotation)
        .with_material(open_storage(10).with_inputs(RotationSet::EMPTY))
        .with_chain(vec![Attribute::timer(2), Attribute::Extract(1)])
        .with_chain(vec![Attribute::TransportMaterial(MaterialTransport::new(
            RotationSet::single(rotation),
            1,
        ))])
}

/// Carries one item per tick towards its front.
pub fn belt(rotation: Rotation) -> Entity {
    Entity::building("belt", Footprint::single(), rotation)
        .with_material(open_storage(3).with_inputs(RotationSet::all_but_back(rotation)))
        .with_chain(vec![Attribute::TransportMaterial(MaterialTransport::new(
            RotationSet::single(rotation),
            1,
        ))])
}

/// Passes items straight through in their travel direction.
pub fn junction() -> Entity {
    Entity::building("junction", Footprint::single(), Rotation::Up)
        .with_material(open_storage(4))
        .with_chain(vec![Attribute::Junction])
}

/// Turns two iron into one steel.
pub fn assembler() -> Entity {
    Entity::building("assembler", Footprint::single(), Rotation::Up)
        .with_material(open_storage(20))
        .with_chain(vec![
            Attribute::ConsumeMaterial(vec![Count::new(Resource::Iron, 2)]),
            Attribute::ProduceMaterial(vec![Count::new(Resource::Steel, 1)]),
        ])
}

/// A passive store accepting from every side.
pub fn chest(capacity: u32) -> Entity {
    Entity::building("chest", Footprint::single(), Rotation::Up).with_material(open_storage(capacity))
}

// ===========================================================================
// Liquids
// ===========================================================================

/// Produces water and pumps it forward.
pub fn pump(rotation: Rotation, rate: u32) -> Entity {
    Entity::building("pump", Footprint::single(), rotation)
        .with_liquid(LiquidStorage::new(20).expect("fixture tank"))
        .with_chain(vec![Attribute::ProduceLiquid(Count::new(Resource::Water, rate))])
        .with_chain(vec![Attribute::TransportLiquid(LiquidTransport::new(
            RotationSet::single(rotation),
            rate,
        ))])
}

pub fn tank(max: u32) -> Entity {
    Entity::building("tank", Footprint::single(), Rotation::Up)
        .with_liquid(LiquidStorage::new(max).expect("fixture tank"))
}

// ===========================================================================
// Power
// ===========================================================================

/// Produces `rate` power per tick into a buffer of `capacity`.
pub fn generator(capacity: u32, rate: u32) -> Entity {
    Entity::building("generator", Footprint::single(), Rotation::Up)
        .with_power(PowerStorage::new(capacity, PowerPriority::Produce).expect("fixture power"))
        .with_conduct(1)
        .with_chain(vec![Attribute::ProducePower(rate)])
}

pub fn battery(capacity: u32) -> Entity {
    Entity::building("battery", Footprint::single(), Rotation::Up)
        .with_power(PowerStorage::new(capacity, PowerPriority::Storage).expect("fixture power"))
        .with_conduct(1)
}

/// A conductor with no storage.
pub fn power_node(range: u32) -> Entity {
    Entity::building("node", Footprint::single(), Rotation::Up).with_conduct(range)
}

/// Burns `use_per_tick` power every tick it can.
pub fn lamp(capacity: u32, use_per_tick: u32) -> Entity {
    Entity::building("lamp", Footprint::single(), Rotation::Up)
        .with_power(PowerStorage::new(capacity, PowerPriority::Consume).expect("fixture power"))
        .with_conduct(1)
        .with_chain(vec![Attribute::ConsumePower(use_per_tick)])
}

// ===========================================================================
// Combat
// ===========================================================================

/// Shoots the nearest mob directly every `reload` ticks.
pub fn turret(range: f64, damage: i32, reload: u32) -> Entity {
    Entity::building("turret", Footprint::single(), Rotation::Up)
        .with_health(50)
        .with_chain(vec![
            Attribute::reload(reload),
            Attribute::Turret(Turret {
                range: Fixed64::from_num(range),
                damage,
                max_targets: 1,
                fire: TurretFire::Direct,
            }),
        ])
}

pub fn wall(health: i32) -> Entity {
    Entity::building("wall", Footprint::single(), Rotation::Up).with_health(health)
}

/// Walks to the nearest building and hits it every other tick.
pub fn zombie(health: i32, damage: i32) -> Entity {
    Entity::mob("zombie").with_health(health).with_chain(vec![
        Attribute::Walk(Walk {
            speed: Fixed64::from_num(1),
            reach: Fixed64::from_num(1),
        }),
        Attribute::reload(3),
        Attribute::Strike(Strike {
            range: Fixed64::from_num(1),
            damage,
            max_targets: 1,
        }),
    ])
}
