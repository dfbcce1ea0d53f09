//! The closed set of chain attributes.
//!
//! Every attribute is all-or-nothing: it either does its whole job and
//! returns `true`, or changes nothing and returns `false` so the chain
//! retries it next tick.

use gridfab_core::counter::{CycleCounter, ReadyCounter};
use gridfab_core::material::MaterialStorage;
use gridfab_core::resource::Count;
use gridfab_core::sim::StateHash;
use serde::{Deserialize, Serialize};

use crate::combat::{Projectile, Strike, Turret, Walk};
use crate::context::TickContext;
use crate::transport::{self, LiquidTransport, MaterialTransport};
use crate::world::Terrain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    /// Succeeds once every `period` attempts.
    Timer(CycleCounter),
    /// Succeeds once charged; recharges when the chain completes.
    Reload(ReadyCounter),
    ConsumeMaterial(Vec<Count>),
    /// Produced items are tagged with the entity's rotation.
    ProduceMaterial(Vec<Count>),
    /// Mine this many units of the deposit under the footprint.
    Extract(u32),
    ConsumeLiquid(Count),
    ProduceLiquid(Count),
    ConsumePower(u32),
    ProducePower(u32),
    ConsumeCoolant(u32),
    ProduceCoolant(u32),
    TransportMaterial(MaterialTransport),
    /// Pass the newest stored item straight on in the direction it was
    /// travelling.
    Junction,
    TransportLiquid(LiquidTransport),
    Turret(Turret),
    Strike(Strike),
    Walk(Walk),
    Projectile(Projectile),
}

impl Attribute {
    /// Serialized discriminants, in declaration order.
    pub const TAGS: [&'static str; 18] = [
        "Timer",
        "Reload",
        "ConsumeMaterial",
        "ProduceMaterial",
        "Extract",
        "ConsumeLiquid",
        "ProduceLiquid",
        "ConsumePower",
        "ProducePower",
        "ConsumeCoolant",
        "ProduceCoolant",
        "TransportMaterial",
        "Junction",
        "TransportLiquid",
        "Turret",
        "Strike",
        "Walk",
        "Projectile",
    ];

    pub fn timer(period: u32) -> Self {
        Attribute::Timer(CycleCounter::new(period))
    }

    pub fn reload(length: u32) -> Self {
        Attribute::Reload(ReadyCounter::new(length))
    }

    pub fn tag(&self) -> &'static str {
        let index = match self {
            Attribute::Timer(_) => 0,
            Attribute::Reload(_) => 1,
            Attribute::ConsumeMaterial(_) => 2,
            Attribute::ProduceMaterial(_) => 3,
            Attribute::Extract(_) => 4,
            Attribute::ConsumeLiquid(_) => 5,
            Attribute::ProduceLiquid(_) => 6,
            Attribute::ConsumePower(_) => 7,
            Attribute::ProducePower(_) => 8,
            Attribute::ConsumeCoolant(_) => 9,
            Attribute::ProduceCoolant(_) => 10,
            Attribute::TransportMaterial(_) => 11,
            Attribute::Junction => 12,
            Attribute::TransportLiquid(_) => 13,
            Attribute::Turret(_) => 14,
            Attribute::Strike(_) => 15,
            Attribute::Walk(_) => 16,
            Attribute::Projectile(_) => 17,
        };
        Self::TAGS[index]
    }

    /// Attempt this attribute's work for one tick.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> bool {
        match self {
            Attribute::Timer(counter) => counter.tick(),
            Attribute::Reload(counter) => counter.prepare(),
            Attribute::ConsumeMaterial(counts) => {
                let Some(storage) = ctx.table.material.as_mut() else {
                    return false;
                };
                if !counts.iter().all(|c| storage.has(*c)) {
                    return false;
                }
                for count in counts.iter() {
                    storage.remove(*count);
                }
                true
            }
            Attribute::ProduceMaterial(counts) => {
                let rotation = ctx.rotation;
                let Some(storage) = ctx.table.material.as_mut() else {
                    return false;
                };
                if !fits_all(storage, counts) {
                    return false;
                }
                for count in counts.iter() {
                    storage.add(*count, rotation);
                }
                true
            }
            Attribute::Extract(quantity) => extract(ctx, *quantity),
            Attribute::ConsumeLiquid(count) => ctx
                .table
                .liquid
                .as_mut()
                .is_some_and(|tank| tank.consume(*count)),
            Attribute::ProduceLiquid(count) => {
                let Some(tank) = ctx.table.liquid.as_mut() else {
                    return false;
                };
                let fits = tank.allows(count.resource())
                    && tank.resident().is_none_or(|r| r == count.resource())
                    && tank.remaining() >= count.quantity();
                if fits {
                    tank.try_add(*count);
                }
                fits
            }
            Attribute::ConsumePower(amount) => {
                let Some(power) = ctx.table.power.as_mut() else {
                    return false;
                };
                if !power.has(*amount) {
                    return false;
                }
                power.remove(*amount);
                true
            }
            Attribute::ProducePower(amount) => {
                let Some(power) = ctx.table.power.as_mut() else {
                    return false;
                };
                if power.deficit() < *amount {
                    return false;
                }
                power.add(*amount);
                true
            }
            Attribute::ConsumeCoolant(amount) => {
                let Some(coolant) = ctx.table.coolant.as_mut() else {
                    return false;
                };
                if !coolant.has(*amount) {
                    return false;
                }
                coolant.remove(*amount);
                true
            }
            Attribute::ProduceCoolant(amount) => {
                let Some(coolant) = ctx.table.coolant.as_mut() else {
                    return false;
                };
                if coolant.remaining() < *amount {
                    return false;
                }
                coolant.add(*amount);
                true
            }
            Attribute::TransportMaterial(transport) => transport.tick(ctx),
            Attribute::Junction => transport::junction(ctx),
            Attribute::TransportLiquid(transport) => transport.tick(ctx),
            Attribute::Turret(turret) => turret.tick(ctx),
            Attribute::Strike(strike) => strike.tick(ctx),
            Attribute::Walk(walk) => walk.tick(ctx),
            Attribute::Projectile(projectile) => projectile.tick(ctx),
        }
    }

    /// Called on every attribute of a chain when the chain completes.
    pub fn reset(&mut self) {
        match self {
            Attribute::Reload(counter) => counter.reset(false),
            Attribute::Timer(_)
            | Attribute::ConsumeMaterial(_)
            | Attribute::ProduceMaterial(_)
            | Attribute::Extract(_)
            | Attribute::ConsumeLiquid(_)
            | Attribute::ProduceLiquid(_)
            | Attribute::ConsumePower(_)
            | Attribute::ProducePower(_)
            | Attribute::ConsumeCoolant(_)
            | Attribute::ProduceCoolant(_)
            | Attribute::TransportMaterial(_)
            | Attribute::Junction
            | Attribute::TransportLiquid(_)
            | Attribute::Turret(_)
            | Attribute::Strike(_)
            | Attribute::Walk(_)
            | Attribute::Projectile(_) => {}
        }
    }

    pub(crate) fn hash_into(&self, hash: &mut StateHash) {
        hash.write(self.tag().as_bytes());
        match self {
            Attribute::Timer(counter) => hash.write_u32(counter.position()),
            Attribute::Reload(counter) => hash.write_u32(counter.position()),
            Attribute::Projectile(projectile) => projectile.hash_into(hash),
            _ => {}
        }
    }
}

/// True when every count can be added to `storage` together.
fn fits_all(storage: &MaterialStorage, counts: &[Count]) -> bool {
    let total = counts
        .iter()
        .try_fold(storage.total(), |sum, c| sum.checked_add(c.quantity()));
    if total.is_none_or(|t| t > storage.capacity()) {
        return false;
    }
    counts.iter().all(|count| {
        let resource = count.resource();
        counts
            .iter()
            .filter(|c| c.resource() == resource)
            .try_fold(storage.quantity(resource), |sum, c| sum.checked_add(c.quantity()))
            .is_some_and(|t| t <= storage.limit(resource))
    })
}

/// Mine the first deposit under the footprint (x outer, y inner).
fn extract(ctx: &mut TickContext<'_>, quantity: u32) -> bool {
    let Some((_, anchor)) = ctx.grid() else {
        return false;
    };
    let deposit = ctx.size.tiles(anchor).find_map(|cell| {
        match ctx.world.terrain().get_tile(cell).map(|t| &t.tileable) {
            Some(Terrain::Deposit(resource)) => Some(*resource),
            _ => None,
        }
    });
    let Some(count) = deposit.and_then(|r| Count::try_new(r, quantity).ok()) else {
        return false;
    };
    let rotation = ctx.rotation;
    let Some(storage) = ctx.table.material.as_mut() else {
        return false;
    };
    if !storage.has_capacity(count) {
        return false;
    }
    storage.add(count, rotation);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfab_core::test_utils::{coal, iron};

    #[test]
    fn tags_cover_every_variant() {
        let samples = [
            Attribute::timer(1),
            Attribute::reload(1),
            Attribute::ConsumeMaterial(vec![iron(1)]),
            Attribute::ProduceMaterial(vec![iron(1)]),
            Attribute::Extract(1),
            Attribute::Junction,
        ];
        for attribute in &samples {
            let json = serde_json::to_value(attribute).unwrap();
            let tag = match &json {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Object(map) => map.keys().next().cloned().unwrap(),
                other => panic!("unexpected encoding {other}"),
            };
            assert_eq!(tag, attribute.tag());
            assert!(Attribute::TAGS.contains(&tag.as_str()));
        }
    }

    #[test]
    fn fits_all_counts_combined() {
        let storage = MaterialStorage::new(5).unwrap();
        assert!(fits_all(&storage, &[iron(2), coal(3)]));
        assert!(!fits_all(&storage, &[iron(3), coal(3)]));

        let limited = MaterialStorage::new(10)
            .unwrap()
            .with_limit(gridfab_core::resource::Resource::Iron, 3)
            .unwrap();
        assert!(!fits_all(&limited, &[iron(2), iron(2)]));
    }

    #[test]
    fn fits_all_rejects_overflowing_counts() {
        let mut storage = MaterialStorage::new(10).unwrap();
        storage.add(iron(1), gridfab_core::rotation::Rotation::Up);
        assert!(!fits_all(&storage, &[coal(u32::MAX)]));
        assert!(!fits_all(&storage, &[coal(u32::MAX), coal(u32::MAX)]));
        assert!(!fits_all(&storage, &[iron(1), iron(u32::MAX)]));
    }

    #[test]
    fn reset_recharges_reload() {
        let mut attribute = Attribute::reload(2);
        if let Attribute::Reload(counter) = &mut attribute {
            assert!(counter.prepare());
        }
        attribute.reset();
        match &attribute {
            Attribute::Reload(counter) => assert!(!counter.is_ready()),
            _ => unreachable!(),
        }
    }
}
