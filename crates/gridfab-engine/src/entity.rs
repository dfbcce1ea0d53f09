//! Entities: everything that occupies the grid or moves across it.
//!
//! An entity is a bag of state (the [`AttributeTable`]) plus ordered
//! [`Chain`]s of behaviour that read and write that state. Buildings,
//! mobs and projectiles are all the same type; the [`EntityKind`] tag only
//! decides how other entities treat them (turrets shoot mobs, mobs strike
//! buildings).

use gridfab_core::material::MaterialStorage;
use gridfab_core::rotation::Rotation;
use gridfab_core::sim::StateHash;
use gridfab_fluid::{CoolantStorage, LiquidStorage};
use gridfab_power::{PowerConduct, PowerStorage, take_power};
use gridfab_spatial::{Footprint, Tileable};
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::buildable::{BuildProgress, Buildable};
use crate::chain::Chain;
use crate::conduct::{self, LiveGraph};
use crate::context::{Placement, TickContext};
use crate::health::Health;
use crate::world::World;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// The placeholder filling unused grid cells.
    #[default]
    Empty,
    Building,
    Mob,
    Projectile,
}

impl EntityKind {
    /// Serialized discriminants, in declaration order.
    pub const TAGS: [&'static str; 4] = ["Empty", "Building", "Mob", "Projectile"];

    pub fn tag(self) -> &'static str {
        Self::TAGS[self as usize]
    }
}

// ---------------------------------------------------------------------------
// Attribute table
// ---------------------------------------------------------------------------

/// Per-entity state shared by its chains. Each slot holds at most one
/// value of its type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    pub material: Option<MaterialStorage>,
    pub liquid: Option<LiquidStorage>,
    pub power: Option<PowerStorage>,
    pub coolant: Option<CoolantStorage>,
    pub conduct: Option<PowerConduct>,
    pub health: Option<Health>,
}

/// A type that has a slot in the [`AttributeTable`].
pub trait TableAttribute: Sized {
    fn get(table: &AttributeTable) -> Option<&Self>;
    fn get_mut(table: &mut AttributeTable) -> Option<&mut Self>;
}

macro_rules! table_attribute {
    ($ty:ty, $field:ident) => {
        impl TableAttribute for $ty {
            fn get(table: &AttributeTable) -> Option<&Self> {
                table.$field.as_ref()
            }

            fn get_mut(table: &mut AttributeTable) -> Option<&mut Self> {
                table.$field.as_mut()
            }
        }
    };
}

table_attribute!(MaterialStorage, material);
table_attribute!(LiquidStorage, liquid);
table_attribute!(PowerStorage, power);
table_attribute!(CoolantStorage, coolant);
table_attribute!(PowerConduct, conduct);
table_attribute!(Health, health);

impl AttributeTable {
    pub fn get<T: TableAttribute>(&self) -> Option<&T> {
        T::get(self)
    }

    pub fn get_mut<T: TableAttribute>(&mut self) -> Option<&mut T> {
        T::get_mut(self)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// What the layer should do with an entity after its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Keep,
    Despawn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    size: Footprint,
    rotation: Rotation,
    pub attributes: AttributeTable,
    pub chains: Vec<Chain>,
    pub construction: Option<Buildable>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>, size: Footprint, rotation: Rotation) -> Self {
        Self {
            kind,
            name: name.into(),
            size,
            rotation,
            attributes: AttributeTable::default(),
            chains: Vec::new(),
            construction: None,
        }
    }

    pub fn building(name: impl Into<String>, size: Footprint, rotation: Rotation) -> Self {
        Self::new(EntityKind::Building, name, size, rotation)
    }

    pub fn mob(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Mob, name, Footprint::single(), Rotation::Up)
    }

    pub fn projectile(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Projectile, name, Footprint::single(), Rotation::Up)
    }

    pub fn with_material(mut self, storage: MaterialStorage) -> Self {
        self.attributes.material = Some(storage);
        self
    }

    pub fn with_liquid(mut self, storage: LiquidStorage) -> Self {
        self.attributes.liquid = Some(storage);
        self
    }

    pub fn with_power(mut self, storage: PowerStorage) -> Self {
        self.attributes.power = Some(storage);
        self
    }

    pub fn with_coolant(mut self, storage: CoolantStorage) -> Self {
        self.attributes.coolant = Some(storage);
        self
    }

    pub fn with_conduct(mut self, range: u32) -> Self {
        self.attributes.conduct = Some(PowerConduct::new(range));
        self
    }

    pub fn with_health(mut self, max: i32) -> Self {
        self.attributes.health = Some(Health::new(max));
        self
    }

    pub fn with_chain(mut self, links: Vec<Attribute>) -> Self {
        self.chains.push(Chain::new(links));
        self
    }

    pub fn under_construction(mut self, buildable: Buildable) -> Self {
        self.construction = Some(buildable);
        self
    }

    // -- Inspection --

    /// Unrotated size.
    pub fn size(&self) -> Footprint {
        self.size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_under_construction(&self) -> bool {
        self.construction.is_some()
    }

    /// Typed lookup into the attribute table.
    pub fn attribute<T: TableAttribute>(&self) -> Option<&T> {
        self.attributes.get::<T>()
    }

    pub fn attribute_mut<T: TableAttribute>(&mut self) -> Option<&mut T> {
        self.attributes.get_mut::<T>()
    }

    /// First chain attribute with the given tag.
    pub fn find_attribute(&self, tag: &str) -> Option<&Attribute> {
        self.chains
            .iter()
            .flat_map(|chain| chain.links())
            .find(|attribute| attribute.tag() == tag)
    }

    /// Where deliveries go: the construction supply while building,
    /// otherwise the material storage.
    pub fn material_input_mut(&mut self) -> Option<&mut MaterialStorage> {
        match &mut self.construction {
            Some(buildable) => Some(buildable.supply_mut()),
            None => self.attributes.material.as_mut(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.attributes.health.is_some_and(|h| h.is_dead())
    }

    // -- Simulation --

    /// Run one tick: health, construction, conduction, power draw, chains.
    pub fn tick(&mut self, world: &mut World, placement: Placement) -> TickOutcome {
        if self.is_dead() {
            return TickOutcome::Despawn;
        }

        if let Some(buildable) = &mut self.construction {
            if buildable.advance() == BuildProgress::Complete {
                tracing::debug!(name = %self.name, "construction complete");
                self.construction = None;
            }
            return TickOutcome::Keep;
        }

        let size = self.footprint();

        if let (Placement::Grid { id, anchor }, Some(conduct)) =
            (placement, self.attributes.conduct.as_mut())
        {
            conduct::refresh(world, id, anchor, size, conduct);
        }

        self.draw_power(world, placement);

        let mut ctx = TickContext {
            world,
            table: &mut self.attributes,
            placement,
            size,
            rotation: self.rotation,
            despawn: false,
        };
        for chain in &mut self.chains {
            chain.tick(&mut ctx);
        }
        let despawn = ctx.despawn;

        if despawn || self.is_dead() {
            TickOutcome::Despawn
        } else {
            TickOutcome::Keep
        }
    }

    /// Non-producer storages pull their deficit through the conduction
    /// graph.
    fn draw_power(&mut self, world: &mut World, placement: Placement) {
        let Placement::Grid { id, .. } = placement else {
            return;
        };
        let Some(storage) = self.attributes.power.as_mut() else {
            return;
        };
        let deficit = storage.deficit();
        if deficit == 0 {
            return;
        }
        let neighbours = self
            .attributes
            .conduct
            .as_ref()
            .map(PowerConduct::neighbours)
            .unwrap_or_default();
        let mut graph = LiveGraph::new(world.live_mut());
        let drawn = take_power(&mut graph, id, &neighbours, storage.priority(), deficit);
        storage.add(drawn);
    }

    /// Feed the simulation-relevant state into `hash`.
    pub fn hash_into(&self, hash: &mut StateHash) {
        hash.write(&[self.kind as u8]);
        hash.write(self.name.as_bytes());
        hash.write_rotation(self.rotation);
        if let Some(material) = &self.attributes.material {
            hash.write_u32(material.total());
            for (resource, rotation) in material.entries() {
                hash.write_resource(*resource);
                hash.write_rotation(*rotation);
            }
        }
        if let Some(count) = self.attributes.liquid.as_ref().and_then(LiquidStorage::current) {
            hash.write_count(count);
        }
        if let Some(power) = &self.attributes.power {
            hash.write_u32(power.quantity());
        }
        if let Some(coolant) = &self.attributes.coolant {
            hash.write_u32(coolant.quantity());
        }
        if let Some(health) = &self.attributes.health {
            hash.write_i32(health.current());
        }
        if let Some(buildable) = &self.construction {
            hash.write_u32(buildable.step());
            hash.write_u32(buildable.supply().total());
        }
        for chain in &self.chains {
            chain.hash_into(hash);
        }
    }
}

impl Tileable for Entity {
    fn footprint(&self) -> Footprint {
        self.size.rotated(self.rotation)
    }

    fn is_default(&self) -> bool {
        self.kind == EntityKind::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfab_core::test_utils::storage;
    use gridfab_power::PowerPriority;

    #[test]
    fn default_entity_is_the_placeholder() {
        let e = Entity::default();
        assert!(e.is_default());
        assert_eq!(e.footprint(), Footprint::single());
    }

    #[test]
    fn footprint_follows_rotation() {
        let e = Entity::building("smelter", Footprint::new(2, 3), Rotation::Right);
        assert_eq!(e.size(), Footprint::new(2, 3));
        assert_eq!(e.footprint(), Footprint::new(3, 2));
    }

    #[test]
    fn typed_lookup() {
        let e = Entity::building("battery", Footprint::single(), Rotation::Up)
            .with_material(storage(4))
            .with_power(PowerStorage::new(50, PowerPriority::Storage).unwrap())
            .with_health(30);

        assert_eq!(e.attribute::<MaterialStorage>().map(|s| s.capacity()), Some(4));
        assert_eq!(e.attribute::<PowerStorage>().map(|p| p.capacity()), Some(50));
        assert_eq!(e.attribute::<Health>().map(|h| h.current()), Some(30));
        assert!(e.attribute::<LiquidStorage>().is_none());
        assert!(e.attribute::<PowerConduct>().is_none());
    }

    #[test]
    fn find_attribute_searches_chains() {
        let e = Entity::building("drill", Footprint::single(), Rotation::Up)
            .with_chain(vec![Attribute::timer(5), Attribute::Extract(1)]);
        assert!(e.find_attribute("Extract").is_some());
        assert!(e.find_attribute("Turret").is_none());
    }

    #[test]
    fn material_input_prefers_construction_supply() {
        let buildable = Buildable::new(vec![gridfab_core::test_utils::iron(2)], 1).unwrap();
        let mut e = Entity::building("wall", Footprint::single(), Rotation::Up)
            .with_material(storage(10))
            .under_construction(buildable);
        assert_eq!(e.material_input_mut().map(|s| s.capacity()), Some(2));
        e.construction = None;
        assert_eq!(e.material_input_mut().map(|s| s.capacity()), Some(10));
    }

    #[test]
    fn kind_tags_match_serde() {
        for (kind, tag) in [
            (EntityKind::Empty, "Empty"),
            (EntityKind::Building, "Building"),
            (EntityKind::Mob, "Mob"),
            (EntityKind::Projectile, "Projectile"),
        ] {
            assert_eq!(kind.tag(), tag);
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{tag}\""));
        }
    }
}
