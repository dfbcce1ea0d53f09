//! The resolved catalog and the entity factory built on it.
//!
//! [`Catalog::new`] checks names and resolves every definition once, so a
//! catalog that loads can build all of its entries. Directions are resolved
//! per call because they depend on the rotation the building is placed with.

use std::collections::BTreeMap;

use gridfab_core::counter::ReadyCounter;
use gridfab_core::fixed::f64_to_fixed64;
use gridfab_core::material::MaterialStorage;
use gridfab_core::resource::{Count, Resource};
use gridfab_core::rotation::Rotation;
use gridfab_engine::combat::{ProjectileSpec, Strike, Turret, TurretFire, Walk};
use gridfab_engine::transport::{LiquidTransport, MaterialTransport};
use gridfab_engine::{Attribute, Buildable, Entity};
use gridfab_fluid::{CoolantStorage, LiquidStorage};
use gridfab_power::{PowerPriority, PowerStorage};
use gridfab_spatial::Footprint;

use crate::loader::DataError;
use crate::schema::*;

/// Building and mob definitions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    buildings: BTreeMap<String, BuildingData>,
    mobs: BTreeMap<String, MobData>,
}

impl Catalog {
    /// Index `data` by name and check that every entry resolves.
    pub fn new(data: CatalogData) -> Result<Self, DataError> {
        let mut catalog = Catalog::default();
        for building in data.buildings {
            if catalog.buildings.contains_key(&building.name) {
                return Err(DataError::DuplicateName {
                    kind: "building",
                    name: building.name,
                });
            }
            build_building(&building, Rotation::Up)?;
            if building.construction.is_some() {
                build_blueprint(&building, Rotation::Up)?;
            }
            catalog.buildings.insert(building.name.clone(), building);
        }
        for mob in data.mobs {
            if catalog.mobs.contains_key(&mob.name) {
                return Err(DataError::DuplicateName {
                    kind: "mob",
                    name: mob.name,
                });
            }
            build_mob(&mob)?;
            catalog.mobs.insert(mob.name.clone(), mob);
        }
        Ok(catalog)
    }

    pub fn building_names(&self) -> impl Iterator<Item = &str> {
        self.buildings.keys().map(String::as_str)
    }

    pub fn mob_names(&self) -> impl Iterator<Item = &str> {
        self.mobs.keys().map(String::as_str)
    }

    pub fn building_data(&self, name: &str) -> Option<&BuildingData> {
        self.buildings.get(name)
    }

    pub fn mob_data(&self, name: &str) -> Option<&MobData> {
        self.mobs.get(name)
    }

    /// A finished building facing `rotation`.
    pub fn building(&self, name: &str, rotation: Rotation) -> Result<Entity, DataError> {
        build_building(self.lookup_building(name)?, rotation)
    }

    /// The building as a construction site when it has a cost, otherwise
    /// finished.
    pub fn blueprint(&self, name: &str, rotation: Rotation) -> Result<Entity, DataError> {
        build_blueprint(self.lookup_building(name)?, rotation)
    }

    pub fn mob(&self, name: &str) -> Result<Entity, DataError> {
        let data = self.mobs.get(name).ok_or_else(|| DataError::UnknownEntry {
            kind: "mob",
            name: name.to_string(),
        })?;
        build_mob(data)
    }

    fn lookup_building(&self, name: &str) -> Result<&BuildingData, DataError> {
        self.buildings.get(name).ok_or_else(|| DataError::UnknownEntry {
            kind: "building",
            name: name.to_string(),
        })
    }
}

// ===========================================================================
// Entity construction
// ===========================================================================

fn build_building(data: &BuildingData, rotation: Rotation) -> Result<Entity, DataError> {
    let owner = data.name.as_str();
    if data.size.width == 0 || data.size.height == 0 {
        return Err(invalid(owner, "size must be at least 1x1"));
    }
    let size = Footprint::new(data.size.width, data.size.height);
    let mut entity = Entity::building(owner, size, rotation);

    if let Some(material) = &data.material {
        entity = entity.with_material(material_storage(owner, material, rotation)?);
    }
    if let Some(liquid) = &data.liquid {
        entity = entity.with_liquid(liquid_storage(owner, liquid, rotation)?);
    }
    if let Some(power) = &data.power {
        let priority = match power.priority {
            PriorityData::Produce => PowerPriority::Produce,
            PriorityData::Storage => PowerPriority::Storage,
            PriorityData::Consume => PowerPriority::Consume,
        };
        let storage = PowerStorage::new(power.capacity, priority).map_err(|e| invalid(owner, e))?;
        entity = entity.with_power(storage);
    }
    if let Some(capacity) = data.coolant {
        entity = entity.with_coolant(CoolantStorage::new(capacity).map_err(|e| invalid(owner, e))?);
    }
    if let Some(range) = data.conduct {
        entity = entity.with_conduct(range);
    }
    if let Some(health) = data.health {
        if health <= 0 {
            return Err(invalid(owner, "health must be positive"));
        }
        entity = entity.with_health(health);
    }
    for chain in &data.chains {
        entity = entity.with_chain(attributes(owner, chain, rotation)?);
    }
    Ok(entity)
}

fn build_blueprint(data: &BuildingData, rotation: Rotation) -> Result<Entity, DataError> {
    let entity = build_building(data, rotation)?;
    let Some(construction) = &data.construction else {
        return Ok(entity);
    };
    let cost = counts(&data.name, &construction.cost)?;
    if cost.iter().any(|c| c.resource().is_liquid()) {
        return Err(invalid(&data.name, "construction cost must be materials"));
    }
    let buildable = Buildable::new(cost, construction.steps).map_err(|e| invalid(&data.name, e))?;
    Ok(entity.under_construction(buildable))
}

fn build_mob(data: &MobData) -> Result<Entity, DataError> {
    if data.health <= 0 {
        return Err(invalid(&data.name, "health must be positive"));
    }
    let mut entity = Entity::mob(data.name.as_str()).with_health(data.health);
    for chain in &data.chains {
        entity = entity.with_chain(attributes(&data.name, chain, Rotation::Up)?);
    }
    Ok(entity)
}

// ===========================================================================
// Storages
// ===========================================================================

fn material_storage(owner: &str, data: &MaterialData, rotation: Rotation) -> Result<MaterialStorage, DataError> {
    let mut storage = MaterialStorage::new(data.capacity)
        .map_err(|e| invalid(owner, e))?
        .with_inputs(resolve_facings(data.inputs.as_deref(), rotation));
    if !data.only.is_empty() {
        let only = data
            .only
            .iter()
            .map(|name| resource(owner, name))
            .collect::<Result<Vec<_>, _>>()?;
        storage = storage.only(&only).map_err(|e| invalid(owner, e))?;
    }
    for (name, limit) in &data.limits {
        storage = storage
            .with_limit(resource(owner, name)?, *limit)
            .map_err(|e| invalid(owner, e))?;
    }
    Ok(storage)
}

fn liquid_storage(owner: &str, data: &LiquidData, rotation: Rotation) -> Result<LiquidStorage, DataError> {
    let mut tank = LiquidStorage::new(data.max)
        .map_err(|e| invalid(owner, e))?
        .with_inputs(resolve_facings(data.inputs.as_deref(), rotation));
    if !data.allowed.is_empty() {
        let allowed = data
            .allowed
            .iter()
            .map(|name| resource(owner, name))
            .collect::<Result<Vec<_>, _>>()?;
        tank = tank.allowing(&allowed).map_err(|e| invalid(owner, e))?;
    }
    Ok(tank)
}

// ===========================================================================
// Attributes
// ===========================================================================

fn attributes(owner: &str, chain: &[AttributeData], rotation: Rotation) -> Result<Vec<Attribute>, DataError> {
    if chain.is_empty() {
        return Err(invalid(owner, "empty chain"));
    }
    chain.iter().map(|data| attribute(owner, data, rotation)).collect()
}

fn attribute(owner: &str, data: &AttributeData, rotation: Rotation) -> Result<Attribute, DataError> {
    let attribute = match data {
        AttributeData::Timer(period) => Attribute::timer(*period),
        AttributeData::Reload { ticks, ready } => {
            if *ready {
                Attribute::Reload(ReadyCounter::ready(*ticks))
            } else {
                Attribute::reload(*ticks)
            }
        }
        AttributeData::ConsumeMaterial(list) => Attribute::ConsumeMaterial(materials(owner, list)?),
        AttributeData::ProduceMaterial(list) => Attribute::ProduceMaterial(materials(owner, list)?),
        AttributeData::Extract(quantity) => {
            if *quantity == 0 {
                return Err(invalid(owner, "extract quantity must be positive"));
            }
            Attribute::Extract(*quantity)
        }
        AttributeData::ConsumeLiquid(pair) => Attribute::ConsumeLiquid(liquid(owner, pair)?),
        AttributeData::ProduceLiquid(pair) => Attribute::ProduceLiquid(liquid(owner, pair)?),
        AttributeData::ConsumePower(amount) => Attribute::ConsumePower(*amount),
        AttributeData::ProducePower(amount) => Attribute::ProducePower(*amount),
        AttributeData::ConsumeCoolant(amount) => Attribute::ConsumeCoolant(*amount),
        AttributeData::ProduceCoolant(amount) => Attribute::ProduceCoolant(*amount),
        AttributeData::TransportMaterial {
            outputs,
            resources,
            batch,
        } => {
            let allowed = resources
                .iter()
                .map(|name| resource(owner, name))
                .collect::<Result<Vec<_>, _>>()?;
            Attribute::TransportMaterial(
                MaterialTransport::new(resolve_facings(Some(outputs.as_slice()), rotation), *batch).only(&allowed),
            )
        }
        AttributeData::Junction => Attribute::Junction,
        AttributeData::TransportLiquid { outputs, rate } => Attribute::TransportLiquid(LiquidTransport::new(
            resolve_facings(Some(outputs.as_slice()), rotation),
            *rate,
        )),
        AttributeData::Turret {
            range,
            damage,
            max_targets,
            projectile,
        } => {
            let fire = match projectile {
                None => TurretFire::Direct,
                Some(p) => TurretFire::Projectile(ProjectileSpec {
                    speed: f64_to_fixed64(p.speed),
                    lifetime: p.lifetime,
                    radius: f64_to_fixed64(p.radius),
                    damage: p.damage,
                    max_targets: p.max_targets,
                }),
            };
            Attribute::Turret(Turret {
                range: f64_to_fixed64(*range),
                damage: *damage,
                max_targets: *max_targets,
                fire,
            })
        }
        AttributeData::Strike {
            range,
            damage,
            max_targets,
        } => Attribute::Strike(Strike {
            range: f64_to_fixed64(*range),
            damage: *damage,
            max_targets: *max_targets,
        }),
        AttributeData::Walk { speed, reach } => Attribute::Walk(Walk {
            speed: f64_to_fixed64(*speed),
            reach: f64_to_fixed64(*reach),
        }),
    };
    Ok(attribute)
}

// ===========================================================================
// Name resolution
// ===========================================================================

fn resource(owner: &str, name: &str) -> Result<Resource, DataError> {
    Resource::from_name(name).ok_or_else(|| DataError::UnknownResource {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

fn counts(owner: &str, list: &[CountData]) -> Result<Vec<Count>, DataError> {
    list.iter()
        .map(|(name, quantity)| {
            Count::try_new(resource(owner, name)?, *quantity).map_err(|e| invalid(owner, e))
        })
        .collect()
}

fn materials(owner: &str, list: &[CountData]) -> Result<Vec<Count>, DataError> {
    let resolved = counts(owner, list)?;
    if let Some(bad) = resolved.iter().find(|c| c.resource().is_liquid()) {
        return Err(invalid(owner, format!("{} is not a material", bad.resource())));
    }
    Ok(resolved)
}

fn liquid(owner: &str, pair: &CountData) -> Result<Count, DataError> {
    let resolved = counts(owner, std::slice::from_ref(pair))?;
    match resolved.first() {
        Some(count) if count.resource().is_liquid() => Ok(*count),
        Some(count) => Err(invalid(owner, format!("{} is not a liquid", count.resource()))),
        None => Err(invalid(owner, "missing liquid")),
    }
}

fn invalid(owner: &str, detail: impl ToString) -> DataError {
    DataError::Invalid {
        owner: owner.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfab_power::PowerConduct;

    fn catalog(json: &str) -> Result<Catalog, DataError> {
        let data: CatalogData = serde_json::from_str(json).unwrap();
        Catalog::new(data)
    }

    // -----------------------------------------------------------------------
    // Test 1: A full building definition builds every attribute
    // -----------------------------------------------------------------------
    #[test]
    fn builds_smelter() {
        let catalog = catalog(
            r#"{"buildings": [{
                "name": "smelter",
                "size": {"width": 2, "height": 1},
                "material": {"capacity": 20, "inputs": ["back"], "limits": [["iron", 10]]},
                "power": {"capacity": 50, "priority": "consume"},
                "conduct": 2,
                "health": 40,
                "chains": [[{"ConsumeMaterial": [["iron", 2]]}, {"ConsumePower": 5}, {"ProduceMaterial": [["steel", 1]]}]]
            }]}"#,
        )
        .unwrap();

        let smelter = catalog.building("smelter", Rotation::Right).unwrap();
        assert_eq!(smelter.name, "smelter");
        assert_eq!(smelter.rotation(), Rotation::Right);
        let storage = smelter.attribute::<MaterialStorage>().unwrap();
        assert_eq!(storage.capacity(), 20);
        assert_eq!(storage.limit(Resource::Iron), 10);
        assert!(storage.accepts(Rotation::Left));
        assert!(!storage.accepts(Rotation::Right));
        assert_eq!(
            smelter.attribute::<PowerStorage>().unwrap().priority(),
            PowerPriority::Consume
        );
        assert_eq!(smelter.attribute::<PowerConduct>().unwrap().range(), 2);
        assert_eq!(smelter.chains.len(), 1);
        assert_eq!(smelter.chains[0].links().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Test 2: Relative outputs follow the placement rotation
    // -----------------------------------------------------------------------
    #[test]
    fn transport_outputs_are_relative() {
        let catalog = catalog(
            r#"{"buildings": [{
                "name": "belt",
                "material": {"capacity": 3},
                "chains": [[{"TransportMaterial": {"outputs": ["front"]}}]]
            }]}"#,
        )
        .unwrap();

        for rotation in Rotation::ALL {
            let belt = catalog.building("belt", rotation).unwrap();
            match belt.find_attribute("TransportMaterial") {
                Some(Attribute::TransportMaterial(spec)) => {
                    assert_eq!(spec.outputs.to_vec(), vec![rotation]);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Test 3: Blueprints start under construction
    // -----------------------------------------------------------------------
    #[test]
    fn blueprint_carries_construction() {
        let catalog = catalog(
            r#"{"buildings": [{
                "name": "wall",
                "health": 100,
                "construction": {"cost": [["stone", 10]], "steps": 5}
            }]}"#,
        )
        .unwrap();

        assert!(!catalog.building("wall", Rotation::Up).unwrap().is_under_construction());
        let site = catalog.blueprint("wall", Rotation::Up).unwrap();
        let buildable = site.construction.as_ref().unwrap();
        assert_eq!(buildable.steps(), 5);
        assert_eq!(buildable.required(), &[Count::new(Resource::Stone, 10)]);
    }

    // -----------------------------------------------------------------------
    // Test 4: Mobs
    // -----------------------------------------------------------------------
    #[test]
    fn builds_mob() {
        let catalog = catalog(
            r#"{"mobs": [{
                "name": "zombie",
                "health": 12,
                "chains": [[{"Walk": {"speed": 0.5, "reach": 1.0}}, {"Reload": {"ticks": 3}}, {"Strike": {"range": 1.0, "damage": 2}}]]
            }]}"#,
        )
        .unwrap();

        let zombie = catalog.mob("zombie").unwrap();
        assert_eq!(zombie.kind, gridfab_engine::EntityKind::Mob);
        assert_eq!(zombie.attribute::<gridfab_engine::Health>().unwrap().max(), 12);
        assert!(zombie.find_attribute("Walk").is_some());
        assert!(matches!(catalog.mob("ghost"), Err(DataError::UnknownEntry { kind: "mob", .. })));
    }

    // -----------------------------------------------------------------------
    // Test 5: Resolution errors surface at load
    // -----------------------------------------------------------------------
    #[test]
    fn rejects_bad_definitions() {
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a"}, {"name": "a"}]}"#),
            Err(DataError::DuplicateName { kind: "building", .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "chains": [[{"ProduceMaterial": [["mithril", 1]]}]]}]}"#),
            Err(DataError::UnknownResource { .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "chains": [[{"ProduceMaterial": [["water", 1]]}]]}]}"#),
            Err(DataError::Invalid { .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "material": {"capacity": 0}}]}"#),
            Err(DataError::Invalid { .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "liquid": {"max": 5, "allowed": ["iron"]}}]}"#),
            Err(DataError::Invalid { .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "chains": [[{"ConsumeMaterial": [["iron", 0]]}]]}]}"#),
            Err(DataError::Invalid { .. })
        ));
        assert!(matches!(
            catalog(r#"{"buildings": [{"name": "a", "chains": [[]]}]}"#),
            Err(DataError::Invalid { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 6: Turret projectiles
    // -----------------------------------------------------------------------
    #[test]
    fn turret_with_projectile() {
        let catalog = catalog(
            r#"{"buildings": [{
                "name": "cannon",
                "chains": [[{"Reload": {"ticks": 10, "ready": true}}, {"Turret": {"range": 6.0, "damage": 0, "projectile": {"speed": 1.5, "lifetime": 8, "radius": 0.5, "damage": 9}}}]]
            }]}"#,
        )
        .unwrap();

        let cannon = catalog.building("cannon", Rotation::Up).unwrap();
        match cannon.find_attribute("Reload") {
            Some(Attribute::Reload(counter)) => assert!(counter.is_ready()),
            other => panic!("unexpected {other:?}"),
        }
        match cannon.find_attribute("Turret") {
            Some(Attribute::Turret(turret)) => match &turret.fire {
                TurretFire::Projectile(spec) => {
                    assert_eq!(spec.lifetime, 8);
                    assert_eq!(spec.damage, 9);
                    assert_eq!(spec.max_targets, 1);
                }
                TurretFire::Direct => panic!("expected projectile fire"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
