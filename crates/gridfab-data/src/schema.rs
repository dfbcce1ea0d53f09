//! Serde data file structs for catalog definitions.
//!
//! These structs define the on-disk format for buildings and mobs. They are
//! deserialized from RON, JSON, or TOML and then resolved into engine
//! `Entity` values by the [`Catalog`](crate::catalog::Catalog).
//!
//! Resources are referenced by their lower-case names (`"iron"`,
//! `"water"`). Directions are written relative to the building's facing
//! and resolved when the building is placed with a rotation.

use gridfab_core::rotation::{Rotation, RotationSet};
use serde::Deserialize;

/// `(resource name, quantity)`.
pub type CountData = (String, u32);

// ===========================================================================
// Catalog
// ===========================================================================

/// Everything a catalog file may define.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
    #[serde(default)]
    pub mobs: Vec<MobData>,
}

// ===========================================================================
// Directions
// ===========================================================================

/// A direction relative to the owning building's rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Front,
    Right,
    Back,
    Left,
}

impl Facing {
    /// The absolute direction for a building facing `rotation`.
    pub fn resolve(self, rotation: Rotation) -> Rotation {
        let steps = match self {
            Facing::Front => 0,
            Facing::Right => 1,
            Facing::Back => 2,
            Facing::Left => 3,
        };
        rotation.shift(steps)
    }
}

/// Resolve a facing list; `None` means every direction.
pub fn resolve_facings(facings: Option<&[Facing]>, rotation: Rotation) -> RotationSet {
    match facings {
        None => RotationSet::ALL,
        Some(list) => list
            .iter()
            .fold(RotationSet::EMPTY, |set, f| set.with(f.resolve(rotation))),
    }
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    #[serde(default)]
    pub size: SizeData,
    #[serde(default)]
    pub material: Option<MaterialData>,
    #[serde(default)]
    pub liquid: Option<LiquidData>,
    #[serde(default)]
    pub power: Option<PowerData>,
    /// Coolant reservoir capacity.
    #[serde(default)]
    pub coolant: Option<u32>,
    /// Conduction range in cells.
    #[serde(default)]
    pub conduct: Option<u32>,
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub chains: Vec<Vec<AttributeData>>,
    #[serde(default)]
    pub construction: Option<ConstructionData>,
}

/// Unrotated footprint size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SizeData {
    pub width: u32,
    pub height: u32,
}

impl Default for SizeData {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// Item storage.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialData {
    pub capacity: u32,
    /// Directions items may arrive from. Omitted means all.
    #[serde(default)]
    pub inputs: Option<Vec<Facing>>,
    /// Restrict storage to these resources.
    #[serde(default)]
    pub only: Vec<String>,
    /// Per-resource caps below `capacity`.
    #[serde(default)]
    pub limits: Vec<CountData>,
}

/// Liquid tank.
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidData {
    pub max: u32,
    /// Liquids the tank may hold. Empty means any.
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub inputs: Option<Vec<Facing>>,
}

/// Power buffer.
#[derive(Debug, Clone, Deserialize)]
pub struct PowerData {
    pub capacity: u32,
    #[serde(default)]
    pub priority: PriorityData,
}

/// Power priority class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityData {
    Produce,
    #[default]
    Storage,
    Consume,
}

/// Staged construction cost.
#[derive(Debug, Clone, Deserialize)]
pub struct ConstructionData {
    pub cost: Vec<CountData>,
    pub steps: u32,
}

// ===========================================================================
// Mobs
// ===========================================================================

/// A mob definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct MobData {
    pub name: String,
    pub health: i32,
    #[serde(default)]
    pub chains: Vec<Vec<AttributeData>>,
}

// ===========================================================================
// Attributes
// ===========================================================================

/// A chain attribute as written in a data file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum AttributeData {
    Timer(u32),
    Reload {
        ticks: u32,
        /// Start charged so the first attempt succeeds.
        #[serde(default)]
        ready: bool,
    },
    ConsumeMaterial(Vec<CountData>),
    ProduceMaterial(Vec<CountData>),
    Extract(u32),
    ConsumeLiquid(CountData),
    ProduceLiquid(CountData),
    ConsumePower(u32),
    ProducePower(u32),
    ConsumeCoolant(u32),
    ProduceCoolant(u32),
    TransportMaterial {
        outputs: Vec<Facing>,
        #[serde(default)]
        resources: Vec<String>,
        #[serde(default = "default_one")]
        batch: u32,
    },
    Junction,
    TransportLiquid {
        outputs: Vec<Facing>,
        rate: u32,
    },
    Turret {
        range: f64,
        damage: i32,
        #[serde(default = "default_one")]
        max_targets: u32,
        #[serde(default)]
        projectile: Option<ProjectileData>,
    },
    Strike {
        range: f64,
        damage: i32,
        #[serde(default = "default_one")]
        max_targets: u32,
    },
    Walk {
        speed: f64,
        reach: f64,
    },
}

/// What a turret launches instead of hitting directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectileData {
    pub speed: f64,
    pub lifetime: u32,
    pub radius: f64,
    pub damage: i32,
    #[serde(default = "default_one")]
    pub max_targets: u32,
}

fn default_one() -> u32 {
    1
}

// ===========================================================================
// TOML wrappers (TOML does not support top-level arrays)
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TomlBuildings {
    pub buildings: Vec<BuildingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlMobs {
    pub mobs: Vec<MobData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facings_resolve_against_rotation() {
        assert_eq!(Facing::Front.resolve(Rotation::Right), Rotation::Right);
        assert_eq!(Facing::Back.resolve(Rotation::Right), Rotation::Left);
        assert_eq!(Facing::Right.resolve(Rotation::Up), Rotation::Right);
        assert_eq!(Facing::Left.resolve(Rotation::Up), Rotation::Left);
        assert_eq!(Facing::Left.resolve(Rotation::Down), Rotation::Right);
    }

    #[test]
    fn missing_facings_mean_all() {
        assert_eq!(resolve_facings(None, Rotation::Up), RotationSet::ALL);
        let set = resolve_facings(Some(&[Facing::Front, Facing::Back]), Rotation::Up);
        assert!(set.contains(Rotation::Up));
        assert!(set.contains(Rotation::Down));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn building_defaults_from_json() {
        let data: BuildingData = serde_json::from_str(r#"{"name": "crate"}"#).unwrap();
        assert_eq!(data.size, SizeData::default());
        assert!(data.material.is_none());
        assert!(data.chains.is_empty());
    }

    #[test]
    fn attribute_variants_from_json() {
        let chain: Vec<AttributeData> = serde_json::from_str(
            r#"[
                {"Timer": 3},
                {"Reload": {"ticks": 4}},
                {"ConsumeMaterial": [["iron", 2]]},
                {"TransportMaterial": {"outputs": ["front"]}},
                "Junction"
            ]"#,
        )
        .unwrap();
        assert_eq!(chain[0], AttributeData::Timer(3));
        assert_eq!(
            chain[1],
            AttributeData::Reload {
                ticks: 4,
                ready: false
            }
        );
        assert_eq!(
            chain[2],
            AttributeData::ConsumeMaterial(vec![("iron".to_string(), 2)])
        );
        assert_eq!(
            chain[3],
            AttributeData::TransportMaterial {
                outputs: vec![Facing::Front],
                resources: vec![],
                batch: 1
            }
        );
        assert_eq!(chain[4], AttributeData::Junction);
    }

    #[test]
    fn attribute_chain_from_ron() {
        let chain: Vec<AttributeData> = ron::from_str(
            r#"[Timer(2), Extract(1), TransportLiquid(outputs: [front, left], rate: 5)]"#,
        )
        .unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain[2],
            AttributeData::TransportLiquid {
                outputs: vec![Facing::Front, Facing::Left],
                rate: 5
            }
        );
    }
}
