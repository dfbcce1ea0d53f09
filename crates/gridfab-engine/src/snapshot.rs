//! Saving and loading worlds.
//!
//! A [`WorldSnapshot`] lists every layer as plain records (anchor plus
//! entity) so it can be rebuilt into fresh arenas. Two encodings:
//!
//! - binary via `bitcode`, with a header carrying a magic number and
//!   format version;
//! - JSON, where records carrying an unknown enum tag are skipped and
//!   reported instead of failing the whole load.
//!
//! Conduction links and the mob target cache are not saved; both are
//! rebuilt on the first tick after loading.

use gridfab_core::rng::SimRng;
use gridfab_spatial::{FreePosition, GridPosition, SpatialError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attribute::Attribute;
use crate::entity::{Entity, EntityKind};
use crate::world::{Terrain, World, WorldConfig};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a GridFab world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x6F1D_FAB1;

/// Current format version. Snapshots from any other version are rejected.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {0} to be a JSON {1}")]
    Malformed(&'static str, &'static str),
    #[error("unknown {kind} tag `{tag}`")]
    UnknownTag { kind: &'static str, tag: String },
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Records skipped while loading.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub skipped: Vec<SnapshotError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count when the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRecord {
    pub position: GridPosition,
    pub terrain: Terrain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub anchor: GridPosition,
    pub entity: Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeRecord {
    pub position: FreePosition,
    pub entity: Entity,
}

/// Everything needed to resume a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub header: SnapshotHeader,
    pub config: WorldConfig,
    pub rng: SimRng,
    pub terrain: Vec<TerrainRecord>,
    pub live: Vec<GridRecord>,
    pub queue: Vec<GridRecord>,
    pub free: Vec<FreeRecord>,
}

// ---------------------------------------------------------------------------
// World conversion
// ---------------------------------------------------------------------------

impl World {
    pub fn to_snapshot(&self) -> WorldSnapshot {
        let grid_records = |layer: &gridfab_spatial::GridWorldLayer<Entity>| {
            layer
                .occupied()
                .into_iter()
                .map(|(_, tile)| GridRecord {
                    anchor: tile.position,
                    entity: tile.tileable.clone(),
                })
                .collect()
        };
        WorldSnapshot {
            header: SnapshotHeader::new(self.tick),
            config: self.config.clone(),
            rng: self.rng.clone(),
            terrain: self
                .terrain
                .occupied()
                .into_iter()
                .map(|(_, tile)| TerrainRecord {
                    position: tile.position,
                    terrain: tile.tileable,
                })
                .collect(),
            live: grid_records(&self.live),
            queue: grid_records(&self.queue),
            free: self
                .free
                .iter()
                .map(|(_, tile)| FreeRecord {
                    position: tile.position,
                    entity: tile.tileable.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a world. Entities keep their stored state as-is.
    pub fn from_snapshot(snapshot: WorldSnapshot) -> Result<World, SnapshotError> {
        snapshot.header.validate()?;
        let mut world = World::new(snapshot.config);
        world.rng = snapshot.rng;
        world.tick = snapshot.header.tick;
        for record in snapshot.terrain {
            world.terrain.replace_tileable(record.position, record.terrain)?;
        }
        for record in snapshot.live {
            world.live.replace_tileable(record.anchor, record.entity)?;
        }
        for record in snapshot.queue {
            world.queue.replace_tileable(record.anchor, record.entity)?;
        }
        for record in snapshot.free {
            world.free.add_tileable(record.position, record.entity);
        }
        Ok(world)
    }

    /// Encode with `bitcode`.
    pub fn serialize(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(&self.to_snapshot()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode a `bitcode` snapshot, validating its header.
    pub fn deserialize(data: &[u8]) -> Result<World, SnapshotError> {
        let snapshot: WorldSnapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        World::from_snapshot(snapshot)
    }

    pub fn save_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Load a JSON snapshot. Records with an unknown terrain, entity kind
    /// or attribute tag, or an unknown variant of any enum nested inside
    /// them, are left out and listed in the report; anything else that
    /// fails to parse aborts the load.
    pub fn load_json(json: &str) -> Result<(World, LoadReport), SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(mut root) = value else {
            return Err(SnapshotError::Malformed("snapshot", "object"));
        };
        let header: SnapshotHeader = serde_json::from_value(take(&mut root, "header"))?;
        header.validate()?;

        let mut report = LoadReport::default();
        let snapshot = WorldSnapshot {
            header,
            config: serde_json::from_value(take(&mut root, "config"))?,
            rng: serde_json::from_value(take(&mut root, "rng"))?,
            terrain: records(take(&mut root, "terrain"), "terrain", &mut report, check_terrain)?,
            live: records(take(&mut root, "live"), "live", &mut report, check_entity_record)?,
            queue: records(take(&mut root, "queue"), "queue", &mut report, check_entity_record)?,
            free: records(take(&mut root, "free"), "free", &mut report, check_entity_record)?,
        };
        let world = World::from_snapshot(snapshot)?;
        Ok((world, report))
    }
}

// ---------------------------------------------------------------------------
// JSON tag validation
// ---------------------------------------------------------------------------

fn take(root: &mut Map<String, Value>, key: &str) -> Value {
    root.remove(key).unwrap_or(Value::Null)
}

/// The variant name of an externally tagged enum value.
fn tag_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(tag) => Some(tag),
        Value::Object(map) if map.len() == 1 => map.keys().next().map(String::as_str),
        _ => None,
    }
}

fn check_tag(value: &Value, kind: &'static str, known: &[&str]) -> Result<(), SnapshotError> {
    match tag_of(value) {
        Some(tag) if !known.contains(&tag) => Err(SnapshotError::UnknownTag {
            kind,
            tag: tag.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_terrain(record: &Value) -> Result<(), SnapshotError> {
    check_tag(&record["terrain"], "terrain", &Terrain::TAGS)
}

fn check_entity_record(record: &Value) -> Result<(), SnapshotError> {
    let entity = &record["entity"];
    check_tag(&entity["kind"], "entity kind", &EntityKind::TAGS)?;
    if let Some(chains) = entity["chains"].as_array() {
        for chain in chains {
            for link in chain["links"].as_array().into_iter().flatten() {
                check_tag(link, "attribute", &Attribute::TAGS)?;
            }
        }
    }
    Ok(())
}

/// Parse an array of records, skipping those `check` rejects.
fn records<T: DeserializeOwned>(
    value: Value,
    layer: &'static str,
    report: &mut LoadReport,
    check: fn(&Value) -> Result<(), SnapshotError>,
) -> Result<Vec<T>, SnapshotError> {
    let Value::Array(items) = value else {
        return Err(SnapshotError::Malformed(layer, "array"));
    };
    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if let Err(err) = check(&item) {
            tracing::warn!(layer, index, error = %err, "skipping snapshot record");
            report.skipped.push(err);
            continue;
        }
        match serde_json::from_value(item) {
            Ok(record) => parsed.push(record),
            Err(err) => {
                let Some(tag) = unknown_variant(&err) else {
                    return Err(err.into());
                };
                let err = SnapshotError::UnknownTag { kind: "nested", tag };
                tracing::warn!(layer, index, error = %err, "skipping snapshot record");
                report.skipped.push(err);
            }
        }
    }
    Ok(parsed)
}

/// The tag named by a serde "unknown variant" error. Covers enums nested
/// anywhere inside a record (resources, rotations, priorities, fire modes).
fn unknown_variant(err: &serde_json::Error) -> Option<String> {
    let message = err.to_string();
    let rest = message.strip_prefix("unknown variant `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
