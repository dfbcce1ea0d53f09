//! GridFab Engine -- entities, attribute chains and the world tick.
//!
//! # Key Types
//!
//! - [`World`] -- terrain, live, queue and free layers plus the RNG and
//!   tick counter. [`World::tick`] runs the whole simulation one step.
//! - [`Entity`] -- an [`AttributeTable`] of state plus [`Chain`]s of
//!   [`Attribute`]s that act on it.
//! - [`Buildable`] -- staged construction fed by transport.
//! - [`WorldSnapshot`] -- save/load in `bitcode` or JSON.
//!
//! Everything is single-threaded and deterministic: the only randomness is
//! the world's seeded [`SimRng`](gridfab_core::rng::SimRng).

pub mod attribute;
pub mod buildable;
pub mod chain;
pub mod combat;
mod conduct;
pub mod context;
pub mod coordinator;
pub mod entity;
pub mod health;
pub mod snapshot;
pub mod transport;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use attribute::Attribute;
pub use buildable::{BuildProgress, Buildable};
pub use chain::{Chain, ChainState};
pub use context::{Placement, TickContext};
pub use coordinator::MobCoordinator;
pub use entity::{AttributeTable, Entity, EntityKind, TableAttribute, TickOutcome};
pub use health::Health;
pub use snapshot::{LoadReport, SnapshotError, WorldSnapshot};
pub use world::{Terrain, World, WorldConfig};
