//! GridFab Data -- building and mob catalogs read from RON, TOML or JSON.
//!
//! [`load_catalog`] reads a directory holding `buildings.*` and optionally
//! `mobs.*`; [`Catalog`] then turns names into ready-to-place
//! [`Entity`](gridfab_engine::Entity) values. [`load_world_config`] reads a
//! [`WorldConfig`](gridfab_engine::WorldConfig) the same way.

pub mod catalog;
pub mod loader;
pub mod schema;

pub use catalog::Catalog;
pub use loader::{DataError, load_catalog, load_catalog_file, load_world_config};
