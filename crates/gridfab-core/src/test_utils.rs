//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::material::MaterialStorage;
use crate::resource::{Count, Resource};
use crate::rotation::Rotation;

// ===========================================================================
// Count constructors
// ===========================================================================

pub fn iron(q: u32) -> Count {
    Count::new(Resource::Iron, q)
}

pub fn copper(q: u32) -> Count {
    Count::new(Resource::Copper, q)
}

pub fn coal(q: u32) -> Count {
    Count::new(Resource::Coal, q)
}

pub fn stone(q: u32) -> Count {
    Count::new(Resource::Stone, q)
}

pub fn steel(q: u32) -> Count {
    Count::new(Resource::Steel, q)
}

pub fn water(q: u32) -> Count {
    Count::new(Resource::Water, q)
}

pub fn methane(q: u32) -> Count {
    Count::new(Resource::Methane, q)
}

// ===========================================================================
// Storage constructors
// ===========================================================================

/// An open storage (all inputs) of the given capacity.
pub fn storage(capacity: u32) -> MaterialStorage {
    MaterialStorage::new(capacity).expect("test storage capacity must be positive")
}

/// A storage pre-filled with `contents`, each tagged `Rotation::Up`.
pub fn storage_with(capacity: u32, contents: &[Count]) -> MaterialStorage {
    let mut s = storage(capacity);
    for c in contents {
        s.add(*c, Rotation::Up);
    }
    s
}
