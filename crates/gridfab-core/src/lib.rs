//! GridFab Core -- shared primitives for the grid factory simulation.
//!
//! Everything the higher crates agree on lives here: the resource model,
//! cardinal rotations, arena ids, fixed-point math, the deterministic RNG
//! used for transport shuffles, tick counters, and the material storage
//! that every belt, drill and factory carries.
//!
//! # Key Types
//!
//! - [`resource::Resource`] / [`resource::Count`] -- typed resource amounts.
//! - [`rotation::Rotation`] / [`rotation::RotationSet`] -- cardinal
//!   directions and compact direction sets.
//! - [`id::EntityId`] -- stable arena key for grid entities.
//! - [`counter::ReadyCounter`] / [`counter::CycleCounter`] -- gate timers.
//! - [`material::MaterialStorage`] -- ordered, capacity-limited item queue.
//! - [`rng::SimRng`] -- SplitMix64, the only source of randomness.
//! - [`sim::StateHash`] -- FNV-1a hash for determinism checks.

pub mod counter;
pub mod fixed;
pub mod id;
pub mod material;
pub mod resource;
pub mod rng;
pub mod rotation;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
