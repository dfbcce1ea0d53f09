//! Determinism support: a state hash fed by the world after each tick.

use crate::fixed::Fixed64;
use crate::resource::{Count, Resource};
use crate::rotation::Rotation;

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn write_resource(&mut self, r: Resource) {
        self.write(&[r as u8]);
    }

    pub fn write_rotation(&mut self, r: Rotation) {
        self.write(&[r.index()]);
    }

    pub fn write_count(&mut self, c: Count) {
        self.write_resource(c.resource());
        self.write_u32(c.quantity());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_count(Count::new(Resource::Iron, 3));

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_count(Count::new(Resource::Iron, 3));

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_distinguishes_resources() {
        let mut h1 = StateHash::new();
        h1.write_count(Count::new(Resource::Iron, 3));
        let mut h2 = StateHash::new();
        h2.write_count(Count::new(Resource::Coal, 3));
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_rotation(Rotation::Up);
        h1.write_rotation(Rotation::Left);

        let mut h2 = StateHash::new();
        h2.write_rotation(Rotation::Left);
        h2.write_rotation(Rotation::Up);

        assert_ne!(h1.finish(), h2.finish());
    }
}
