//! Liquid and coolant storage for the GridFab simulation.
//!
//! A liquid tank holds one liquid at a time. Pumping a different liquid in
//! is normally refused, but a tank holding only a small residue is flushed
//! when a large enough delivery arrives: see [`LiquidConfig`].
//!
//! Coolant is a plain scalar reservoir with no resource identity.
//!
//! # Design
//!
//! - Tanks never validate rotations themselves; transport asks
//!   [`LiquidStorage::accepts`] before calling [`LiquidStorage::try_add`].
//! - `try_add` reports how much it took, so a partial delivery leaves the
//!   rest at the source.

use std::collections::BTreeSet;

use gridfab_core::resource::{Count, Resource};
use gridfab_core::rotation::{Rotation, RotationSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from constructing a tank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FluidError {
    #[error("tank capacity must be positive")]
    ZeroCapacity,
    #[error("{0} is not a liquid")]
    NotALiquid(Resource),
}

// ---------------------------------------------------------------------------
// Displacement config
// ---------------------------------------------------------------------------

/// When a delivery of one liquid may flush a different resident liquid.
///
/// The resident is replaced only if its quantity is below `displace_below`
/// and the incoming quantity exceeds it by more than `displace_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidConfig {
    pub displace_below: u32,
    pub displace_margin: u32,
}

impl LiquidConfig {
    pub const DEFAULT_DISPLACE_BELOW: u32 = 10;
    pub const DEFAULT_DISPLACE_MARGIN: u32 = 1;

    /// Configuration under which a different liquid is never accepted.
    pub fn never_displace() -> Self {
        Self {
            displace_below: 0,
            displace_margin: 0,
        }
    }

    fn displaces(&self, resident: u32, incoming: u32) -> bool {
        resident < self.displace_below && incoming > resident.saturating_add(self.displace_margin)
    }
}

impl Default for LiquidConfig {
    fn default() -> Self {
        Self {
            displace_below: Self::DEFAULT_DISPLACE_BELOW,
            displace_margin: Self::DEFAULT_DISPLACE_MARGIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Liquid storage
// ---------------------------------------------------------------------------

/// A single-liquid tank.
///
/// Invariant: `quantity <= max`; `resident` is `None` exactly when
/// `quantity == 0`, and is always in the allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidStorage {
    resident: Option<Resource>,
    quantity: u32,
    max: u32,
    allowed: BTreeSet<Resource>,
    inputs: RotationSet,
    config: LiquidConfig,
}

impl LiquidStorage {
    /// An empty tank accepting every liquid from every direction.
    pub fn new(max: u32) -> Result<Self, FluidError> {
        if max == 0 {
            return Err(FluidError::ZeroCapacity);
        }
        Ok(Self {
            resident: None,
            quantity: 0,
            max,
            allowed: Resource::LIQUIDS.into_iter().collect(),
            inputs: RotationSet::ALL,
            config: LiquidConfig::default(),
        })
    }

    /// Restrict the tank to the listed liquids.
    pub fn allowing(mut self, liquids: &[Resource]) -> Result<Self, FluidError> {
        if let Some(bad) = liquids.iter().find(|r| !r.is_liquid()) {
            return Err(FluidError::NotALiquid(*bad));
        }
        self.allowed = liquids.iter().copied().collect();
        Ok(self)
    }

    pub fn with_inputs(mut self, inputs: RotationSet) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_config(mut self, config: LiquidConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the displacement rule, keeping the contents.
    pub fn set_config(&mut self, config: LiquidConfig) {
        self.config = config;
    }

    // -- Queries --

    /// The resident liquid and its quantity, if any.
    pub fn current(&self) -> Option<Count> {
        self.resident
            .and_then(|r| Count::try_new(r, self.quantity).ok())
    }

    pub fn resident(&self) -> Option<Resource> {
        self.resident
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max - self.quantity
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    pub fn allows(&self, resource: Resource) -> bool {
        self.allowed.contains(&resource)
    }

    pub fn accepts(&self, rotation: Rotation) -> bool {
        self.inputs.contains(rotation)
    }

    pub fn config(&self) -> LiquidConfig {
        self.config
    }

    /// True when at least `count` of its liquid is resident.
    pub fn has(&self, count: Count) -> bool {
        self.resident == Some(count.resource()) && self.quantity >= count.quantity()
    }

    // -- Mutation --

    /// Offer `count`; returns how much the tank took.
    ///
    /// - Disallowed liquids: 0.
    /// - Empty tank or same liquid: up to the remaining room.
    /// - Different liquid: the resident is flushed and replaced (capped at
    ///   `max`) when [`LiquidConfig`] permits, otherwise 0.
    pub fn try_add(&mut self, count: Count) -> u32 {
        let resource = count.resource();
        let requested = count.quantity();
        if !self.allows(resource) {
            return 0;
        }
        match self.resident {
            None => {
                let taken = requested.min(self.max);
                self.resident = Some(resource);
                self.quantity = taken;
                taken
            }
            Some(current) if current == resource => {
                let taken = requested.min(self.remaining());
                self.quantity += taken;
                taken
            }
            Some(_) => {
                if !self.config.displaces(self.quantity, requested) {
                    return 0;
                }
                let taken = requested.min(self.max);
                self.resident = Some(resource);
                self.quantity = taken;
                taken
            }
        }
    }

    /// Drain up to `amount` of the resident liquid. Returns the amount
    /// removed; the tank forgets its liquid once empty.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.quantity);
        self.quantity -= removed;
        if self.quantity == 0 {
            self.resident = None;
        }
        removed
    }

    /// Drain exactly `count` or nothing.
    pub fn consume(&mut self, count: Count) -> bool {
        if !self.has(count) {
            return false;
        }
        self.remove(count.quantity());
        true
    }

    pub fn clear(&mut self) {
        self.resident = None;
        self.quantity = 0;
    }
}

// ---------------------------------------------------------------------------
// Coolant storage
// ---------------------------------------------------------------------------

/// A scalar coolant reservoir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoolantStorage {
    capacity: u32,
    quantity: u32,
}

impl CoolantStorage {
    pub fn new(capacity: u32) -> Result<Self, FluidError> {
        if capacity == 0 {
            return Err(FluidError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            quantity: 0,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.quantity
    }

    pub fn has(&self, amount: u32) -> bool {
        self.quantity >= amount
    }

    /// Add up to `amount`; returns the amount accepted.
    pub fn add(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.remaining());
        self.quantity += taken;
        taken
    }

    /// Remove up to `amount`; returns the amount removed.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.quantity);
        self.quantity -= removed;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfab_core::test_utils::{iron, methane, water};

    fn tank(max: u32) -> LiquidStorage {
        LiquidStorage::new(max).unwrap()
    }

    // -----------------------------------------------------------------------
    // Test 1: Construction rejects bad input
    // -----------------------------------------------------------------------
    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(LiquidStorage::new(0), Err(FluidError::ZeroCapacity));
        assert_eq!(CoolantStorage::new(0), Err(FluidError::ZeroCapacity));
    }

    #[test]
    fn allowing_rejects_materials() {
        assert_eq!(
            tank(10).allowing(&[Resource::Water, Resource::Iron]),
            Err(FluidError::NotALiquid(Resource::Iron))
        );
    }

    // -----------------------------------------------------------------------
    // Test 2: Filling an empty or same-liquid tank
    // -----------------------------------------------------------------------
    #[test]
    fn empty_tank_takes_up_to_max() {
        let mut t = tank(20);
        assert_eq!(t.try_add(water(25)), 20);
        assert_eq!(t.current(), Some(water(20)));
    }

    #[test]
    fn same_liquid_fills_remaining() {
        let mut t = tank(20);
        t.try_add(water(15));
        assert_eq!(t.try_add(water(8)), 5);
        assert_eq!(t.quantity(), 20);
        assert_eq!(t.try_add(water(1)), 0);
    }

    #[test]
    fn disallowed_liquid_refused() {
        let mut t = tank(20).allowing(&[Resource::Water]).unwrap();
        assert_eq!(t.try_add(methane(5)), 0);
        assert!(t.is_empty());
        // Materials are never allowed.
        assert_eq!(t.try_add(iron(1)), 0);
    }

    // -----------------------------------------------------------------------
    // Test 3: Displacement of a different resident
    // -----------------------------------------------------------------------
    #[test]
    fn small_residue_displaced_by_larger_delivery() {
        let mut t = tank(20);
        t.try_add(water(3));

        assert_eq!(t.try_add(methane(4)), 0);
        assert_eq!(t.current(), Some(water(3)));

        assert_eq!(t.try_add(methane(5)), 5);
        assert_eq!(t.current(), Some(methane(5)));
    }

    #[test]
    fn resident_at_threshold_never_displaced() {
        let mut t = tank(20);
        t.try_add(water(10));
        assert_eq!(t.try_add(methane(20)), 0);
        assert_eq!(t.current(), Some(water(10)));
    }

    #[test]
    fn displacement_capped_at_max() {
        let mut t = tank(6);
        t.try_add(water(2));
        assert_eq!(t.try_add(methane(9)), 6);
        assert_eq!(t.current(), Some(methane(6)));
    }

    #[test]
    fn never_displace_config() {
        let mut t = tank(20).with_config(LiquidConfig::never_displace());
        t.try_add(water(1));
        assert_eq!(t.try_add(methane(19)), 0);
    }

    // -----------------------------------------------------------------------
    // Test 4: Draining
    // -----------------------------------------------------------------------
    #[test]
    fn remove_forgets_liquid_when_empty() {
        let mut t = tank(10);
        t.try_add(water(4));
        assert_eq!(t.remove(3), 3);
        assert_eq!(t.resident(), Some(Resource::Water));
        assert_eq!(t.remove(5), 1);
        assert_eq!(t.resident(), None);
        assert_eq!(t.current(), None);
    }

    #[test]
    fn consume_is_all_or_nothing() {
        let mut t = tank(10);
        t.try_add(water(4));
        assert!(!t.consume(water(5)));
        assert!(!t.consume(methane(1)));
        assert!(t.consume(water(4)));
        assert!(t.is_empty());
    }

    #[test]
    fn inputs_gate_acceptance() {
        let t = tank(5).with_inputs(RotationSet::single(Rotation::Down));
        assert!(t.accepts(Rotation::Down));
        assert!(!t.accepts(Rotation::Up));
    }

    // -----------------------------------------------------------------------
    // Test 5: Coolant
    // -----------------------------------------------------------------------
    #[test]
    fn coolant_add_and_remove_clamp() {
        let mut c = CoolantStorage::new(10).unwrap();
        assert_eq!(c.add(7), 7);
        assert_eq!(c.add(7), 3);
        assert!(c.has(10));
        assert_eq!(c.remove(4), 4);
        assert_eq!(c.remove(20), 6);
        assert_eq!(c.quantity(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 6: Config round trip
    // -----------------------------------------------------------------------
    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: LiquidConfig = serde_json::from_str(r#"{"displace_below": 4}"#).unwrap();
        assert_eq!(cfg.displace_below, 4);
        assert_eq!(cfg.displace_margin, LiquidConfig::DEFAULT_DISPLACE_MARGIN);
    }
}
