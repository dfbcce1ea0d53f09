//! Material storage: an ordered, capacity-limited queue of items.
//!
//! Every stored unit is one queue entry tagged with the rotation it arrived
//! travelling in. The queue is a stack: [`MaterialStorage::peek`] looks at
//! the most recently added entry, and [`MaterialStorage::remove`] takes the
//! most recent entries *of the requested resource* (LIFO per resource, not
//! a global stack pop).

use crate::resource::{Count, Resource};
use crate::rotation::{Rotation, RotationSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors from constructing a material storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage capacity must be positive")]
    ZeroCapacity,
    #[error("{0} is not a material")]
    NotAMaterial(Resource),
    #[error("combined capacity overflows")]
    CapacityOverflow,
}

/// Per-entity material inventory.
///
/// Invariant: `queue.len() == Σ tallies <= capacity`, and every tally is
/// within its per-resource limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialStorage {
    capacity: u32,
    /// Per-resource limits. Resources without an entry may fill the whole
    /// storage.
    limits: BTreeMap<Resource, u32>,
    tallies: BTreeMap<Resource, u32>,
    queue: Vec<(Resource, Rotation)>,
    inputs: RotationSet,
}

impl MaterialStorage {
    /// Create an empty storage that accepts items travelling in any direction.
    pub fn new(capacity: u32) -> Result<Self, StorageError> {
        if capacity == 0 {
            return Err(StorageError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            limits: BTreeMap::new(),
            tallies: BTreeMap::new(),
            queue: Vec::new(),
            inputs: RotationSet::ALL,
        })
    }

    /// Restrict which travel directions deliveries may arrive in.
    pub fn with_inputs(mut self, inputs: RotationSet) -> Self {
        self.inputs = inputs;
        self
    }

    /// Cap a single resource below the total capacity. A limit of zero
    /// rejects that resource outright.
    pub fn with_limit(mut self, resource: Resource, limit: u32) -> Result<Self, StorageError> {
        if !resource.is_material() {
            return Err(StorageError::NotAMaterial(resource));
        }
        self.limits.insert(resource, limit.min(self.capacity));
        Ok(self)
    }

    /// Only the listed resources are accepted; each may fill the storage.
    pub fn only(self, resources: &[Resource]) -> Result<Self, StorageError> {
        let capacity = self.capacity;
        let mut storage = self;
        for r in Resource::MATERIALS {
            let limit = if resources.contains(&r) { capacity } else { 0 };
            storage = storage.with_limit(r, limit)?;
        }
        Ok(storage)
    }

    // -- Queries --

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total number of stored units.
    pub fn total(&self) -> u32 {
        self.queue.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Stored quantity of one resource.
    pub fn quantity(&self, resource: Resource) -> u32 {
        self.tallies.get(&resource).copied().unwrap_or(0)
    }

    /// Capacity available to a single resource.
    pub fn limit(&self, resource: Resource) -> u32 {
        if !resource.is_material() {
            return 0;
        }
        self.limits.get(&resource).copied().unwrap_or(self.capacity)
    }

    /// True when at least `count` of its resource is stored.
    pub fn has(&self, count: Count) -> bool {
        self.quantity(count.resource()) >= count.quantity()
    }

    /// True when adding `count` would respect both the total and the
    /// per-resource capacity.
    pub fn has_capacity(&self, count: Count) -> bool {
        let resource = count.resource();
        let q = count.quantity();
        let fits_total = self.total().checked_add(q).is_some_and(|t| t <= self.capacity);
        let fits_limit = self
            .quantity(resource)
            .checked_add(q)
            .is_some_and(|t| t <= self.limit(resource));
        fits_total && fits_limit
    }

    /// True when a delivery travelling in `rotation` may enter.
    pub fn accepts(&self, rotation: Rotation) -> bool {
        self.inputs.contains(rotation)
    }

    pub fn inputs(&self) -> RotationSet {
        self.inputs
    }

    /// The most recently added entry.
    pub fn peek(&self) -> Option<(Resource, Rotation)> {
        self.queue.last().copied()
    }

    /// Distinct stored resources in declaration order, with quantities.
    pub fn contents(&self) -> Vec<Count> {
        self.tallies
            .iter()
            .filter_map(|(r, q)| Count::try_new(*r, *q).ok())
            .collect()
    }

    /// The raw entry queue, oldest first.
    pub fn entries(&self) -> &[(Resource, Rotation)] {
        &self.queue
    }

    // -- Mutation --

    /// Push `count.quantity()` entries tagged with `rotation`.
    ///
    /// Does not validate: callers check [`has_capacity`](Self::has_capacity)
    /// first.
    pub fn add(&mut self, count: Count, rotation: Rotation) {
        debug_assert!(self.has_capacity(count), "add without capacity: {count}");
        *self.tallies.entry(count.resource()).or_insert(0) += count.quantity();
        self.queue
            .extend(std::iter::repeat_n((count.resource(), rotation), count.quantity() as usize));
    }

    /// Remove up to `count.quantity()` of its resource, newest first.
    /// Returns the number of entries actually removed.
    pub fn remove(&mut self, count: Count) -> u32 {
        let resource = count.resource();
        let mut removed = 0;
        while removed < count.quantity() {
            let Some(index) = self.queue.iter().rposition(|(r, _)| *r == resource) else {
                break;
            };
            self.queue.remove(index);
            removed += 1;
        }
        if removed > 0 {
            let tally = self.tallies.entry(resource).or_insert(0);
            *tally -= removed;
            if *tally == 0 {
                self.tallies.remove(&resource);
            }
        }
        removed
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.tallies.clear();
    }

    /// Recount the queue and compare against the tallies.
    pub fn is_consistent(&self) -> bool {
        let mut recount: BTreeMap<Resource, u32> = BTreeMap::new();
        for (r, _) in &self.queue {
            *recount.entry(*r).or_insert(0) += 1;
        }
        recount == self.tallies
            && self.total() <= self.capacity
            && self.tallies.iter().all(|(r, q)| *q <= self.limit(*r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron(q: u32) -> Count {
        Count::new(Resource::Iron, q)
    }

    fn coal(q: u32) -> Count {
        Count::new(Resource::Coal, q)
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(MaterialStorage::new(0), Err(StorageError::ZeroCapacity));
    }

    #[test]
    fn add_and_query() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(3), Rotation::Right);
        s.add(coal(2), Rotation::Up);
        assert_eq!(s.total(), 5);
        assert_eq!(s.quantity(Resource::Iron), 3);
        assert!(s.has(coal(2)));
        assert!(!s.has(coal(3)));
        assert_eq!(s.peek(), Some((Resource::Coal, Rotation::Up)));
        assert!(s.is_consistent());
    }

    #[test]
    fn has_capacity_respects_total() {
        let mut s = MaterialStorage::new(4).unwrap();
        s.add(iron(3), Rotation::Up);
        assert!(s.has_capacity(coal(1)));
        assert!(!s.has_capacity(coal(2)));
    }

    #[test]
    fn has_capacity_rejects_huge_counts() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(1), Rotation::Up);
        assert!(!s.has_capacity(coal(u32::MAX)));
        assert!(!s.has_capacity(iron(u32::MAX)));
        assert_eq!(s.total(), 1);
    }

    #[test]
    fn has_capacity_respects_per_resource_limit() {
        let s = MaterialStorage::new(10)
            .unwrap()
            .with_limit(Resource::Iron, 2)
            .unwrap();
        assert!(s.has_capacity(iron(2)));
        assert!(!s.has_capacity(iron(3)));
        assert!(s.has_capacity(coal(10)));
    }

    #[test]
    fn liquids_never_fit() {
        let s = MaterialStorage::new(10).unwrap();
        assert!(!s.has_capacity(Count::new(Resource::Water, 1)));
        assert_eq!(
            s.with_limit(Resource::Water, 1),
            Err(StorageError::NotAMaterial(Resource::Water))
        );
    }

    #[test]
    fn only_restricts_resources() {
        let s = MaterialStorage::new(6)
            .unwrap()
            .only(&[Resource::Sand])
            .unwrap();
        assert!(s.has_capacity(Count::new(Resource::Sand, 6)));
        assert!(!s.has_capacity(iron(1)));
    }

    #[test]
    fn remove_is_lifo_per_resource() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(1), Rotation::Up);
        s.add(coal(1), Rotation::Up);
        s.add(iron(1), Rotation::Left);
        s.add(coal(1), Rotation::Down);

        assert_eq!(s.remove(iron(1)), 1);
        // The newest iron (Left) went; coal order untouched.
        assert_eq!(
            s.entries(),
            &[
                (Resource::Iron, Rotation::Up),
                (Resource::Coal, Rotation::Up),
                (Resource::Coal, Rotation::Down),
            ]
        );
        assert_eq!(s.peek(), Some((Resource::Coal, Rotation::Down)));
        assert!(s.is_consistent());
    }

    #[test]
    fn remove_more_than_stored() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(2), Rotation::Up);
        assert_eq!(s.remove(iron(5)), 2);
        assert!(s.is_empty());
        assert_eq!(s.quantity(Resource::Iron), 0);
        assert!(s.contents().is_empty());
    }

    #[test]
    fn remove_then_add_restores_length() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(2), Rotation::Up);
        s.add(coal(2), Rotation::Up);
        let before = s.total();
        s.remove(iron(1));
        s.add(iron(1), Rotation::Right);
        assert_eq!(s.total(), before);
        // The re-added iron now sits on top.
        assert_eq!(s.peek(), Some((Resource::Iron, Rotation::Right)));
    }

    #[test]
    fn inputs_gate_acceptance() {
        let s = MaterialStorage::new(1)
            .unwrap()
            .with_inputs(RotationSet::single(Rotation::Right));
        assert!(s.accepts(Rotation::Right));
        assert!(!s.accepts(Rotation::Left));
    }

    #[test]
    fn contents_in_declaration_order() {
        let mut s = MaterialStorage::new(10).unwrap();
        s.add(iron(1), Rotation::Up);
        s.add(coal(2), Rotation::Up);
        assert_eq!(s.contents(), vec![coal(2), iron(1)]);
    }

    #[test]
    fn bitcode_round_trip() {
        let mut s = MaterialStorage::new(5).unwrap();
        s.add(iron(2), Rotation::Left);
        let data = bitcode::serialize(&s).expect("serialize storage");
        let restored: MaterialStorage = bitcode::deserialize(&data).expect("deserialize storage");
        assert_eq!(s, restored);
    }
}
