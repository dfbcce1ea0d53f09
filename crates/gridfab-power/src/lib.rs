//! Power storage and conduction for the GridFab simulation.
//!
//! Power is not balanced per network. Instead every entity carrying a
//! [`PowerStorage`] pulls what it lacks from whatever it can reach through
//! conductors, draining lower-priority storages first.
//!
//! # Design
//!
//! - Conductors link to the first conductor found along each cardinal line
//!   within range. Links are rebuilt every tick and the previous tick's
//!   links stay usable for one more tick, so a rebuild order never cuts a
//!   connection for a single tick.
//! - The world implements [`PowerGraph`]; this crate never sees positions.
//! - [`take_power`] is deterministic: breadth-first visit order, then
//!   priority class, then visit order within a class.

use std::collections::{BTreeSet, VecDeque};

use gridfab_core::id::EntityId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PowerError {
    #[error("power storage capacity must be positive")]
    ZeroCapacity,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Drain order. A storage only draws from classes strictly before its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PowerPriority {
    Produce,
    #[default]
    Storage,
    Consume,
}

impl PowerPriority {
    pub const ALL: [PowerPriority; 3] = [
        PowerPriority::Produce,
        PowerPriority::Storage,
        PowerPriority::Consume,
    ];
}

/// An entity's power buffer.
///
/// Invariant: `quantity <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStorage {
    capacity: u32,
    quantity: u32,
    priority: PowerPriority,
}

impl PowerStorage {
    pub fn new(capacity: u32, priority: PowerPriority) -> Result<Self, PowerError> {
        if capacity == 0 {
            return Err(PowerError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            quantity: 0,
            priority,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn priority(&self) -> PowerPriority {
        self.priority
    }

    /// Room left before the buffer is full.
    pub fn deficit(&self) -> u32 {
        self.capacity - self.quantity
    }

    pub fn is_full(&self) -> bool {
        self.quantity == self.capacity
    }

    pub fn has(&self, amount: u32) -> bool {
        self.quantity >= amount
    }

    /// Add up to `amount`; returns the amount stored.
    pub fn add(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.deficit());
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

// ---------------------------------------------------------------------------
// Conduction
// ---------------------------------------------------------------------------

/// Conductor state: how far it reaches and who it is linked to.
///
/// Links are rebuilt from positions each tick and are not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConduct {
    range: u32,
    #[serde(skip)]
    links: BTreeSet<EntityId>,
    #[serde(skip)]
    stale: BTreeSet<EntityId>,
}

impl PowerConduct {
    pub fn new(range: u32) -> Self {
        Self {
            range,
            links: BTreeSet::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Start a rebuild: current links become last tick's links.
    pub fn begin_refresh(&mut self) {
        self.stale = std::mem::take(&mut self.links);
    }

    pub fn link(&mut self, other: EntityId) {
        self.links.insert(other);
    }

    pub fn unlink(&mut self, other: EntityId) {
        self.links.remove(&other);
        self.stale.remove(&other);
    }

    /// Links made this tick.
    pub fn links(&self) -> &BTreeSet<EntityId> {
        &self.links
    }

    /// This tick's and last tick's links, sorted, without duplicates.
    pub fn neighbours(&self) -> Vec<EntityId> {
        self.links.union(&self.stale).copied().collect()
    }

    pub fn is_linked(&self, other: EntityId) -> bool {
        self.links.contains(&other) || self.stale.contains(&other)
    }
}

// ---------------------------------------------------------------------------
// Pull algorithm
// ---------------------------------------------------------------------------

/// The conduction graph as seen by [`take_power`].
pub trait PowerGraph {
    /// Entities linked to `id`. Empty for non-conductors.
    fn neighbours(&self, id: EntityId) -> Vec<EntityId>;

    /// Power buffer of `id`, if it has one.
    fn storage_mut(&mut self, id: EntityId) -> Option<&mut PowerStorage>;
}

/// Every entity reachable from `origin`, breadth first. `origin` itself is
/// excluded; `origin_neighbours` seeds the walk because the requester may
/// not be visible through the graph while it ticks.
pub fn reachable<G: PowerGraph + ?Sized>(
    graph: &G,
    origin: EntityId,
    origin_neighbours: &[EntityId],
) -> Vec<EntityId> {
    let mut visited: BTreeSet<EntityId> = BTreeSet::new();
    visited.insert(origin);
    let mut order = Vec::new();
    let mut frontier: VecDeque<EntityId> = VecDeque::new();
    for id in origin_neighbours {
        if visited.insert(*id) {
            frontier.push_back(*id);
        }
    }
    while let Some(id) = frontier.pop_front() {
        order.push(id);
        for next in graph.neighbours(id) {
            if visited.insert(next) {
                frontier.push_back(next);
            }
        }
    }
    order
}

/// Pull up to `amount` of power for a requester of class `priority`.
///
/// Storages of a strictly lower class are drained, the lowest class first
/// and within a class in visit order, each giving `min(remaining, held)`.
/// Returns the amount drawn; the caller stores it.
pub fn take_power<G: PowerGraph + ?Sized>(
    graph: &mut G,
    origin: EntityId,
    origin_neighbours: &[EntityId],
    priority: PowerPriority,
    amount: u32,
) -> u32 {
    if amount == 0 || priority == PowerPriority::Produce {
        return 0;
    }
    let nodes = reachable(graph, origin, origin_neighbours);
    let mut remaining = amount;
    for class in PowerPriority::ALL {
        if class >= priority {
            break;
        }
        for id in &nodes {
            if remaining == 0 {
                return amount;
            }
            let Some(storage) = graph.storage_mut(*id) else {
                continue;
            };
            if storage.priority() != class {
                continue;
            }
            remaining -= storage.remove(remaining);
        }
    }
    amount - remaining
}
