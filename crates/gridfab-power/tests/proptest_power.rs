//! Property-based tests for the power pull.
//!
//! Builds random chains of storages and checks that a pull conserves power
//! and never touches storages at or above the requester's class.

use std::collections::BTreeMap;

use gridfab_core::id::EntityId;
use gridfab_power::{PowerGraph, PowerPriority, PowerStorage, take_power};
use proptest::prelude::*;
use slotmap::SlotMap;

struct Chain {
    order: Vec<EntityId>,
    storages: BTreeMap<EntityId, PowerStorage>,
}

impl PowerGraph for Chain {
    fn neighbours(&self, id: EntityId) -> Vec<EntityId> {
        let Some(i) = self.order.iter().position(|n| *n == id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if i > 0 {
            out.push(self.order[i - 1]);
        }
        if i + 1 < self.order.len() {
            out.push(self.order[i + 1]);
        }
        out
    }

    fn storage_mut(&mut self, id: EntityId) -> Option<&mut PowerStorage> {
        self.storages.get_mut(&id)
    }
}

fn arb_nodes() -> impl Strategy<Value = Vec<(u8, u32)>> {
    proptest::collection::vec((0..3u8, 0..20u32), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn pull_conserves_and_respects_priority(nodes in arb_nodes(), request in 0..60u32, class in 1..3u8) {
        let mut arena = SlotMap::<EntityId, ()>::with_key();
        let origin = arena.insert(());
        let mut chain = Chain { order: Vec::new(), storages: BTreeMap::new() };
        for (p, q) in &nodes {
            let id = arena.insert(());
            let mut storage = PowerStorage::new(20, PowerPriority::ALL[*p as usize]).unwrap();
            storage.add(*q);
            chain.order.push(id);
            chain.storages.insert(id, storage);
        }
        let before: BTreeMap<EntityId, u32> =
            chain.storages.iter().map(|(id, s)| (*id, s.quantity())).collect();
        let priority = PowerPriority::ALL[class as usize];
        let first = chain.order[0];

        let taken = take_power(&mut chain, origin, &[first], priority, request);

        prop_assert!(taken <= request);
        let drained: u32 = chain
            .storages
            .iter()
            .map(|(id, s)| before[id] - s.quantity())
            .sum();
        prop_assert_eq!(drained, taken);
        for (id, s) in &chain.storages {
            if s.priority() >= priority {
                prop_assert_eq!(s.quantity(), before[id]);
            }
        }
    }
}
