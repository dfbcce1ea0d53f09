//! Ordered attribute chains with memoized progress.
//!
//! A chain runs its attributes in order each tick, stopping at the first
//! one that returns `false`. Attributes before that point are not re-run
//! next tick: the chain resumes where it stopped. Once every attribute has
//! succeeded the chain completes, resets all of them, and starts over.

use gridfab_core::sim::StateHash;
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::context::TickContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainState {
    /// Attributes before the index have succeeded this cycle.
    Pending(usize),
    Complete,
}

impl Default for ChainState {
    fn default() -> Self {
        ChainState::Pending(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    links: Vec<Attribute>,
    state: ChainState,
}

impl Chain {
    pub fn new(links: Vec<Attribute>) -> Self {
        Self {
            links,
            state: ChainState::Pending(0),
        }
    }

    pub fn links(&self) -> &[Attribute] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Attribute] {
        &mut self.links
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Run from the pending attribute. Returns [`ChainState::Complete`] on
    /// the tick the last attribute succeeds; the stored state is then back
    /// at `Pending(0)`.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> ChainState {
        let start = match self.state {
            ChainState::Pending(index) => index.min(self.links.len()),
            ChainState::Complete => 0,
        };
        for index in start..self.links.len() {
            if !self.links[index].tick(ctx) {
                self.state = ChainState::Pending(index);
                return self.state;
            }
        }
        for link in &mut self.links {
            link.reset();
        }
        self.state = ChainState::Pending(0);
        ChainState::Complete
    }

    pub(crate) fn hash_into(&self, hash: &mut StateHash) {
        match self.state {
            ChainState::Pending(index) => hash.write_u64(index as u64),
            ChainState::Complete => hash.write_u64(u64::MAX),
        }
        for link in &self.links {
            link.hash_into(hash);
        }
    }
}
