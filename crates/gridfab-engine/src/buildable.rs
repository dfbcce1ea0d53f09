//! Construction progress for buildings placed unfinished.
//!
//! A building under construction owns a supply storage that transport fills
//! like any other input. Each step takes an even share of every required
//! resource from the supply: step `k` of `n` consumes
//! `floor(total * k / n) - floor(total * (k - 1) / n)`, so the cumulative
//! amount after the last step is exactly `total`.

use gridfab_core::material::{MaterialStorage, StorageError};
use gridfab_core::resource::Count;
use serde::{Deserialize, Serialize};

/// Result of one construction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProgress {
    /// The supply lacks this step's share. Nothing was consumed.
    Stalled,
    Advanced,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildable {
    required: Vec<Count>,
    steps: u32,
    step: u32,
    supply: MaterialStorage,
}

impl Buildable {
    /// Construction over `steps` steps (at least 1) consuming `required`.
    ///
    /// The supply accepts only the required resources, each up to its total.
    pub fn new(required: Vec<Count>, steps: u32) -> Result<Self, StorageError> {
        let capacity = required
            .iter()
            .try_fold(0u32, |sum, c| sum.checked_add(c.quantity()))
            .ok_or(StorageError::CapacityOverflow)?
            .max(1);
        let resources: Vec<_> = required.iter().map(|c| c.resource()).collect();
        let mut supply = MaterialStorage::new(capacity)?.only(&resources)?;
        for count in &required {
            supply = supply.with_limit(count.resource(), count.quantity())?;
        }
        Ok(Self {
            required,
            steps: steps.max(1),
            step: 0,
            supply,
        })
    }

    pub fn required(&self) -> &[Count] {
        &self.required
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Steps completed so far.
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step >= self.steps
    }

    pub fn supply(&self) -> &MaterialStorage {
        &self.supply
    }

    pub fn supply_mut(&mut self) -> &mut MaterialStorage {
        &mut self.supply
    }

    /// Cumulative share of `total` after `step` steps.
    fn share(&self, total: u32, step: u32) -> u32 {
        (u64::from(total) * u64::from(step) / u64::from(self.steps)) as u32
    }

    /// Cumulative amount of each required resource consumed so far.
    pub fn consumed(&self) -> Vec<(Count, u32)> {
        self.required
            .iter()
            .map(|c| (*c, self.share(c.quantity(), self.step)))
            .collect()
    }

    /// Try to take the next step.
    pub fn advance(&mut self) -> BuildProgress {
        if self.is_complete() {
            return BuildProgress::Complete;
        }
        let next = self.step + 1;
        let increments: Vec<Count> = self
            .required
            .iter()
            .filter_map(|c| {
                let amount = self.share(c.quantity(), next) - self.share(c.quantity(), self.step);
                c.with_quantity(amount)
            })
            .collect();
        if !increments.iter().all(|c| self.supply.has(*c)) {
            return BuildProgress::Stalled;
        }
        for count in increments {
            self.supply.remove(count);
        }
        self.step = next;
        if self.is_complete() {
            BuildProgress::Complete
        } else {
            BuildProgress::Advanced
        }
    }
}
