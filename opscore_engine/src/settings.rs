//! Engine settings
//! These settings are fixed when the store is opened

use crate::{ads::resolver::SeededDraw, constants::MAX_JOURNAL_ENTRIES};

#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Reject rule saves whose allocations do not sum to 100
    pub strict_allocations: bool,
    /// Number of journal entries kept after each dispatch
    pub journal_capacity: usize,
    /// Seed for traffic draws. `None` seeds from the operating system.
    pub seed: Option<[u8; 32]>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strict_allocations: cfg!(feature = "strict"),
            journal_capacity: MAX_JOURNAL_ENTRIES,
            seed: None,
        }
    }
}

impl EngineSettings {
    /// Enables or disables strict allocation checks.
    pub fn strict_allocations(&mut self, strict_allocations: bool) -> &mut Self {
        self.strict_allocations = strict_allocations;
        self
    }

    /// Sets the number of journal entries to keep.
    pub fn journal_capacity(&mut self, journal_capacity: usize) -> &mut Self {
        self.journal_capacity = journal_capacity;
        self
    }

    /// Sets the seed for traffic draws.
    pub fn seed(&mut self, seed: Option<[u8; 32]>) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Draw source for traffic resolution
    pub fn draws(&self) -> SeededDraw {
        match self.seed {
            Some(seed) => SeededDraw::from_seed(seed),
            None => SeededDraw::from_entropy(),
        }
    }
}
