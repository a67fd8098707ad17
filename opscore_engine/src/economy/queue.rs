//! Withdrawal queue and its advancement consistency check
//!
//! A user enters the queue at `initial_rank` and each completed task node moves
//! them forward by the matching advancement. The configuration is consistent when
//! the advancements cover the gap to `total_rank` exactly.

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::utils::{
    common::{format_advancements, parse_advancements},
    error::{invalid_range_err, EngineResult},
};

/// Queue configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub enabled: bool,
    pub initial_rank: i64,
    pub total_rank: i64,
    pub advancements: Vec<i64>,
}

/// Outcome of the consistency check. Sums are widened so they cannot overflow.
#[derive(Clone, Copy, CandidType, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCheck {
    pub target_diff: i128,
    pub current_sum: i128,
    pub valid: bool,
}

impl QueueCheck {
    /// What is still missing (positive) or overshooting (negative)
    pub fn remaining(&self) -> i128 {
        self.target_diff - self.current_sum
    }
}

/// Checks `total_rank - initial_rank == sum(advancements)`.
pub fn check(initial_rank: i64, total_rank: i64, advancements: &[i64]) -> QueueCheck {
    let target_diff = i128::from(total_rank) - i128::from(initial_rank);
    let current_sum: i128 = advancements.iter().map(|value| i128::from(*value)).sum();

    QueueCheck {
        target_diff,
        current_sum,
        valid: target_diff == current_sum,
    }
}

impl QueueConfig {
    /// Enables or disables the queue.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Sets the rank a user enters the queue at. Ranks are never negative.
    pub fn initial_rank(&mut self, initial_rank: i64) -> EngineResult<&mut Self> {
        if initial_rank < 0 {
            return Err(invalid_range_err("Initial rank is negative."));
        }
        self.initial_rank = initial_rank;
        Ok(self)
    }

    /// Sets the rank that completes the queue. Ranks are never negative.
    pub fn total_rank(&mut self, total_rank: i64) -> EngineResult<&mut Self> {
        if total_rank < 0 {
            return Err(invalid_range_err("Total rank is negative."));
        }
        self.total_rank = total_rank;
        Ok(self)
    }

    /// Sets the advancement list.
    pub fn advancements(&mut self, advancements: Vec<i64>) -> &mut Self {
        self.advancements = advancements;
        self
    }

    /// Parses free-text editor input and stores the resulting list.
    /// Unparseable tokens are dropped, see `parse_advancements`.
    pub fn advancements_text(&mut self, text: &str) -> &mut Self {
        self.advancements = parse_advancements(text);
        self
    }

    /// The advancement list rendered for the editor.
    pub fn render_advancements(&self) -> String {
        format_advancements(&self.advancements)
    }

    /// Checks that neither rank is negative.
    pub fn check_ranks(&self) -> EngineResult<()> {
        if self.initial_rank < 0 {
            return Err(invalid_range_err("Initial rank is negative."));
        }
        if self.total_rank < 0 {
            return Err(invalid_range_err("Total rank is negative."));
        }
        Ok(())
    }

    /// Runs the consistency check on the current values.
    pub fn check(&self) -> QueueCheck {
        check(self.initial_rank, self.total_rank, &self.advancements)
    }
}
