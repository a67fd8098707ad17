//! Allocation table validation

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::{constants::PERCENT_TOTAL, utils::common::sum_percentages};

use super::rule::Allocation;

/// Result of validating an allocation table
#[derive(Clone, Copy, CandidType, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    pub valid: bool,
    pub sum: u32,
}

/// Advisory findings about an allocation table that does not sum to 100
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum AllocationWarning {
    /// `missing` percent of the draw space resolves to no strategy
    Underallocated { missing: u32 },
    /// The table overshoots by `excess`; the listed strategies can never be drawn
    Overallocated {
        excess: u32,
        unreachable: Vec<String>,
    },
}

/// Validates an allocation table. `valid` iff the percentages sum to exactly 100.
pub fn validate(allocations: &[Allocation]) -> AllocationSummary {
    let sum = sum_percentages(allocations.iter().map(|allocation| allocation.percentage));
    AllocationSummary {
        valid: sum == PERCENT_TOTAL,
        sum,
    }
}

/// Explains why a table is invalid. Returns `None` for a valid table.
pub fn allocation_warning(allocations: &[Allocation]) -> Option<AllocationWarning> {
    let summary = validate(allocations);

    if summary.sum < PERCENT_TOTAL {
        return Some(AllocationWarning::Underallocated {
            missing: PERCENT_TOTAL - summary.sum,
        });
    }

    if summary.sum > PERCENT_TOTAL {
        // entries starting at or beyond the cumulative 100 mark are never drawn
        let mut cumulative = 0_u32;
        let mut unreachable = vec![];
        for allocation in allocations {
            if cumulative >= PERCENT_TOTAL && allocation.percentage > 0 {
                unreachable.push(allocation.strategy_id.clone());
            }
            cumulative = cumulative.saturating_add(allocation.percentage);
        }

        return Some(AllocationWarning::Overallocated {
            excess: summary.sum - PERCENT_TOTAL,
            unreachable,
        });
    }

    None
}
