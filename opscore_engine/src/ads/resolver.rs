//! Rule resolution
//!
//! Resolving a request context happens in two steps:
//!
//! ```plain
//!  rules ──► enabled ──► matching ──► lowest priority ──► weighted draw ──► strategy id
//!                                           │                   │
//!                                           ▼                   ▼
//!                                        NoMatch          Unallocated
//!                                   (nothing matched)  (draw fell past the
//!                                                       cumulative sum)
//! ```
//!
//! The draw is uniform in `[0, DRAW_UPPER_BOUND)`. Allocations are walked in list
//! order and the first one whose cumulative percentage exceeds the draw wins, so a
//! table summing below 100 leaves a tail of the draw space unallocated and a table
//! summing above 100 leaves its trailing entries unreachable.

use candid::CandidType;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use serde::{Deserialize, Serialize};

use crate::constants::DRAW_UPPER_BOUND;

use super::{
    matcher::{is_wildcard, matches, RequestContext},
    rule::{Allocation, Rule},
};

/// Source of traffic draws in `[0, DRAW_UPPER_BOUND)`
#[cfg_attr(test, mockall::automock)]
pub trait DrawSource {
    fn draw(&mut self) -> u32;
}

/// Draws backed by a ChaCha8 generator
pub struct SeededDraw {
    rng: ChaCha8Rng,
}

impl SeededDraw {
    /// Reproducible draws from a fixed 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Draws seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DrawSource for SeededDraw {
    fn draw(&mut self) -> u32 {
        self.rng.gen_range(0..DRAW_UPPER_BOUND)
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
/// Values at or above `DRAW_UPPER_BOUND` are wrapped into range.
#[derive(Clone, Debug, Default)]
pub struct FixedDraw {
    values: Vec<u32>,
    cursor: usize,
}

impl FixedDraw {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl DrawSource for FixedDraw {
    fn draw(&mut self) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value % DRAW_UPPER_BOUND
    }
}

/// Outcome of resolving a request context
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// A rule matched and the draw landed on one of its allocations
    Matched { rule_id: String, strategy_id: String },
    /// A rule matched but the draw fell into its unallocated tail
    Unallocated { rule_id: String },
    /// No enabled rule matched the context
    NoMatch,
}

impl Resolution {
    /// The resolved strategy id, if any
    pub fn strategy_id(&self) -> Option<&str> {
        match self {
            Resolution::Matched { strategy_id, .. } => Some(strategy_id),
            _ => None,
        }
    }

    /// `true` for both `Unallocated` and `NoMatch`
    pub fn is_no_match(&self) -> bool {
        self.strategy_id().is_none()
    }
}

/// Selects the enabled, matching rule with the lowest priority value.
/// Ties go to the rule inserted first; callers should not rely on this.
pub fn select_rule<'a>(rules: &'a [Rule], context: &RequestContext) -> Option<&'a Rule> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter(|rule| matches(&rule.conditions, context))
        .min_by_key(|rule| rule.priority)
}

/// Walks `allocations` in order and returns the strategy whose cumulative
/// percentage first exceeds `draw`.
pub fn sample_allocation(allocations: &[Allocation], draw: u32) -> Option<&str> {
    let mut cumulative = 0_u32;
    for allocation in allocations {
        cumulative = cumulative.saturating_add(allocation.percentage);
        if cumulative > draw {
            return Some(&allocation.strategy_id);
        }
    }
    None
}

/// Resolves `context` against `rules`. A draw is taken only when a rule matched.
pub fn resolve<D: DrawSource + ?Sized>(
    rules: &[Rule],
    context: &RequestContext,
    draws: &mut D,
) -> Resolution {
    match select_rule(rules, context) {
        Some(rule) => sample_rule(rule, draws.draw()),
        None => Resolution::NoMatch,
    }
}

/// The last-resort rule: enabled, wildcard on every condition, and carrying the
/// highest priority number. The first such rule wins a tie.
pub fn fallback_rule(rules: &[Rule]) -> Option<&Rule> {
    rules
        .iter()
        .filter(|rule| rule.enabled && is_wildcard(&rule.conditions))
        .reduce(|best, rule| {
            if rule.priority > best.priority {
                rule
            } else {
                best
            }
        })
}

/// Resolves `context` and, when the selected rule leaves the draw unallocated,
/// samples the fallback rule once with a fresh draw.
pub fn resolve_or_fallback<D: DrawSource + ?Sized>(
    rules: &[Rule],
    context: &RequestContext,
    draws: &mut D,
) -> Resolution {
    let primary = resolve(rules, context, draws);

    if let Resolution::Unallocated { rule_id } = &primary {
        if let Some(fallback) = fallback_rule(rules).filter(|rule| &rule.id != rule_id) {
            return sample_rule(fallback, draws.draw());
        }
    }

    primary
}

fn sample_rule(rule: &Rule, draw: u32) -> Resolution {
    match sample_allocation(&rule.allocations, draw) {
        Some(strategy_id) => Resolution::Matched {
            rule_id: rule.id.clone(),
            strategy_id: strategy_id.to_string(),
        },
        None => Resolution::Unallocated {
            rule_id: rule.id.clone(),
        },
    }
}
