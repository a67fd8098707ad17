use std::collections::BTreeMap;

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::ads::{
    allocation::{AllocationSummary, AllocationWarning},
    rule::UserTier,
    strategy::AggregationType,
};

/// Strategy form submission
#[derive(Clone, CandidType, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInput {
    pub name: String,
    pub aggregation_type: AggregationType,
    pub provider: String,
}

/// Rule form submission. Allocations arrive keyed by strategy id.
#[derive(Clone, CandidType, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    pub name: String,
    pub priority: u32,
    pub channels: Vec<String>,
    pub countries: Vec<String>,
    pub user_level: UserTier,
    pub allocations: BTreeMap<String, u32>,
}

/// One allocation as displayed, with the strategy name resolved lazily
#[derive(Clone, CandidType, Debug, Default, PartialEq)]
pub struct AllocationQuery {
    pub strategy_id: String,
    /// The strategy's name, or `UNKNOWN_STRATEGY` for a dangling reference
    pub strategy_name: String,
    pub percentage: u32,
    pub dangling: bool,
}

/// A rule as displayed in the rule list
#[derive(Clone, CandidType, Debug, PartialEq)]
pub struct RuleQuery {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub enabled: bool,
    pub channels: Vec<String>,
    pub countries: Vec<String>,
    pub user_level: String,
    pub allocations: Vec<AllocationQuery>,
    pub summary: AllocationSummary,
    pub warning: Option<AllocationWarning>,
}
