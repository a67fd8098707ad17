//! Ad strategy definitions held by the strategy library

use candid::CandidType;
use serde::{Deserialize, Serialize};

/// How a strategy aggregates ad sources behind its provider
#[derive(Clone, Copy, CandidType, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationType {
    /// A single network serves every request
    #[default]
    Single,
    /// Networks are called in a fixed price order
    Waterfall,
    /// Networks bid in real time
    Bidding,
}

/// A named strategy describing how ads are aggregated and served by a provider.
/// Rules refer to it by `id` only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    /// Unique identifier, referenced by rule allocations
    pub id: String,
    /// Display name
    pub name: String,
    /// Aggregation mode
    pub aggregation_type: AggregationType,
    /// Mediation provider, e.g. `TopOn`
    pub provider: String,
}

impl Strategy {
    /// Sets the identifier of the strategy.
    pub fn id<S: Into<String>>(&mut self, id: S) -> &mut Self {
        self.id = id.into();
        self
    }

    /// Sets the display name of the strategy.
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the aggregation mode of the strategy.
    pub fn aggregation_type(&mut self, aggregation_type: AggregationType) -> &mut Self {
        self.aggregation_type = aggregation_type;
        self
    }

    /// Sets the mediation provider of the strategy.
    pub fn provider<S: Into<String>>(&mut self, provider: S) -> &mut Self {
        self.provider = provider.into();
        self
    }
}

/// Strategy as shown in the library list
#[derive(Clone, Default, CandidType, Debug, PartialEq)]
pub struct StrategyQuery {
    pub id: String,
    pub name: String,
    pub aggregation_type: AggregationType,
    pub provider: String,
    /// Number of rules holding an allocation for this strategy
    pub referenced_by: u32,
}
