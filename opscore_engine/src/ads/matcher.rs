//! Condition matching between a rule and a request context

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::constants::{ALL_CHANNELS, GLOBAL_COUNTRIES};

use super::rule::{Conditions, UserTier};

/// The request being routed, as supplied by the presentation layer
#[derive(Clone, CandidType, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RequestContext {
    pub channel: String,
    pub country: String,
    pub tier: UserTier,
}

impl RequestContext {
    pub fn new<C: Into<String>, K: Into<String>>(channel: C, country: K, tier: UserTier) -> Self {
        Self {
            channel: channel.into(),
            country: country.into(),
            tier,
        }
    }
}

/// Returns `true` if every condition holds for `context`.
///
/// Channels and countries match by membership or through their wildcard sentinel.
/// An empty list matches nothing. The tier matches exactly, except that a rule
/// targeting `UserTier::All` accepts every tier.
pub fn matches(conditions: &Conditions, context: &RequestContext) -> bool {
    list_matches(&conditions.channels, &context.channel, ALL_CHANNELS)
        && list_matches(&conditions.countries, &context.country, GLOBAL_COUNTRIES)
        && tier_matches(conditions.user_level, context.tier)
}

/// Returns `true` if the conditions accept any context.
pub fn is_wildcard(conditions: &Conditions) -> bool {
    conditions.channels.iter().any(|c| c == ALL_CHANNELS)
        && conditions.countries.iter().any(|c| c == GLOBAL_COUNTRIES)
        && conditions.user_level == UserTier::All
}

fn list_matches(values: &[String], wanted: &str, wildcard: &str) -> bool {
    values.iter().any(|value| value == wildcard || value == wanted)
}

fn tier_matches(rule_tier: UserTier, context_tier: UserTier) -> bool {
    rule_tier == UserTier::All || rule_tier == context_tier
}
