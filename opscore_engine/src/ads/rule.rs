//! Traffic rules: targeting conditions bound to weighted strategy allocations

use std::{fmt, str::FromStr};

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::utils::error::EngineError;

/// User tiers a rule can target. `All` matches every tier.
#[derive(Clone, Copy, CandidType, Debug, Default, Deserialize, PartialEq, Eq, Hash, Serialize)]
pub enum UserTier {
    #[default]
    #[serde(rename = "所有用户")]
    All,
    #[serde(rename = "新用户 (0天)")]
    New,
    #[serde(rename = "老用户 (3天+)")]
    Returning,
    #[serde(rename = "高价值 (ARPU>$5)")]
    HighValue,
    #[serde(rename = "非付费用户")]
    NonPaying,
}

impl UserTier {
    pub const ALL_TIERS: [UserTier; 5] = [
        UserTier::All,
        UserTier::New,
        UserTier::Returning,
        UserTier::HighValue,
        UserTier::NonPaying,
    ];

    /// Label shown by the console, also used as the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            UserTier::All => "所有用户",
            UserTier::New => "新用户 (0天)",
            UserTier::Returning => "老用户 (3天+)",
            UserTier::HighValue => "高价值 (ARPU>$5)",
            UserTier::NonPaying => "非付费用户",
        }
    }

    /// Short ASCII alias accepted by `FromStr`
    pub fn alias(&self) -> &'static str {
        match self {
            UserTier::All => "all",
            UserTier::New => "new",
            UserTier::Returning => "returning",
            UserTier::HighValue => "high_value",
            UserTier::NonPaying => "non_paying",
        }
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserTier::ALL_TIERS
            .into_iter()
            .find(|tier| tier.label() == s || tier.alias() == s)
            .ok_or_else(|| EngineError::DecodingError(format!("Unknown user tier: {}", s)))
    }
}

/// Targeting conditions of a rule. All three must hold for the rule to match.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    /// Traffic sources, or the `ALL_CHANNELS` sentinel
    pub channels: Vec<String>,
    /// Country codes, or the `GLOBAL_COUNTRIES` sentinel
    pub countries: Vec<String>,
    /// Targeted tier
    pub user_level: UserTier,
}

impl Conditions {
    /// Sets the channel list.
    pub fn channels<I, S>(&mut self, channels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the country list.
    pub fn countries<I, S>(&mut self, countries: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the targeted user tier.
    pub fn user_level(&mut self, user_level: UserTier) -> &mut Self {
        self.user_level = user_level;
        self
    }
}

/// One slice of a rule's traffic split
#[derive(Clone, CandidType, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Weak reference into the strategy library
    pub strategy_id: String,
    /// Share of traffic in `[0, 100]`
    pub percentage: u32,
}

impl Allocation {
    pub fn new<S: Into<String>>(strategy_id: S, percentage: u32) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            percentage,
        }
    }
}

/// A priority-ordered targeting rule. Lower `priority` wins.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub enabled: bool,
    pub conditions: Conditions,
    /// Owned by this rule, never shared
    pub allocations: Vec<Allocation>,
}

impl Rule {
    /// Sets the identifier of the rule.
    pub fn id<S: Into<String>>(&mut self, id: S) -> &mut Self {
        self.id = id.into();
        self
    }

    /// Sets the display name of the rule.
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the priority. Lower values take precedence.
    pub fn priority(&mut self, priority: u32) -> &mut Self {
        self.priority = priority;
        self
    }

    /// Enables or disables the rule.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Sets the targeting conditions.
    pub fn conditions(&mut self, conditions: Conditions) -> &mut Self {
        self.conditions = conditions;
        self
    }

    /// Sets the allocation table.
    pub fn allocations(&mut self, allocations: Vec<Allocation>) -> &mut Self {
        self.allocations = allocations;
        self
    }

    /// Returns `true` if any allocation points at `strategy_id`.
    pub fn references(&self, strategy_id: &str) -> bool {
        self.allocations
            .iter()
            .any(|allocation| allocation.strategy_id == strategy_id)
    }

    /// Removes every allocation pointing at `strategy_id`.
    /// Returns `true` if something was removed.
    pub fn prune_strategy(&mut self, strategy_id: &str) -> bool {
        let before = self.allocations.len();
        self.allocations
            .retain(|allocation| allocation.strategy_id != strategy_id);
        before != self.allocations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_setters() {
        let mut conditions = Conditions::default();
        conditions
            .channels(["MTG", "Facebook"])
            .countries(["US", "CA"])
            .user_level(UserTier::New);

        let mut rule = Rule::default();
        rule.id("rule_1")
            .name("美国买量高价策略")
            .priority(1)
            .enabled(true)
            .conditions(conditions.clone())
            .allocations(vec![Allocation::new("str_1", 50), Allocation::new("str_2", 50)]);

        assert_eq!(rule.id, "rule_1");
        assert_eq!(rule.priority, 1);
        assert!(rule.enabled);
        assert_eq!(rule.conditions, conditions);
        assert_eq!(rule.allocations.len(), 2);
    }

    #[test]
    fn test_prune_strategy_keeps_other_allocations() {
        let mut rule = Rule::default();
        rule.allocations(vec![
            Allocation::new("str_1", 50),
            Allocation::new("str_2", 30),
            Allocation::new("str_1", 20),
        ]);

        assert!(rule.prune_strategy("str_1"));
        assert_eq!(rule.allocations, vec![Allocation::new("str_2", 30)]);
        assert!(!rule.prune_strategy("str_1"));
        assert!(!rule.references("str_1"));
        assert!(rule.references("str_2"));
    }

    #[test]
    fn test_user_tier_parsing() {
        assert_eq!("新用户 (0天)".parse::<UserTier>().unwrap(), UserTier::New);
        assert_eq!("high_value".parse::<UserTier>().unwrap(), UserTier::HighValue);
        assert!(matches!(
            "VIP".parse::<UserTier>(),
            Err(EngineError::DecodingError(_))
        ));
    }

    #[test]
    fn test_rule_json_shape() {
        let json = r#"{
            "id": "rule_2",
            "name": "全局兜底配置",
            "priority": 99,
            "enabled": true,
            "conditions": { "channels": ["所有渠道"], "countries": ["全球"], "userLevel": "所有用户" },
            "allocations": [{ "strategyId": "str_3", "percentage": 100 }]
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.priority, 99);
        assert_eq!(rule.conditions.user_level, UserTier::All);
        assert_eq!(rule.allocations, vec![Allocation::new("str_3", 100)]);
    }
}
