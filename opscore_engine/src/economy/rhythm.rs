//! Rhythm keys and the balance buckets that carry one value per key
//!
//! The registry is the single source of truth for which keys exist. Every
//! `EconomyRule::rhythms` map holds exactly the registered keys; adding or removing
//! a key rewrites all rules in one step.

use std::{borrow::Borrow, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    constants::MAX_PROBABILITY,
    utils::error::{invalid_range_err, EngineResult},
};

/// Name of a reward-output dimension, e.g. `Lucky转盘`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RhythmKey(String);

impl RhythmKey {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RhythmKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RhythmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A balance-range bucket of the economy model
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyRule {
    pub id: String,
    /// Inclusive lower bound, in USD
    pub min_balance: f64,
    /// Exclusive upper bound, in USD
    pub max_balance: f64,
    /// Interstitial ad probability in percent
    pub interstitial_prob: u32,
    /// Rewarded ad probability in percent
    pub rewarded_prob: u32,
    pub rhythms: BTreeMap<RhythmKey, u32>,
}

impl EconomyRule {
    /// Sets the inclusive lower balance bound.
    pub fn min_balance(&mut self, min_balance: f64) -> &mut Self {
        self.min_balance = min_balance;
        self
    }

    /// Sets the exclusive upper balance bound.
    pub fn max_balance(&mut self, max_balance: f64) -> &mut Self {
        self.max_balance = max_balance;
        self
    }

    /// Sets the interstitial probability.
    pub fn interstitial_prob(&mut self, interstitial_prob: u32) -> &mut Self {
        self.interstitial_prob = interstitial_prob;
        self
    }

    /// Sets the rewarded probability.
    pub fn rewarded_prob(&mut self, rewarded_prob: u32) -> &mut Self {
        self.rewarded_prob = rewarded_prob;
        self
    }

    /// `true` if `balance` falls into `[min_balance, max_balance)`.
    pub fn covers(&self, balance: f64) -> bool {
        self.min_balance <= balance && balance < self.max_balance
    }

    /// Value of a rhythm dimension, if the key is present.
    pub fn rhythm(&self, key: &str) -> Option<u32> {
        self.rhythms.get(key).copied()
    }

    /// Checks balance bounds and probabilities.
    pub fn check(&self) -> EngineResult<()> {
        if !self.min_balance.is_finite() || !self.max_balance.is_finite() {
            return Err(invalid_range_err("Balance bounds must be finite."));
        }
        if self.min_balance < 0.0 {
            return Err(invalid_range_err("Minimum balance is negative."));
        }
        if self.min_balance > self.max_balance {
            return Err(invalid_range_err(format!(
                "Minimum balance {} exceeds maximum balance {}.",
                self.min_balance, self.max_balance
            )));
        }
        if self.interstitial_prob > MAX_PROBABILITY || self.rewarded_prob > MAX_PROBABILITY {
            return Err(invalid_range_err("Probabilities must lie within 0..=100."));
        }
        Ok(())
    }
}

/// Ordered list of registered rhythm keys
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RhythmKeyRegistry {
    keys: Vec<RhythmKey>,
}

impl RhythmKeyRegistry {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for key in keys {
            let key = key.into();
            if !key.is_empty() && !registry.contains(&key) {
                registry.keys.push(RhythmKey::new(key));
            }
        }
        registry
    }

    /// Registered keys in insertion order
    pub fn keys(&self) -> &[RhythmKey] {
        &self.keys
    }

    /// Case-sensitive exact lookup
    pub fn contains(&self, name: &str) -> bool {
        self.keys.iter().any(|key| key.as_str() == name)
    }

    /// Registers `name` and inserts it with value 0 into every rule.
    ///
    /// A no-op returning `false` if `name` is empty or already registered.
    pub fn add_key(&mut self, name: &str, rules: &mut [EconomyRule]) -> bool {
        if name.is_empty() || self.contains(name) {
            return false;
        }

        let key = RhythmKey::new(name);
        for rule in rules.iter_mut() {
            rule.rhythms.insert(key.clone(), 0);
        }
        self.keys.push(key);
        true
    }

    /// Unregisters `name` and deletes it from every rule.
    ///
    /// A no-op returning `false` if `name` is not registered.
    pub fn remove_key(&mut self, name: &str, rules: &mut [EconomyRule]) -> bool {
        if !self.contains(name) {
            return false;
        }

        self.keys.retain(|key| key.as_str() != name);
        for rule in rules.iter_mut() {
            rule.rhythms.remove(name);
        }
        true
    }

    /// A rhythm map holding every registered key at 0.
    pub fn zeroed(&self) -> BTreeMap<RhythmKey, u32> {
        self.keys.iter().map(|key| (key.clone(), 0)).collect()
    }

    /// Brings `rhythms` in line with the registry: missing keys are added with 0
    /// and unregistered keys are dropped.
    pub fn conform(&self, rhythms: &mut BTreeMap<RhythmKey, u32>) {
        rhythms.retain(|key, _| self.contains(key.as_str()));
        for key in &self.keys {
            rhythms.entry(key.clone()).or_insert(0);
        }
    }
}
