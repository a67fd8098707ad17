//! Economy configuration: buckets, rhythm keys, withdrawal tasks and the queue

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        NEW_ECONOMY_RULE_BALANCE, NEW_ECONOMY_RULE_PROBABILITY, NEW_TASK_COUNT, NEW_TASK_NAME,
    },
    utils::error::{EngineError, EngineResult},
};

use super::{
    queue::{QueueCheck, QueueConfig},
    rhythm::{EconomyRule, RhythmKeyRegistry},
    tasks::WithdrawalTask,
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyConfig {
    pub rhythm_keys: RhythmKeyRegistry,
    pub rules: Vec<EconomyRule>,
    pub withdrawal_tasks: Vec<WithdrawalTask>,
    pub queue: QueueConfig,
}

impl EconomyConfig {
    /// Looks up a bucket by id.
    pub fn rule(&self, id: &str) -> Option<&EconomyRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Registers a rhythm key across every bucket. See `RhythmKeyRegistry::add_key`.
    pub fn add_rhythm_key(&mut self, name: &str) -> bool {
        self.rhythm_keys.add_key(name, &mut self.rules)
    }

    /// Unregisters a rhythm key from every bucket. See `RhythmKeyRegistry::remove_key`.
    pub fn remove_rhythm_key(&mut self, name: &str) -> bool {
        self.rhythm_keys.remove_key(name, &mut self.rules)
    }

    /// Appends a bucket with default bounds and every registered key at 0.
    pub fn add_rule(&mut self, id: String) -> EngineResult<()> {
        if self.rule(&id).is_some() {
            return Err(EngineError::DuplicateValue(id));
        }

        let (min_balance, max_balance) = NEW_ECONOMY_RULE_BALANCE;
        let mut rule = EconomyRule {
            id,
            rhythms: self.rhythm_keys.zeroed(),
            ..Default::default()
        };
        rule.min_balance(min_balance)
            .max_balance(max_balance)
            .interstitial_prob(NEW_ECONOMY_RULE_PROBABILITY)
            .rewarded_prob(NEW_ECONOMY_RULE_PROBABILITY);
        self.rules.push(rule);
        Ok(())
    }

    pub fn delete_rule(&mut self, id: &str) -> EngineResult<()> {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.id != id);
        if before == self.rules.len() {
            return Err(EngineError::NonExistentValue);
        }
        Ok(())
    }

    /// Applies `update` to a bucket. The change is kept only if the bucket still
    /// passes `EconomyRule::check` and its rhythm keys still match the registry.
    pub fn update_rule<F>(&mut self, id: &str, update: F) -> EngineResult<()>
    where
        F: FnOnce(&mut EconomyRule),
    {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or(EngineError::NonExistentValue)?;

        let mut candidate = self.rules[index].clone();
        update(&mut candidate);
        candidate.check()?;

        if let Some(key) = candidate
            .rhythms
            .keys()
            .find(|key| !self.rhythm_keys.contains(key.as_str()))
        {
            return Err(EngineError::UnknownRhythmKey(key.to_string()));
        }
        // the id is the lookup key and stays fixed
        candidate.id = id.to_string();
        self.rhythm_keys.conform(&mut candidate.rhythms);

        self.rules[index] = candidate;
        Ok(())
    }

    /// Sets one rhythm value of a bucket. The key must be registered.
    pub fn set_rhythm_value(&mut self, rule_id: &str, key: &str, value: u32) -> EngineResult<()> {
        if !self.rhythm_keys.contains(key) {
            return Err(EngineError::UnknownRhythmKey(key.to_string()));
        }

        let rule = self
            .rules
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .ok_or(EngineError::NonExistentValue)?;

        if let Some(slot) = rule.rhythms.get_mut(key) {
            *slot = value;
        }
        Ok(())
    }

    /// The first bucket whose range covers `balance`.
    pub fn rule_for_balance(&self, balance: f64) -> Option<&EconomyRule> {
        self.rules.iter().find(|rule| rule.covers(balance))
    }

    /// Appends a withdrawal task with the default name and count.
    pub fn add_task(&mut self, id: String) -> EngineResult<()> {
        if self.withdrawal_tasks.iter().any(|task| task.id == id) {
            return Err(EngineError::DuplicateValue(id));
        }

        let mut task = WithdrawalTask {
            id,
            ..Default::default()
        };
        task.name(NEW_TASK_NAME).count(Some(NEW_TASK_COUNT));
        self.withdrawal_tasks.push(task);
        Ok(())
    }

    pub fn delete_task(&mut self, id: &str) -> EngineResult<()> {
        let before = self.withdrawal_tasks.len();
        self.withdrawal_tasks.retain(|task| task.id != id);
        if before == self.withdrawal_tasks.len() {
            return Err(EngineError::NonExistentValue);
        }
        Ok(())
    }

    pub fn update_task<F>(&mut self, id: &str, update: F) -> EngineResult<()>
    where
        F: FnOnce(&mut WithdrawalTask),
    {
        let task = self
            .withdrawal_tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(EngineError::NonExistentValue)?;

        update(task);
        task.id = id.to_string();
        Ok(())
    }

    /// Consistency of the queue configuration
    pub fn queue_check(&self) -> QueueCheck {
        self.queue.check()
    }

    /// Range checks of every bucket and of the queue ranks.
    pub fn check(&self) -> EngineResult<()> {
        for rule in &self.rules {
            rule.check()?;
        }
        self.queue.check_ranks()
    }

    /// Re-aligns every bucket's rhythm map with the registry.
    pub fn conform_rhythms(&mut self) {
        for rule in self.rules.iter_mut() {
            self.rhythm_keys.conform(&mut rule.rhythms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{defaults::default_economy_config, economy::rhythm::RhythmKey};

    #[test]
    fn test_rhythm_key_round_trip_across_rules() {
        let mut config = default_economy_config();
        config.rules.truncate(2);

        assert!(config.add_rhythm_key("新玩法"));
        assert!(config.rules.iter().all(|rule| rule.rhythm("新玩法") == Some(0)));
        assert!(config.rhythm_keys.contains("新玩法"));

        assert!(config.remove_rhythm_key("新玩法"));
        assert!(config.rules.iter().all(|rule| rule.rhythm("新玩法").is_none()));
        assert!(!config.rhythm_keys.contains("新玩法"));
    }

    #[test]
    fn test_add_rule_seeds_registered_keys() {
        let mut config = default_economy_config();
        config.add_rule("4".to_string()).unwrap();

        let rule = config.rule("4").unwrap();
        assert_eq!(rule.min_balance, 0.0);
        assert_eq!(rule.max_balance, 100.0);
        assert_eq!(rule.interstitial_prob, 50);
        assert_eq!(rule.rewarded_prob, 50);
        assert_eq!(rule.rhythms, config.rhythm_keys.zeroed());
        assert_eq!(
            config.add_rule("4".to_string()),
            Err(EngineError::DuplicateValue("4".to_string()))
        );
    }

    #[test]
    fn test_set_rhythm_value_requires_registered_key() {
        let mut config = default_economy_config();
        config.set_rhythm_value("1", "Lucky转盘", 120).unwrap();
        assert_eq!(config.rule("1").unwrap().rhythm("Lucky转盘"), Some(120));

        assert_eq!(
            config.set_rhythm_value("1", "unknown", 1),
            Err(EngineError::UnknownRhythmKey("unknown".to_string()))
        );
        assert_eq!(
            config.set_rhythm_value("missing", "Lucky转盘", 1),
            Err(EngineError::NonExistentValue)
        );
    }

    #[test]
    fn test_update_rule_is_all_or_nothing() {
        let mut config = default_economy_config();
        let before = config.rule("2").cloned();

        let result = config.update_rule("2", |rule| {
            rule.max_balance(150.0).rewarded_prob(120);
        });
        assert!(matches!(result, Err(EngineError::InvalidRange(_))));
        assert_eq!(config.rule("2").cloned(), before);

        let result = config.update_rule("2", |rule| {
            rule.rhythms.insert(RhythmKey::new("rogue"), 1);
        });
        assert_eq!(result, Err(EngineError::UnknownRhythmKey("rogue".to_string())));

        config
            .update_rule("2", |rule| {
                rule.max_balance(150.0).interstitial_prob(60);
            })
            .unwrap();
        let rule = config.rule("2").unwrap();
        assert_eq!(rule.max_balance, 150.0);
        assert_eq!(rule.interstitial_prob, 60);
    }

    #[test]
    fn test_update_rule_restores_removed_keys() {
        let mut config = default_economy_config();
        config
            .update_rule("1", |rule| {
                rule.rhythms.remove("刮刮卡");
            })
            .unwrap();
        assert_eq!(config.rule("1").unwrap().rhythm("刮刮卡"), Some(0));
    }

    #[test]
    fn test_rule_for_balance() {
        let config = default_economy_config();
        assert_eq!(config.rule_for_balance(0.0).map(|r| r.id.as_str()), Some("1"));
        assert_eq!(config.rule_for_balance(100.0).map(|r| r.id.as_str()), Some("2"));
        assert_eq!(config.rule_for_balance(5_000.0).map(|r| r.id.as_str()), Some("3"));
        assert!(config.rule_for_balance(9_999.0).is_none());
    }

    #[test]
    fn test_task_crud() {
        let mut config = default_economy_config();
        config.add_task("t_4".to_string()).unwrap();
        let task = config.withdrawal_tasks.last().unwrap();
        assert_eq!(task.name, NEW_TASK_NAME);
        assert_eq!(task.count, Some(NEW_TASK_COUNT));

        config
            .update_task("t_4", |task| {
                task.count(None).days(Some(7));
            })
            .unwrap();
        assert_eq!(config.withdrawal_tasks.last().unwrap().days, Some(7));

        config.delete_task("t_4").unwrap();
        assert_eq!(config.delete_task("t_4"), Err(EngineError::NonExistentValue));
        assert_eq!(config.withdrawal_tasks.len(), 3);
    }

    #[test]
    fn test_default_queue_check() {
        let check = default_economy_config().queue_check();
        assert!(check.valid);
        assert_eq!(check.target_diff, 150);
    }
}
