//! Initial configuration handed to a freshly opened app profile

use crate::{
    ads::{
        config::AdConfig,
        rule::{Allocation, Conditions, Rule, UserTier},
        strategy::{AggregationType, Strategy},
    },
    constants::{ALL_CHANNELS, GLOBAL_COUNTRIES},
    economy::{
        config::EconomyConfig,
        queue::QueueConfig,
        rhythm::{EconomyRule, RhythmKey, RhythmKeyRegistry},
        tasks::WithdrawalTask,
    },
    state::ConsoleState,
};

/// App profile that starts from the reduced economy layout
pub const UTILITY_APP_ID: &str = "app_3";

fn strategy(id: &str, name: &str, aggregation_type: AggregationType, provider: &str) -> Strategy {
    let mut strategy = Strategy::default();
    strategy
        .id(id)
        .name(name)
        .aggregation_type(aggregation_type)
        .provider(provider);
    strategy
}

fn rule(
    id: &str,
    name: &str,
    priority: u32,
    conditions: Conditions,
    allocations: Vec<Allocation>,
) -> Rule {
    let mut rule = Rule::default();
    rule.id(id)
        .name(name)
        .priority(priority)
        .enabled(true)
        .conditions(conditions)
        .allocations(allocations);
    rule
}

/// Three strategies, a targeted rule for new US/CA users and the global fallback.
pub fn default_ad_config() -> AdConfig {
    let mut targeted = Conditions::default();
    targeted
        .channels(["MTG", "Facebook"])
        .countries(["US", "CA"])
        .user_level(UserTier::New);

    let mut global = Conditions::default();
    global
        .channels([ALL_CHANNELS])
        .countries([GLOBAL_COUNTRIES])
        .user_level(UserTier::All);

    AdConfig {
        strategies: vec![
            strategy("str_1", "TopOn 主流策略", AggregationType::Single, "TopOn"),
            strategy("str_2", "Max 激进 Waterfall", AggregationType::Waterfall, "Max"),
            strategy("str_3", "Admob 保底", AggregationType::Single, "Admob"),
        ],
        rules: vec![
            rule(
                "rule_1",
                "美国买量高价策略",
                1,
                targeted,
                vec![Allocation::new("str_1", 50), Allocation::new("str_2", 50)],
            ),
            rule(
                "rule_2",
                "全局兜底配置",
                99,
                global,
                vec![Allocation::new("str_3", 100)],
            ),
        ],
    }
}

fn bucket(
    id: &str,
    balance: (f64, f64),
    probabilities: (u32, u32),
    rhythms: &[(&str, u32)],
) -> EconomyRule {
    let mut rule = EconomyRule {
        id: id.to_string(),
        rhythms: rhythms
            .iter()
            .map(|(key, value)| (RhythmKey::new(*key), *value))
            .collect(),
        ..Default::default()
    };
    rule.min_balance(balance.0)
        .max_balance(balance.1)
        .interstitial_prob(probabilities.0)
        .rewarded_prob(probabilities.1);
    rule
}

fn task(id: &str, name: &str, count: Option<u32>, days: Option<u32>) -> WithdrawalTask {
    let mut task = WithdrawalTask {
        id: id.to_string(),
        ..Default::default()
    };
    task.name(name).count(count).days(days);
    task
}

/// Three balance buckets over three rhythm keys, three tasks and a 50 → 200 queue.
pub fn default_economy_config() -> EconomyConfig {
    EconomyConfig {
        rhythm_keys: RhythmKeyRegistry::new(["Quiz答题", "Lucky转盘", "刮刮卡"]),
        rules: vec![
            bucket(
                "1",
                (0.0, 100.0),
                (30, 50),
                &[("Quiz答题", 30), ("Lucky转盘", 100), ("刮刮卡", 50)],
            ),
            bucket(
                "2",
                (100.0, 200.0),
                (50, 70),
                &[("Quiz答题", 20), ("Lucky转盘", 80), ("刮刮卡", 40)],
            ),
            bucket(
                "3",
                (200.0, 9999.0),
                (80, 90),
                &[("Quiz答题", 10), ("Lucky转盘", 50), ("刮刮卡", 20)],
            ),
        ],
        withdrawal_tasks: vec![
            task("t1", "观看激励视频 (需完整观看且点击)", Some(20), None),
            task("t2", "连续签到 (漏签需补签)", None, Some(3)),
            task("t3", "限时冲刺活动 - 邀请3名好友", Some(50), Some(5)),
        ],
        queue: QueueConfig {
            enabled: true,
            initial_rank: 50,
            total_rank: 200,
            advancements: vec![50, 30, 20, 10, 10, 10, 10, 10],
        },
    }
}

/// Reduced layout: one bucket over two rhythm keys and a 100 → 500 queue.
pub fn utility_economy_config() -> EconomyConfig {
    EconomyConfig {
        rhythm_keys: RhythmKeyRegistry::new(["基础产出", "签到奖励"]),
        rules: vec![bucket(
            "1",
            (0.0, 50.0),
            (20, 40),
            &[("基础产出", 50), ("签到奖励", 100)],
        )],
        withdrawal_tasks: vec![task("1", "每日登录", Some(1), None)],
        queue: QueueConfig {
            enabled: true,
            initial_rank: 100,
            total_rank: 500,
            advancements: vec![100, 100, 100, 50, 50],
        },
    }
}

/// Initial state for an app profile.
pub fn console_state_for_app(app_id: &str) -> ConsoleState {
    let economy = if app_id == UTILITY_APP_ID {
        utility_economy_config()
    } else {
        default_economy_config()
    };

    ConsoleState {
        ads: default_ad_config(),
        economy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::allocation::validate;

    #[test]
    fn test_default_ad_rules_are_fully_allocated() {
        let config = default_ad_config();
        assert!(config.rules.iter().all(|rule| validate(&rule.allocations).valid));
    }

    #[test]
    fn test_default_buckets_match_registry() {
        for config in [default_economy_config(), utility_economy_config()] {
            for rule in &config.rules {
                assert_eq!(rule.rhythms.len(), config.rhythm_keys.keys().len());
                assert!(rule.check().is_ok());
            }
            assert!(config.queue_check().valid);
        }
    }

    #[test]
    fn test_utility_app_gets_reduced_economy() {
        let state = console_state_for_app(UTILITY_APP_ID);
        assert_eq!(state.economy.rhythm_keys.keys().len(), 2);
        assert_eq!(state.economy.queue.total_rank, 500);

        let state = console_state_for_app("app_1");
        assert_eq!(state.economy.rhythm_keys.keys().len(), 3);
        assert_eq!(state.ads, default_ad_config());
    }
}
