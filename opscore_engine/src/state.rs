//! Console state and the store that owns it
//!
//! Every mutation goes through [`ConsoleStore::dispatch`]. The action is applied
//! to a copy of the current state and the copy replaces the state only when the
//! action succeeds, so readers holding a snapshot never observe a half-applied
//! change.

use serde::{Deserialize, Serialize};

use crate::{
    ads::{
        config::AdConfig,
        matcher::RequestContext,
        resolver::{DrawSource, Resolution, SeededDraw},
    },
    defaults::{console_state_for_app, default_ad_config, default_economy_config},
    economy::{config::EconomyConfig, queue::QueueCheck, tasks::WithdrawalTask},
    journal::{JournalCollection, JournalEntry, LogType},
    settings::EngineSettings,
    types::{RuleInput, RuleQuery, StrategyInput},
    utils::{
        common::sequential_id,
        error::EngineResult,
    },
};

/// Everything one app profile configures
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleState {
    pub ads: AdConfig,
    pub economy: EconomyConfig,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            ads: default_ad_config(),
            economy: default_economy_config(),
        }
    }
}

/// A single mutation of the console state
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Creates a strategy when `editing` is `None`, updates `editing` otherwise
    SaveStrategy {
        editing: Option<String>,
        input: StrategyInput,
    },
    DeleteStrategy(String),
    /// Creates a rule when `editing` is `None`, updates `editing` otherwise
    SaveRule {
        editing: Option<String>,
        input: RuleInput,
    },
    DeleteRule(String),
    ToggleRule {
        id: String,
        enabled: bool,
    },
    AddRhythmKey(String),
    RemoveRhythmKey(String),
    AddEconomyRule,
    DeleteEconomyRule(String),
    SetBalanceRange {
        rule_id: String,
        min_balance: f64,
        max_balance: f64,
    },
    SetProbabilities {
        rule_id: String,
        interstitial_prob: u32,
        rewarded_prob: u32,
    },
    SetRhythmValue {
        rule_id: String,
        key: String,
        value: u32,
    },
    AddTask,
    DeleteTask(String),
    /// Replaces every field of a task except its id
    UpdateTask(WithdrawalTask),
    SetQueueEnabled(bool),
    SetInitialRank(i64),
    SetTotalRank(i64),
    /// Free-text advancement list as typed into the editor
    SetAdvancementsText(String),
}

impl Action {
    /// Short label used in journal notes
    pub fn label(&self) -> &'static str {
        match self {
            Action::SaveStrategy { editing: None, .. } => "Create strategy",
            Action::SaveStrategy { .. } => "Update strategy",
            Action::DeleteStrategy(_) => "Delete strategy",
            Action::SaveRule { editing: None, .. } => "Create rule",
            Action::SaveRule { .. } => "Update rule",
            Action::DeleteRule(_) => "Delete rule",
            Action::ToggleRule { .. } => "Toggle rule",
            Action::AddRhythmKey(_) => "Add rhythm key",
            Action::RemoveRhythmKey(_) => "Remove rhythm key",
            Action::AddEconomyRule => "Add economy rule",
            Action::DeleteEconomyRule(_) => "Delete economy rule",
            Action::SetBalanceRange { .. } => "Set balance range",
            Action::SetProbabilities { .. } => "Set ad probabilities",
            Action::SetRhythmValue { .. } => "Set rhythm value",
            Action::AddTask => "Add withdrawal task",
            Action::DeleteTask(_) => "Delete withdrawal task",
            Action::UpdateTask(_) => "Update withdrawal task",
            Action::SetQueueEnabled(_) => "Toggle queue",
            Action::SetInitialRank(_) => "Set initial rank",
            Action::SetTotalRank(_) => "Set total rank",
            Action::SetAdvancementsText(_) => "Set advancements",
        }
    }

    fn touches_queue(&self) -> bool {
        matches!(
            self,
            Action::SetInitialRank(_) | Action::SetTotalRank(_) | Action::SetAdvancementsText(_)
        )
    }
}

/// Outcome of an applied action
#[derive(Default)]
struct Change {
    /// Id of the entity the action created or modified
    subject: Option<String>,
    /// Rules whose allocation tables were rewritten
    rules: Vec<String>,
}

impl Change {
    fn subject<S: Into<String>>(subject: S) -> Self {
        Self {
            subject: Some(subject.into()),
            rules: vec![],
        }
    }

    fn rule<S: Into<String>>(rule_id: S) -> Self {
        let rule_id = rule_id.into();
        Self {
            subject: Some(rule_id.clone()),
            rules: vec![rule_id],
        }
    }
}

/// Owner of the console state, the engine settings and the journal
pub struct ConsoleStore {
    state: ConsoleState,
    settings: EngineSettings,
    journal: JournalCollection,
    draws: SeededDraw,
    id_seq: u64,
}

impl ConsoleStore {
    pub fn new(state: ConsoleState, settings: EngineSettings) -> Self {
        let draws = settings.draws();
        let mut journal = JournalCollection::default();
        journal.append_note(Ok(()), LogType::Info, "Opened the console store.");

        Self {
            state,
            settings,
            journal,
            draws,
            id_seq: 0,
        }
    }

    /// Opens the store on the seeded state of an app profile.
    pub fn open(app_id: &str, settings: EngineSettings) -> Self {
        Self::new(console_state_for_app(app_id), settings)
    }

    /// The current state. It is only ever replaced as a whole.
    pub fn snapshot(&self) -> &ConsoleState {
        &self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn journal(&self) -> &JournalCollection {
        &self.journal
    }

    /// Applies `action` atomically and journals the outcome.
    pub fn dispatch(&mut self, action: Action) -> EngineResult<()> {
        let label = action.label();
        let touches_queue = action.touches_queue();

        let mut next = self.state.clone();
        let mut id_seq = self.id_seq;
        let result = apply(
            &mut next,
            action,
            &mut id_seq,
            self.settings.strict_allocations,
        );

        match result {
            Ok(change) => {
                self.state = next;
                self.id_seq = id_seq;

                let mut entry = JournalEntry::new(Ok(()), LogType::ConfigChange);
                entry.note(label);
                if let Some(subject) = &change.subject {
                    entry.subject(subject);
                }
                entry.commit(&mut self.journal);

                self.journal_validation(&change, touches_queue);
                self.journal.trim(self.settings.journal_capacity);
                Ok(())
            }
            Err(err) => {
                self.journal
                    .append_note(Err(err.clone()), LogType::ConfigChange, label);
                self.journal.trim(self.settings.journal_capacity);
                Err(err)
            }
        }
    }

    /// Resolves `context` with the given draw source and journals the outcome.
    ///
    /// An unallocated draw is re-sampled against the global fallback rule.
    pub fn resolve<D: DrawSource + ?Sized>(
        &mut self,
        context: &RequestContext,
        draws: &mut D,
    ) -> Resolution {
        let resolution = self.state.ads.resolve_or_fallback(context, draws);
        self.journal_resolution(context, &resolution);
        resolution
    }

    /// Resolves `context` with the store's own draw source.
    pub fn route(&mut self, context: &RequestContext) -> Resolution {
        let resolution = self.state.ads.resolve_or_fallback(context, &mut self.draws);
        self.journal_resolution(context, &resolution);
        resolution
    }

    /// Consistency of the withdrawal queue
    pub fn queue_check(&self) -> QueueCheck {
        self.state.economy.queue_check()
    }

    /// Every rule in display order, with its allocation summary and warning
    pub fn allocation_report(&self) -> Vec<RuleQuery> {
        self.state.ads.rule_queries()
    }

    fn journal_validation(&mut self, change: &Change, touches_queue: bool) {
        for (rule_id, warning) in self.state.ads.allocation_warnings() {
            if change.rules.contains(&rule_id) {
                self.journal.append_subject_note(
                    Ok(()),
                    LogType::Validation,
                    rule_id,
                    format!("{:?}", warning),
                );
            }
        }

        if touches_queue {
            let check = self.state.economy.queue_check();
            if !check.valid {
                self.journal.append_note(
                    Ok(()),
                    LogType::Validation,
                    format!(
                        "Queue advancements sum to {} but the rank gap is {}.",
                        check.current_sum, check.target_diff
                    ),
                );
            }
        }
    }

    fn journal_resolution(&mut self, context: &RequestContext, resolution: &Resolution) {
        let note = format!(
            "{} / {} / {} -> {:?}",
            context.channel,
            context.country,
            context.tier.alias(),
            resolution
        );
        match resolution {
            Resolution::Matched { rule_id, .. } | Resolution::Unallocated { rule_id } => {
                let rule_id = rule_id.clone();
                self.journal
                    .append_subject_note(Ok(()), LogType::Resolution, rule_id, note);
            }
            Resolution::NoMatch => {
                self.journal.append_note(Ok(()), LogType::Resolution, note);
            }
        }
        self.journal.trim(self.settings.journal_capacity);
    }
}

/// Draws the next sequential id with `prefix` that `taken` does not report as used.
fn next_id<F: Fn(&str) -> bool>(id_seq: &mut u64, prefix: &str, taken: F) -> String {
    loop {
        *id_seq += 1;
        let id = sequential_id(prefix, *id_seq);
        if !taken(&id) {
            return id;
        }
    }
}

fn apply(
    state: &mut ConsoleState,
    action: Action,
    id_seq: &mut u64,
    strict: bool,
) -> EngineResult<Change> {
    let ads = &mut state.ads;
    let economy = &mut state.economy;

    match action {
        Action::SaveStrategy {
            editing: None,
            input,
        } => {
            let id = next_id(id_seq, "str", |id| ads.strategy(id).is_some());
            ads.create_strategy(id.clone(), input)?;
            Ok(Change::subject(id))
        }
        Action::SaveStrategy {
            editing: Some(id),
            input,
        } => {
            ads.update_strategy(&id, input)?;
            Ok(Change::subject(id))
        }
        Action::DeleteStrategy(id) => {
            let rules = ads.delete_strategy(&id);
            Ok(Change {
                subject: Some(id),
                rules,
            })
        }
        Action::SaveRule {
            editing: None,
            input,
        } => {
            let id = next_id(id_seq, "rule", |id| ads.rule(id).is_some());
            ads.create_rule(id.clone(), input, strict)?;
            Ok(Change::rule(id))
        }
        Action::SaveRule {
            editing: Some(id),
            input,
        } => {
            ads.update_rule(&id, input, strict)?;
            Ok(Change::rule(id))
        }
        Action::DeleteRule(id) => {
            ads.delete_rule(&id)?;
            Ok(Change::subject(id))
        }
        Action::ToggleRule { id, enabled } => {
            ads.toggle_rule(&id, enabled)?;
            Ok(Change::subject(id))
        }
        // empty, repeated or unknown names leave the registry as it is
        Action::AddRhythmKey(name) => {
            if !economy.add_rhythm_key(&name) {
                return Ok(Change::default());
            }
            Ok(Change::subject(name))
        }
        Action::RemoveRhythmKey(name) => {
            if !economy.remove_rhythm_key(&name) {
                return Ok(Change::default());
            }
            Ok(Change::subject(name))
        }
        Action::AddEconomyRule => {
            let id = next_id(id_seq, "eco", |id| economy.rule(id).is_some());
            economy.add_rule(id.clone())?;
            Ok(Change::subject(id))
        }
        Action::DeleteEconomyRule(id) => {
            economy.delete_rule(&id)?;
            Ok(Change::subject(id))
        }
        Action::SetBalanceRange {
            rule_id,
            min_balance,
            max_balance,
        } => {
            economy.update_rule(&rule_id, |rule| {
                rule.min_balance(min_balance).max_balance(max_balance);
            })?;
            Ok(Change::subject(rule_id))
        }
        Action::SetProbabilities {
            rule_id,
            interstitial_prob,
            rewarded_prob,
        } => {
            economy.update_rule(&rule_id, |rule| {
                rule.interstitial_prob(interstitial_prob)
                    .rewarded_prob(rewarded_prob);
            })?;
            Ok(Change::subject(rule_id))
        }
        Action::SetRhythmValue {
            rule_id,
            key,
            value,
        } => {
            economy.set_rhythm_value(&rule_id, &key, value)?;
            Ok(Change::subject(rule_id))
        }
        Action::AddTask => {
            let id = next_id(id_seq, "task", |id| {
                economy.withdrawal_tasks.iter().any(|task| task.id == id)
            });
            economy.add_task(id.clone())?;
            Ok(Change::subject(id))
        }
        Action::DeleteTask(id) => {
            economy.delete_task(&id)?;
            Ok(Change::subject(id))
        }
        Action::UpdateTask(task) => {
            let id = task.id.clone();
            economy.update_task(&id, |current| *current = task)?;
            Ok(Change::subject(id))
        }
        Action::SetQueueEnabled(enabled) => {
            economy.queue.enabled(enabled);
            Ok(Change::default())
        }
        Action::SetInitialRank(rank) => {
            economy.queue.initial_rank(rank)?;
            Ok(Change::default())
        }
        Action::SetTotalRank(rank) => {
            economy.queue.total_rank(rank)?;
            Ok(Change::default())
        }
        Action::SetAdvancementsText(text) => {
            economy.queue.advancements_text(&text);
            Ok(Change::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ads::{allocation::AllocationWarning, resolver::FixedDraw, rule::UserTier},
        constants::{ALL_CHANNELS, GLOBAL_COUNTRIES, MAX_JOURNAL_ENTRIES, UNKNOWN_STRATEGY},
        defaults::UTILITY_APP_ID,
        utils::error::EngineError,
    };

    fn store() -> ConsoleStore {
        let mut settings = EngineSettings::default();
        settings.strict_allocations(false).seed(Some([1; 32]));
        ConsoleStore::new(ConsoleState::default(), settings)
    }

    fn rule_input(allocations: &[(&str, u32)]) -> RuleInput {
        RuleInput {
            name: "测试规则".to_string(),
            priority: 5,
            channels: vec!["Organic".to_string()],
            countries: vec!["JP".to_string()],
            user_level: UserTier::All,
            allocations: allocations
                .iter()
                .map(|(id, percentage)| (id.to_string(), *percentage))
                .collect(),
        }
    }

    fn count(store: &ConsoleStore, log_type: LogType) -> usize {
        store
            .journal()
            .entries()
            .iter()
            .filter(|entry| entry.log_type == log_type)
            .count()
    }

    #[test]
    fn test_new_user_from_mtg_us_is_split_evenly() {
        let mut store = store();
        let context = RequestContext::new("MTG", "US", UserTier::New);

        let first = store.resolve(&context, &mut FixedDraw::new(vec![49]));
        assert_eq!(first.strategy_id(), Some("str_1"));
        let second = store.resolve(&context, &mut FixedDraw::new(vec![50]));
        assert_eq!(second.strategy_id(), Some("str_2"));
        assert_eq!(count(&store, LogType::Resolution), 2);
    }

    #[test]
    fn test_everything_else_hits_the_global_rule() {
        let mut store = store();
        let context = RequestContext::new("Organic", "JP", UserTier::Returning);

        for _ in 0..20 {
            assert_eq!(store.route(&context).strategy_id(), Some("str_3"));
        }
    }

    #[test]
    fn test_created_rule_gets_sequential_id() {
        let mut store = store();
        store
            .dispatch(Action::SaveRule {
                editing: None,
                input: rule_input(&[("str_1", 70), ("str_2", 30)]),
            })
            .unwrap();

        let created = store.snapshot().ads.rule("rule_3").unwrap();
        assert!(created.enabled);
        assert_eq!(created.priority, 5);
        assert_eq!(created.allocations.len(), 2);

        let entry = store.journal().entries().last().unwrap();
        assert_eq!(entry.log_type, LogType::ConfigChange);
        assert_eq!(entry.subject.as_deref(), Some("rule_3"));
    }

    #[test]
    fn test_underallocated_rule_is_saved_with_warning() {
        let mut store = store();
        store
            .dispatch(Action::SaveRule {
                editing: Some("rule_1".to_string()),
                input: rule_input(&[("str_1", 45), ("str_2", 25)]),
            })
            .unwrap();

        let report = store.allocation_report();
        let edited = report.iter().find(|rule| rule.id == "rule_1").unwrap();
        assert!(!edited.summary.valid);
        assert_eq!(edited.summary.sum, 70);
        assert_eq!(
            edited.warning,
            Some(AllocationWarning::Underallocated { missing: 30 })
        );
        assert_eq!(count(&store, LogType::Validation), 1);
    }

    #[test]
    fn test_strict_mode_rejects_and_keeps_state() {
        let mut settings = EngineSettings::default();
        settings.strict_allocations(true);
        let mut store = ConsoleStore::new(ConsoleState::default(), settings);
        let before = store.snapshot().clone();

        let result = store.dispatch(Action::SaveRule {
            editing: Some("rule_1".to_string()),
            input: rule_input(&[("str_1", 45)]),
        });

        assert_eq!(result, Err(EngineError::InvalidAllocation { sum: 45 }));
        assert_eq!(store.snapshot(), &before);
        let entry = store.journal().entries().last().unwrap();
        assert_eq!(entry.entry, Err(EngineError::InvalidAllocation { sum: 45 }));
    }

    #[test]
    fn test_strategy_delete_cascades_and_falls_back() {
        let mut store = store();
        store
            .dispatch(Action::DeleteStrategy("str_1".to_string()))
            .unwrap();

        let rule = store.snapshot().ads.rule("rule_1").unwrap();
        assert_eq!(rule.allocations.len(), 1);
        assert_eq!(rule.allocations[0].strategy_id, "str_2");
        assert_eq!(count(&store, LogType::Validation), 1);

        let context = RequestContext::new("Facebook", "CA", UserTier::New);
        let resolution = store.resolve(&context, &mut FixedDraw::new(vec![70, 70]));
        assert_eq!(resolution.strategy_id(), Some("str_3"));
    }

    #[test]
    fn test_dangling_reference_reads_as_unknown() {
        let mut state = ConsoleState::default();
        state.ads.strategies.retain(|strategy| strategy.id != "str_2");
        let store = ConsoleStore::new(state, EngineSettings::default());

        let report = store.allocation_report();
        let rule = report.iter().find(|rule| rule.id == "rule_1").unwrap();
        assert_eq!(rule.allocations[1].strategy_name, UNKNOWN_STRATEGY);
        assert!(rule.allocations[1].dangling);
        assert!(rule.summary.valid);
    }

    #[test]
    fn test_failed_action_leaves_state_untouched() {
        let mut store = store();
        let before = store.snapshot().clone();

        assert_eq!(
            store.dispatch(Action::ToggleRule {
                id: "rule_404".to_string(),
                enabled: false
            }),
            Err(EngineError::NonExistentValue)
        );
        assert_eq!(
            store.dispatch(Action::SetProbabilities {
                rule_id: "1".to_string(),
                interstitial_prob: 101,
                rewarded_prob: 10,
            })
            .map_err(|err| matches!(err, EngineError::InvalidRange(_))),
            Err(true)
        );
        assert_eq!(store.snapshot(), &before);
    }

    #[test]
    fn test_rhythm_keys_through_dispatch() {
        let mut store = store();
        store
            .dispatch(Action::AddRhythmKey("新玩法".to_string()))
            .unwrap();
        assert!(store
            .snapshot()
            .economy
            .rules
            .iter()
            .all(|rule| rule.rhythm("新玩法") == Some(0)));

        store
            .dispatch(Action::RemoveRhythmKey("新玩法".to_string()))
            .unwrap();
        assert!(!store.snapshot().economy.rhythm_keys.contains("新玩法"));
    }

    #[test]
    fn test_rhythm_key_edits_without_effect_are_no_ops() {
        let mut store = store();
        let before = store.snapshot().clone();

        assert_eq!(store.dispatch(Action::AddRhythmKey("Quiz答题".to_string())), Ok(()));
        assert_eq!(store.dispatch(Action::AddRhythmKey(String::new())), Ok(()));
        assert_eq!(store.dispatch(Action::RemoveRhythmKey("nope".to_string())), Ok(()));
        assert_eq!(store.snapshot(), &before);
        assert!(store
            .journal()
            .entries()
            .iter()
            .all(|entry| entry.entry.is_ok()));

        // names match exactly, surrounding spaces included
        store
            .dispatch(Action::AddRhythmKey(" 新玩法 ".to_string()))
            .unwrap();
        let registry = &store.snapshot().economy.rhythm_keys;
        assert!(registry.contains(" 新玩法 "));
        assert!(!registry.contains("新玩法"));
    }

    #[test]
    fn test_oversized_percentage_is_rejected_by_the_store() {
        let mut store = store();
        let result = store.dispatch(Action::SaveRule {
            editing: None,
            input: rule_input(&[("str_1", 250)]),
        });

        assert!(matches!(result, Err(EngineError::InvalidRange(_))));
        assert!(store.snapshot().ads.rule("rule_3").is_none());
    }

    #[test]
    fn test_queue_edits_are_checked() {
        let mut store = ConsoleStore::open(UTILITY_APP_ID, EngineSettings::default());
        assert!(store.queue_check().valid);

        store
            .dispatch(Action::SetAdvancementsText("100, 100, 100".to_string()))
            .unwrap();
        let check = store.queue_check();
        assert!(!check.valid);
        assert_eq!(check.remaining(), 100);
        assert_eq!(count(&store, LogType::Validation), 1);

        store.dispatch(Action::SetTotalRank(400)).unwrap();
        assert!(store.queue_check().valid);
        assert!(store.dispatch(Action::SetInitialRank(-1)).is_err());
    }

    #[test]
    fn test_economy_crud_through_dispatch() {
        let mut store = store();
        store.dispatch(Action::AddEconomyRule).unwrap();
        store.dispatch(Action::AddTask).unwrap();

        let economy = &store.snapshot().economy;
        assert_eq!(economy.rules.len(), 4);
        let task = economy.withdrawal_tasks.last().unwrap().clone();

        let mut edited = task.clone();
        edited.name("每日登录").count(Some(1));
        store.dispatch(Action::UpdateTask(edited)).unwrap();
        let stored = store.snapshot().economy.withdrawal_tasks.last().unwrap();
        assert_eq!(stored.name, "每日登录");
        assert_eq!(stored.id, task.id);

        store.dispatch(Action::DeleteTask(task.id)).unwrap();
        assert_eq!(store.snapshot().economy.withdrawal_tasks.len(), 3);
    }

    #[test]
    fn test_new_rule_template_saves_as_global_catch_all_when_widened() {
        let mut store = store();
        let mut input = store.snapshot().ads.new_rule_template();
        input.name = "新规则".to_string();
        input.channels = vec![ALL_CHANNELS.to_string()];
        input.countries = vec![GLOBAL_COUNTRIES.to_string()];

        store
            .dispatch(Action::SaveRule {
                editing: None,
                input,
            })
            .unwrap();
        let rule = store.snapshot().ads.rule("rule_3").unwrap();
        assert_eq!(rule.allocations[0].strategy_id, "str_1");
        assert_eq!(rule.allocations[0].percentage, 100);
    }

    #[test]
    fn test_journal_is_trimmed() {
        let mut store = store();
        for index in 0..(MAX_JOURNAL_ENTRIES + 20) {
            store
                .dispatch(Action::SetQueueEnabled(index % 2 == 0))
                .unwrap();
        }
        assert_eq!(store.journal().len(), MAX_JOURNAL_ENTRIES);
    }
}
