//! Ad distribution configuration: the strategy library and the rule set

use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_RULE_PRIORITY, PERCENT_TOTAL, UNKNOWN_STRATEGY},
    types::{AllocationQuery, RuleInput, RuleQuery, StrategyInput},
    utils::error::{invalid_range_err, EngineError, EngineResult},
};

use super::{
    allocation::{allocation_warning, validate, AllocationWarning},
    matcher::RequestContext,
    resolver::{resolve, resolve_or_fallback, DrawSource, Resolution},
    rule::{Allocation, Conditions, Rule},
    strategy::{Strategy, StrategyQuery},
};

/// Strategy library plus the rules referring into it
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdConfig {
    pub strategies: Vec<Strategy>,
    pub rules: Vec<Rule>,
}

impl AdConfig {
    /// Looks up a strategy by id.
    pub fn strategy(&self, id: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|strategy| strategy.id == id)
    }

    /// Name of the strategy, or `UNKNOWN_STRATEGY` if it was deleted.
    pub fn strategy_name(&self, id: &str) -> &str {
        self.strategy(id)
            .map(|strategy| strategy.name.as_str())
            .unwrap_or(UNKNOWN_STRATEGY)
    }

    /// Looks up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Adds a strategy to the library under `id`.
    pub fn create_strategy(&mut self, id: String, input: StrategyInput) -> EngineResult<()> {
        if self.strategy(&id).is_some() {
            return Err(EngineError::DuplicateValue(id));
        }

        let mut strategy = Strategy::default();
        strategy
            .id(id)
            .name(input.name)
            .aggregation_type(input.aggregation_type)
            .provider(input.provider);
        self.strategies.push(strategy);
        Ok(())
    }

    /// Overwrites name, aggregation type and provider of an existing strategy.
    pub fn update_strategy(&mut self, id: &str, input: StrategyInput) -> EngineResult<()> {
        let strategy = self
            .strategies
            .iter_mut()
            .find(|strategy| strategy.id == id)
            .ok_or(EngineError::NonExistentValue)?;

        strategy
            .name(input.name)
            .aggregation_type(input.aggregation_type)
            .provider(input.provider);
        Ok(())
    }

    /// Removes a strategy and prunes its allocations from every rule.
    ///
    /// Pruning runs even if the library no longer holds `id`, which clears
    /// references left dangling by an earlier import. Returns the ids of the rules
    /// whose allocation tables changed; those tables now sum to less than before.
    pub fn delete_strategy(&mut self, id: &str) -> Vec<String> {
        self.strategies.retain(|strategy| strategy.id != id);

        self.rules
            .iter_mut()
            .filter_map(|rule| rule.prune_strategy(id).then(|| rule.id.clone()))
            .collect()
    }

    /// Adds a rule built from a form submission. New rules start enabled.
    ///
    /// Entries above 100 are always rejected. With `strict` set, an allocation
    /// table that does not sum to 100 is rejected as well.
    pub fn create_rule(&mut self, id: String, input: RuleInput, strict: bool) -> EngineResult<()> {
        if self.rule(&id).is_some() {
            return Err(EngineError::DuplicateValue(id));
        }

        let allocations = self.allocations_from_input(&input);
        check_allocations(&allocations, strict)?;

        let conditions = conditions_from_input(&input);
        let mut rule = Rule::default();
        rule.id(id)
            .name(input.name)
            .priority(input.priority)
            .enabled(true)
            .conditions(conditions)
            .allocations(allocations);
        self.rules.push(rule);
        Ok(())
    }

    /// Replaces the editable fields of a rule. Its id and enabled flag are kept.
    pub fn update_rule(&mut self, id: &str, input: RuleInput, strict: bool) -> EngineResult<()> {
        let allocations = self.allocations_from_input(&input);
        check_allocations(&allocations, strict)?;

        let conditions = conditions_from_input(&input);
        let rule = self
            .rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or(EngineError::NonExistentValue)?;

        rule.name(input.name)
            .priority(input.priority)
            .conditions(conditions)
            .allocations(allocations);
        Ok(())
    }

    /// Removes a rule entirely.
    pub fn delete_rule(&mut self, id: &str) -> EngineResult<()> {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.id != id);
        if before == self.rules.len() {
            return Err(EngineError::NonExistentValue);
        }
        Ok(())
    }

    /// Enables or disables a rule.
    pub fn toggle_rule(&mut self, id: &str, enabled: bool) -> EngineResult<()> {
        self.rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .map(|rule| {
                rule.enabled(enabled);
            })
            .ok_or(EngineError::NonExistentValue)
    }

    /// Rules in display order: ascending priority, ties in insertion order.
    pub fn rules_by_priority(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|rule| rule.priority);
        rules
    }

    /// Display form of a rule, resolving strategy names lazily.
    pub fn rule_query(&self, rule: &Rule) -> RuleQuery {
        let allocations = rule
            .allocations
            .iter()
            .map(|allocation| AllocationQuery {
                strategy_id: allocation.strategy_id.clone(),
                strategy_name: self.strategy_name(&allocation.strategy_id).to_string(),
                percentage: allocation.percentage,
                dangling: self.strategy(&allocation.strategy_id).is_none(),
            })
            .collect();

        RuleQuery {
            id: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority,
            enabled: rule.enabled,
            channels: rule.conditions.channels.clone(),
            countries: rule.conditions.countries.clone(),
            user_level: rule.conditions.user_level.label().to_string(),
            allocations,
            summary: validate(&rule.allocations),
            warning: allocation_warning(&rule.allocations),
        }
    }

    /// Display form of every rule, in priority order.
    pub fn rule_queries(&self) -> Vec<RuleQuery> {
        self.rules_by_priority()
            .into_iter()
            .map(|rule| self.rule_query(rule))
            .collect()
    }

    /// Display form of the library.
    pub fn strategy_queries(&self) -> Vec<StrategyQuery> {
        self.strategies
            .iter()
            .map(|strategy| StrategyQuery {
                id: strategy.id.clone(),
                name: strategy.name.clone(),
                aggregation_type: strategy.aggregation_type,
                provider: strategy.provider.clone(),
                referenced_by: self
                    .rules
                    .iter()
                    .filter(|rule| rule.references(&strategy.id))
                    .count() as u32,
            })
            .collect()
    }

    /// Rules whose allocation tables do not sum to 100, with the reason.
    pub fn allocation_warnings(&self) -> Vec<(String, AllocationWarning)> {
        self.rules
            .iter()
            .filter_map(|rule| {
                allocation_warning(&rule.allocations).map(|warning| (rule.id.clone(), warning))
            })
            .collect()
    }

    /// Checks that no allocation of any rule exceeds 100.
    pub fn check(&self) -> EngineResult<()> {
        for rule in &self.rules {
            check_allocations(&rule.allocations, false)?;
        }
        Ok(())
    }

    /// Pre-filled submission for a new rule: default priority, empty targeting,
    /// and the first library strategy at 100%.
    pub fn new_rule_template(&self) -> RuleInput {
        let mut input = RuleInput {
            priority: DEFAULT_RULE_PRIORITY,
            ..Default::default()
        };
        if let Some(first) = self.strategies.first() {
            input.allocations.insert(first.id.clone(), PERCENT_TOTAL);
        }
        input
    }

    /// Resolves a request context to a strategy.
    pub fn resolve<D: DrawSource + ?Sized>(
        &self,
        context: &RequestContext,
        draws: &mut D,
    ) -> Resolution {
        resolve(&self.rules, context, draws)
    }

    /// Resolves a request context, re-sampling the fallback rule on an unallocated draw.
    pub fn resolve_or_fallback<D: DrawSource + ?Sized>(
        &self,
        context: &RequestContext,
        draws: &mut D,
    ) -> Resolution {
        resolve_or_fallback(&self.rules, context, draws)
    }

    /// Converts the form's id-keyed allocations into an ordered table.
    /// Zero entries are dropped. Library strategies come first in library order,
    /// ids unknown to the library follow in key order.
    fn allocations_from_input(&self, input: &RuleInput) -> Vec<Allocation> {
        let known = self.strategies.iter().filter_map(|strategy| {
            input
                .allocations
                .get(&strategy.id)
                .map(|percentage| Allocation::new(strategy.id.clone(), *percentage))
        });
        let unknown = input
            .allocations
            .iter()
            .filter(|(id, _)| self.strategy(id).is_none())
            .map(|(id, percentage)| Allocation::new(id.clone(), *percentage));

        known
            .chain(unknown)
            .filter(|allocation| allocation.percentage > 0)
            .collect()
    }
}

fn conditions_from_input(input: &RuleInput) -> Conditions {
    let mut conditions = Conditions::default();
    conditions
        .channels(input.channels.iter().cloned())
        .countries(input.countries.iter().cloned())
        .user_level(input.user_level);
    conditions
}

fn check_allocations(allocations: &[Allocation], strict: bool) -> EngineResult<()> {
    if let Some(allocation) = allocations
        .iter()
        .find(|allocation| allocation.percentage > PERCENT_TOTAL)
    {
        return Err(invalid_range_err(format!(
            "Allocation of {} is {}%, above 100%.",
            allocation.strategy_id, allocation.percentage
        )));
    }

    let summary = validate(allocations);
    if strict && !summary.valid {
        return Err(EngineError::InvalidAllocation { sum: summary.sum });
    }
    Ok(())
}
