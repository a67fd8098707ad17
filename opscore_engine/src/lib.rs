mod ads;
mod constants;
mod defaults;
mod economy;
mod journal;
mod settings;
mod snapshot;
mod state;
mod types;
mod utils;

pub use ads::{
    allocation::{allocation_warning, validate, AllocationSummary, AllocationWarning},
    config::AdConfig,
    matcher::{is_wildcard, matches, RequestContext},
    resolver::{
        fallback_rule, resolve, resolve_or_fallback, sample_allocation, select_rule, DrawSource,
        FixedDraw, Resolution, SeededDraw,
    },
    rule::{Allocation, Conditions, Rule, UserTier},
    strategy::{AggregationType, Strategy, StrategyQuery},
};
pub use constants::{
    ALL_CHANNELS, DEFAULT_RULE_PRIORITY, DRAW_UPPER_BOUND, GLOBAL_COUNTRIES, MAX_JOURNAL_ENTRIES,
    MAX_PROBABILITY, PERCENT_TOTAL, PRESET_CHANNELS, PRESET_PROVIDERS, UNKNOWN_STRATEGY,
};
pub use defaults::{
    console_state_for_app, default_ad_config, default_economy_config, utility_economy_config,
    UTILITY_APP_ID,
};
pub use economy::{
    config::EconomyConfig,
    queue::{check as check_queue, QueueCheck, QueueConfig},
    rhythm::{EconomyRule, RhythmKey, RhythmKeyRegistry},
    tasks::WithdrawalTask,
};
pub use journal::{JournalCollection, JournalEntry, LogType};
pub use settings::EngineSettings;
pub use snapshot::{export_json, import_json};
pub use state::{Action, ConsoleState, ConsoleStore};
pub use types::{AllocationQuery, RuleInput, RuleQuery, StrategyInput};
pub use utils::{
    common::parse_advancements,
    error::{EngineError, EngineResult},
};
