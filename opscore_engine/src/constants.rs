//! OpsCore engine constants
// The preset lists mirror what the console offers in its pickers. They are
// suggestions only; rules may carry any channel or country string.

/// The total an allocation table must reach to be considered complete
pub const PERCENT_TOTAL: u32 = 100;

/// Exclusive upper bound of every traffic draw. Draws are uniform in `[0, DRAW_UPPER_BOUND)`.
pub const DRAW_UPPER_BOUND: u32 = 100;

/// Channel sentinel matching every traffic source
pub const ALL_CHANNELS: &str = "所有渠道";

/// Country sentinel matching every region
pub const GLOBAL_COUNTRIES: &str = "全球";

/// Display name used for allocations whose strategy no longer exists
pub const UNKNOWN_STRATEGY: &str = "unknown strategy";

/// Maximum number of journal entries kept by the store
pub const MAX_JOURNAL_ENTRIES: usize = 300;

/// Priority assigned to rules created from the template
pub const DEFAULT_RULE_PRIORITY: u32 = 10;

/// Upper bound of the economy probability fields
pub const MAX_PROBABILITY: u32 = 100;

/// Channels offered by the rule editor
pub const PRESET_CHANNELS: [&str; 8] = [
    "Organic (自然量)",
    "Facebook",
    "Google Ads",
    "Applovin",
    "MTG",
    "Unity Ads",
    "IronSource",
    "TikTok",
];

/// Mediation providers offered by the strategy editor
pub const PRESET_PROVIDERS: [&str; 5] = ["TopOn", "Max", "Admob", "TradPlus", "IronSource"];

/// Balance range of a freshly added economy rule
pub const NEW_ECONOMY_RULE_BALANCE: (f64, f64) = (0.0, 100.0);

/// Interstitial and rewarded probabilities of a freshly added economy rule
pub const NEW_ECONOMY_RULE_PROBABILITY: u32 = 50;

/// Name of a freshly added withdrawal task
pub const NEW_TASK_NAME: &str = "新任务";

/// Required completions of a freshly added withdrawal task
pub const NEW_TASK_COUNT: u32 = 10;
