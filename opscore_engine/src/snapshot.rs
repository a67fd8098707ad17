//! JSON export and import of the console state

use crate::{
    state::ConsoleState,
    utils::error::{EngineError, EngineResult},
};

/// Serializes the state into the console's JSON shape.
pub fn export_json(state: &ConsoleState) -> EngineResult<String> {
    serde_json::to_string_pretty(state).map_err(|err| EngineError::DecodingError(err.to_string()))
}

/// Parses a state exported by [`export_json`].
///
/// Rhythm maps are rebuilt against the imported registry: missing keys read 0
/// and keys the registry does not list are dropped. Values the editors would
/// refuse fail with `InvalidRange`.
pub fn import_json(json: &str) -> EngineResult<ConsoleState> {
    let mut state: ConsoleState =
        serde_json::from_str(json).map_err(|err| EngineError::DecodingError(err.to_string()))?;
    state.ads.check()?;
    state.economy.check()?;
    state.economy.conform_rhythms();
    Ok(state)
}
