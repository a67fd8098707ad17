//! Ad traffic distribution: the strategy library, targeting rules and the
//! resolution of a request context to a strategy.

pub(crate) mod allocation;
pub(crate) mod config;
pub(crate) mod matcher;
pub(crate) mod resolver;
pub(crate) mod rule;
pub(crate) mod strategy;
