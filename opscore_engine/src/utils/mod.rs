//! Utility and helper functions needed for:
//! - Error handling
//! - Parsing free-text form input
//! - Id generation and percentage arithmetic

pub(crate) mod common;
pub(crate) mod error;
