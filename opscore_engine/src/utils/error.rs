use candid::CandidType;
use serde::Deserialize;

/// OpsCore engine result
pub type EngineResult<T> = Result<T, EngineError>;

/// OpsCore engine errors
///
/// Advisory conditions (allocation or queue sum mismatches, dangling strategy
/// references, malformed numeric tokens) are reported through report structs and
/// never show up here.
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub enum EngineError {
    /// A requested value does not exist
    NonExistentValue,
    /// A value with the same identity is already registered
    DuplicateValue(String),
    /// The rhythm key is not present in the registry
    UnknownRhythmKey(String),
    /// Strict mode rejected an allocation table that does not sum to 100
    InvalidAllocation { sum: u32 },
    /// A numeric field is outside of its allowed range
    InvalidRange(String),
    /// Decoding issue
    DecodingError(String),
    /// Unknown/Custom error
    Custom(String),
}

pub fn invalid_range_err<S: AsRef<str>>(s: S) -> EngineError {
    EngineError::InvalidRange(format!("{:#?}", s.as_ref()))
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NonExistentValue => write!(f, "the requested value does not exist"),
            EngineError::DuplicateValue(value) => write!(f, "{} is already registered", value),
            EngineError::UnknownRhythmKey(key) => write!(f, "rhythm key {} is not registered", key),
            EngineError::InvalidAllocation { sum } => {
                write!(f, "allocations sum to {}% instead of 100%", sum)
            }
            EngineError::InvalidRange(message) => write!(f, "invalid range: {}", message),
            EngineError::DecodingError(message) => write!(f, "decoding error: {}", message),
            EngineError::Custom(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for EngineError {}
