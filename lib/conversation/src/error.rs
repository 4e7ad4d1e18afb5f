//! Error types for the conversation crate.
//!
//! - `StoreError`: persistence failures (never "no rows", which is `Ok(None)`)
//! - `ContextError`: pronoun resolution failures
//! - `ClassifierError`: the external classifier could not produce a result
//! - `ConversationError`: turn-level history lookups

use std::fmt;

/// Errors from turn store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Query failed to execute.
    QueryFailed { reason: String },
    /// A row could not be converted into a domain value.
    InvalidData { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => write!(f, "turn store query failed: {reason}"),
            Self::InvalidData { reason } => write!(f, "invalid turn store data: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from context resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Context lookups need an identified user.
    MissingUser,
    /// The classifier produced a pronoun with no known category.
    UnknownPronoun { pronoun: String },
    /// History lookup failed.
    Store(StoreError),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser => write!(f, "missing user"),
            Self::UnknownPronoun { pronoun } => {
                write!(f, "unknown type found for pronoun '{pronoun}'")
            }
            Self::Store(e) => write!(f, "context lookup failed: {e}"),
        }
    }
}

impl std::error::Error for ContextError {}

impl From<StoreError> for ContextError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Errors from the external classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// The classifier could not be reached.
    Unavailable { reason: String },
    /// The classifier answered with something unusable.
    InvalidResponse { reason: String },
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "classifier unavailable: {reason}"),
            Self::InvalidResponse { reason } => {
                write!(f, "invalid classifier response: {reason}")
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Errors from turn-level history lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The lookup is scoped to a user and the turn has none.
    MissingUser,
    /// Underlying store failure.
    Store(StoreError),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser => write!(f, "missing user"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConversationError {}

impl From<StoreError> for ConversationError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pronoun_names_the_token() {
        let err = ContextError::UnknownPronoun {
            pronoun: "whom".to_string(),
        };
        assert!(err.to_string().contains("whom"));
    }

    #[test]
    fn store_error_converts_into_context_error() {
        let err: ContextError = StoreError::QueryFailed {
            reason: "connection reset".to_string(),
        }
        .into();
        assert!(matches!(err, ContextError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
