//! Error types for the server.
//!
//! - `PipelineError`: a turn could not be processed
//! - `ServerError`: start-up and listener failures
//!
//! Both are carried in a rootcause `Report` at this boundary.

use parley_conversation::{ContextError, StoreError};
use parley_dispatch::{DispatchError, RoutingError};
use std::fmt;

/// Errors from processing one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Pronoun resolution failed.
    Context(ContextError),
    /// No package could be picked for the turn.
    Routing(RoutingError),
    /// The package could not be invoked.
    Dispatch(DispatchError),
    /// Turn history could not be read or written.
    Store(StoreError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(e) => write!(f, "context resolution failed: {e}"),
            Self::Routing(e) => write!(f, "routing failed: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch failed: {e}"),
            Self::Store(e) => write!(f, "turn persistence failed: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ContextError> for PipelineError {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}

impl From<RoutingError> for PipelineError {
    fn from(e: RoutingError) -> Self {
        Self::Routing(e)
    }
}

impl From<DispatchError> for PipelineError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Errors that stop the server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The database could not be reached or migrated.
    Database { details: String },
    /// NATS could not be reached or subscribed to.
    Nats { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "configuration error: {details}"),
            Self::Database { details } => write!(f, "database error: {details}"),
            Self::Nats { details } => write!(f, "nats error: {details}"),
        }
    }
}

impl std::error::Error for ServerError {}
