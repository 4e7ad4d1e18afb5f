//! Database repositories for parley.
//!
//! This module provides data access for:
//! - Turns and the classifier input recorded with them
//! - Package conversational state
//! - User feedback

pub mod turn;

pub use turn::PgTurnStore;
