//! Core types shared across the parley crates.
//!
//! This crate provides the strongly-typed identifiers and the `Result` alias
//! used by the routing core and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{FeedbackId, MessageId, ParseIdError, UserId};
