//! Persistence contract for turns.
//!
//! Queries that find nothing return `Ok(None)`; only real failures are
//! errors.

use crate::error::StoreError;
use crate::feedback::Feedback;
use crate::input::Slot;
use crate::msg::{Msg, State};
use async_trait::async_trait;
use parley_core::{FeedbackId, MessageId, UserId};

/// Trait for turn persistence.
///
/// This abstraction lets the router and the context engine run against
/// Postgres in production and an in-memory store in tests.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Inserts a turn and returns its generated ID.
    async fn insert_msg(&self, msg: &Msg) -> Result<MessageId, StoreError>;

    /// Updates the sentence and handler name of a persisted turn.
    async fn update_msg(&self, msg: &Msg) -> Result<(), StoreError>;

    /// Fetches a turn's `id`, `sentence` and `ava_sent` by ID.
    async fn get_msg(&self, id: MessageId) -> Result<Option<Msg>, StoreError>;

    /// Most recent non-empty routing key among the user's own turns.
    async fn last_route(&self, user: UserId) -> Result<Option<String>, StoreError>;

    /// The user's most recent assistant-authored turn (`id`, `route`,
    /// `sentence`).
    async fn last_assistant_msg(&self, user: UserId) -> Result<Option<Msg>, StoreError>;

    /// Persisted conversational state of a handler.
    async fn package_state(&self, package: &str) -> Result<Option<State>, StoreError>;

    /// Records the structured input of a saved turn for later context
    /// lookups.
    async fn insert_input(&self, msg: &Msg) -> Result<(), StoreError>;

    /// Last value of `slot` on the user's most recent input that detected at
    /// least one object.
    async fn last_slot_value(&self, user: UserId, slot: Slot)
    -> Result<Option<String>, StoreError>;

    /// Inserts a feedback entry and returns its generated ID.
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError>;
}
