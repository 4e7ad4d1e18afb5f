//! In-memory turn store.
//!
//! Recency is insertion order. Used by tests across the workspace and for
//! running the pipeline without a database.

use crate::error::StoreError;
use crate::feedback::Feedback;
use crate::input::{Slot, StructuredInput};
use crate::msg::{Msg, State};
use crate::store::TurnStore;
use async_trait::async_trait;
use parley_core::{FeedbackId, MessageId, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    messages: Vec<Msg>,
    inputs: Vec<(Option<UserId>, StructuredInput)>,
    states: HashMap<String, State>,
    feedback: Vec<Feedback>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Turn store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryTurnStore {
    tables: Mutex<Tables>,
}

impl InMemoryTurnStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the persisted state of a handler.
    pub fn put_package_state(&self, package: impl Into<String>, state: State) {
        self.tables().states.insert(package.into(), state);
    }

    /// Returns every stored turn, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Msg> {
        self.tables().messages.clone()
    }

    /// Returns every stored feedback entry, oldest first.
    #[must_use]
    pub fn feedback(&self) -> Vec<Feedback> {
        self.tables().feedback.clone()
    }
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn insert_msg(&self, msg: &Msg) -> Result<MessageId, StoreError> {
        let mut tables = self.tables();
        let id = MessageId::new(tables.next_id());
        let mut stored = msg.clone();
        stored.id = id;
        tables.messages.push(stored);
        Ok(id)
    }

    async fn update_msg(&self, msg: &Msg) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if let Some(stored) = tables.messages.iter_mut().find(|m| m.id == msg.id) {
            stored.sentence = msg.sentence.clone();
            stored.package = msg.package.clone();
        }
        Ok(())
    }

    async fn get_msg(&self, id: MessageId) -> Result<Option<Msg>, StoreError> {
        Ok(self
            .tables()
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| Msg {
                id: m.id,
                sentence: m.sentence.clone(),
                ava_sent: m.ava_sent,
                ..Default::default()
            }))
    }

    async fn last_route(&self, user: UserId) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables()
            .messages
            .iter()
            .rev()
            .find(|m| m.user_id() == Some(user) && !m.ava_sent && !m.route.is_empty())
            .map(|m| m.route.clone()))
    }

    async fn last_assistant_msg(&self, user: UserId) -> Result<Option<Msg>, StoreError> {
        Ok(self
            .tables()
            .messages
            .iter()
            .rev()
            .find(|m| m.user_id() == Some(user) && m.ava_sent)
            .map(|m| Msg {
                id: m.id,
                route: m.route.clone(),
                sentence: m.sentence.clone(),
                ava_sent: true,
                ..Default::default()
            }))
    }

    async fn package_state(&self, package: &str) -> Result<Option<State>, StoreError> {
        Ok(self.tables().states.get(package).cloned())
    }

    async fn insert_input(&self, msg: &Msg) -> Result<(), StoreError> {
        self.tables()
            .inputs
            .push((msg.user_id(), msg.structured_input.clone()));
        Ok(())
    }

    async fn last_slot_value(
        &self,
        user: UserId,
        slot: Slot,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables()
            .inputs
            .iter()
            .rev()
            .find(|(owner, input)| *owner == Some(user) && input.has_objects())
            .and_then(|(_, input)| input.referent(slot).cloned()))
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError> {
        let mut tables = self.tables();
        let id = FeedbackId::new(tables.next_id());
        let mut stored = feedback.clone();
        stored.id = id;
        tables.feedback.push(stored);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Sentiment;
    use crate::msg::User;

    fn user_turn(user: u64, route: &str, ava_sent: bool) -> Msg {
        let mut msg = Msg::new(Some(User::new(UserId::new(user))), "text");
        msg.route = route.to_string();
        msg.ava_sent = ava_sent;
        msg
    }

    #[tokio::test]
    async fn last_route_skips_assistant_and_unrouted_turns() {
        let store = InMemoryTurnStore::new();
        store.insert_msg(&user_turn(1, "order_pizza", false)).await.unwrap();
        store.insert_msg(&user_turn(1, "", false)).await.unwrap();
        store.insert_msg(&user_turn(1, "buy_coffee", true)).await.unwrap();
        store.insert_msg(&user_turn(2, "book_flight", false)).await.unwrap();

        let route = store.last_route(UserId::new(1)).await.unwrap();
        assert_eq!(route.as_deref(), Some("order_pizza"));
        assert_eq!(store.last_route(UserId::new(3)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_slot_value_uses_latest_input_with_objects() {
        let store = InMemoryTurnStore::new();
        let owner = Some(User::new(UserId::new(1)));
        let with_objects = Msg::new(owner.clone(), "call bob about the car").with_structured_input(
            StructuredInput {
                objects: vec!["car".to_string()],
                actors: vec!["alice".to_string(), "bob".to_string()],
                ..Default::default()
            },
        );
        let without_objects = Msg::new(owner, "call carol").with_structured_input(StructuredInput {
            actors: vec!["carol".to_string()],
            ..Default::default()
        });
        store.insert_input(&with_objects).await.unwrap();
        store.insert_input(&without_objects).await.unwrap();

        let actor = store.last_slot_value(UserId::new(1), Slot::Actor).await.unwrap();
        assert_eq!(actor.as_deref(), Some("bob"));
        let place = store.last_slot_value(UserId::new(1), Slot::Place).await.unwrap();
        assert_eq!(place, None);
    }

    #[tokio::test]
    async fn last_slot_value_ignores_stored_pronouns() {
        let store = InMemoryTurnStore::new();
        let owner = Some(User::new(UserId::new(1)));
        let unresolved = Msg::new(owner, "buy it for him").with_structured_input(StructuredInput {
            objects: vec!["coffee".to_string(), "it".to_string()],
            actors: vec!["him".to_string()],
            ..Default::default()
        });
        store.insert_input(&unresolved).await.unwrap();

        let object = store.last_slot_value(UserId::new(1), Slot::Object).await.unwrap();
        assert_eq!(object.as_deref(), Some("coffee"));
        let actor = store.last_slot_value(UserId::new(1), Slot::Actor).await.unwrap();
        assert_eq!(actor, None);
    }

    #[tokio::test]
    async fn feedback_ids_are_assigned() {
        let store = InMemoryTurnStore::new();
        let id = store
            .insert_feedback(&Feedback::new("nice", Sentiment::Positive))
            .await
            .unwrap();
        assert!(!id.is_unassigned());
        assert_eq!(store.feedback()[0].id, id);
    }
}
