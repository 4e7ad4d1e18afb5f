//! Turns and handler replies.

use crate::error::{ConversationError, StoreError};
use crate::input::StructuredInput;
use crate::store::TurnStore;
use parley_core::{MessageId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Conversational state owned by the handler that served a turn.
pub type State = serde_json::Map<String, JsonValue>;

/// How the user behind a flex ID is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexIdType {
    /// Not known yet.
    #[default]
    Unknown,
    /// Email address.
    Email,
    /// Phone number (SMS).
    Phone,
}

impl FlexIdType {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(&self) -> i16 {
        match self {
            Self::Unknown => 0,
            Self::Email => 1,
            Self::Phone => 2,
        }
    }
}

/// An identified user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// Creates a user with no display name.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self { id, name: None }
    }
}

/// One turn: either a user utterance or an assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    /// Assigned by the store on insert.
    pub id: MessageId,
    /// Channel-agnostic user address.
    pub flex_id: String,
    pub flex_id_type: FlexIdType,
    /// `None` for anonymous or brand-new contacts.
    pub user: Option<User>,
    pub sentence: String,
    pub sentence_annotated: String,
    pub structured_input: StructuredInput,
    pub stems: Vec<String>,
    /// Words and punctuation marks as separate tokens.
    pub sentence_fields: Vec<String>,
    /// Routing key this turn was served on.
    pub route: String,
    /// Name of the handler that served this turn.
    pub package: String,
    pub state: State,
    /// True if the assistant authored this turn.
    pub ava_sent: bool,
}

impl Msg {
    /// Creates an unclassified user turn.
    #[must_use]
    pub fn new(user: Option<User>, sentence: impl Into<String>) -> Self {
        let sentence = sentence.into();
        Self {
            user,
            sentence_fields: sentence_fields(&sentence),
            sentence,
            ..Default::default()
        }
    }

    /// Sets the flex ID the turn arrived on.
    #[must_use]
    pub fn with_flex_id(mut self, flex_id: impl Into<String>, flex_id_type: FlexIdType) -> Self {
        self.flex_id = flex_id.into();
        self.flex_id_type = flex_id_type;
        self
    }

    /// Sets the classifier output.
    #[must_use]
    pub fn with_structured_input(mut self, input: StructuredInput) -> Self {
        self.structured_input = input;
        self
    }

    /// Returns the ID of the attached user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Builds the assistant-authored turn that records a handler's reply.
    #[must_use]
    pub fn reply_turn(&self, reply: &RespMsg) -> Self {
        Self {
            flex_id: self.flex_id.clone(),
            flex_id_type: self.flex_id_type,
            user: self.user.clone(),
            sentence_fields: sentence_fields(&reply.sentence),
            sentence: reply.sentence.clone(),
            route: self.route.clone(),
            package: self.package.clone(),
            ava_sent: true,
            ..Default::default()
        }
    }

    /// Inserts the turn and stores the generated ID on it.
    pub async fn save<S: TurnStore + ?Sized>(&mut self, store: &S) -> Result<(), StoreError> {
        self.id = store.insert_msg(self).await?;
        debug!(msg_id = %self.id, "saved turn");
        Ok(())
    }

    /// Persists a changed sentence or handler name.
    pub async fn update<S: TurnStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        store.update_msg(self).await
    }

    /// Fetches a turn by ID. Only `id`, `sentence` and `ava_sent` are loaded.
    pub async fn get<S: TurnStore + ?Sized>(
        store: &S,
        id: MessageId,
    ) -> Result<Option<Self>, StoreError> {
        store.get_msg(id).await
    }

    /// Returns the routing key of this user's most recent utterance, if any.
    pub async fn last_route<S: TurnStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<String>, ConversationError> {
        let user = self.user_id().ok_or(ConversationError::MissingUser)?;
        Ok(store.last_route(user).await?)
    }

    /// Returns the assistant's most recent turn for this user.
    pub async fn last_msg<S: TurnStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<Self>, ConversationError> {
        debug!("getting last response");
        let user = self.user.as_ref().ok_or(ConversationError::MissingUser)?;
        let last = store.last_assistant_msg(user.id).await?;
        Ok(last.map(|mut msg| {
            msg.user = Some(user.clone());
            msg
        }))
    }

    /// Loads the persisted state of the handler named in `package`.
    ///
    /// A handler with no saved state leaves `state` untouched.
    pub async fn load_state<S: TurnStore + ?Sized>(&mut self, store: &S) -> Result<(), StoreError> {
        match store.package_state(&self.package).await? {
            Some(state) => self.state = state,
            None => warn!(pkg = %self.package, "no state found for package"),
        }
        Ok(())
    }
}

/// A handler's reply to a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespMsg {
    /// The turn being answered.
    pub msg_id: MessageId,
    pub sentence: String,
}

impl RespMsg {
    /// Creates a reply to the given turn.
    #[must_use]
    pub fn new(msg_id: MessageId, sentence: impl Into<String>) -> Self {
        Self {
            msg_id,
            sentence: sentence.into(),
        }
    }

    /// Returns true if the handler had nothing to say.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentence.is_empty()
    }
}

/// Splits a sentence into lowercase words, with `' " , . : ; ! ?` emitted as
/// tokens of their own in the order they appear.
#[must_use]
pub fn sentence_fields(sentence: &str) -> Vec<String> {
    let mut fields = Vec::new();
    for word in sentence.split_whitespace() {
        let mut current = String::new();
        for c in word.chars() {
            if matches!(c, '\'' | '"' | ',' | '.' | ':' | ';' | '!' | '?') {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current).to_lowercase());
                }
                fields.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            fields.push(current.to_lowercase());
        }
    }
    fields
}
