//! User feedback about the assistant.

use crate::error::StoreError;
use crate::store::TurnStore;
use chrono::{DateTime, Utc};
use parley_core::FeedbackId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the user felt about an exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Sentiment {
    /// Stored representation: -1, 0 or 1.
    #[must_use]
    pub const fn as_i16(&self) -> i16 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }
}

/// A feedback entry left by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Assigned by the store on insert.
    pub id: FeedbackId,
    pub sentence: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Creates an unsaved feedback entry.
    #[must_use]
    pub fn new(sentence: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            id: FeedbackId::default(),
            sentence: sentence.into(),
            sentiment,
            created_at: Utc::now(),
        }
    }

    /// Inserts the entry and stores the generated ID on it.
    pub async fn save<S: TurnStore + ?Sized>(&mut self, store: &S) -> Result<(), StoreError> {
        self.id = store.insert_feedback(self).await?;
        debug!(feedback_id = %self.id, sentiment = ?self.sentiment, "saved feedback");
        Ok(())
    }
}
