//! NATS client for the classifier service.

use crate::error::ServerError;
use async_trait::async_trait;
use parley_conversation::{Classification, Classifier, ClassifierError};
use parley_dispatch::{Envelope, Registry};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Request body sent to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub sentence: String,
}

/// Vocabulary update published after each registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabUpdate {
    pub words: Vec<String>,
}

/// Classifier reached by NATS request/reply.
#[derive(Debug, Clone)]
pub struct NatsClassifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsClassifier {
    /// Creates a classifier client that sends requests on `subject`.
    #[must_use]
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

/// Decodes the classifier's reply body.
fn decode_classification(bytes: &[u8]) -> Result<Classification, ClassifierError> {
    Envelope::open(bytes, "classifier").map_err(|e| ClassifierError::InvalidResponse {
        reason: e.to_string(),
    })
}

#[async_trait]
impl Classifier for NatsClassifier {
    #[instrument(skip_all, fields(subject = %self.subject))]
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let body = Envelope::new(ClassifyRequest {
            sentence: text.to_string(),
        })
        .to_json_bytes()
        .map_err(|e| ClassifierError::InvalidResponse {
            reason: format!("failed to serialize request: {e}"),
        })?;

        let reply = self
            .client
            .request(self.subject.clone(), body.into())
            .await
            .map_err(|e| ClassifierError::Unavailable {
                reason: e.to_string(),
            })?;

        decode_classification(&reply.payload)
    }
}

/// Publishes the registry's vocabulary to the classifier.
///
/// # Errors
///
/// Returns an error if the update cannot be serialized or published.
#[instrument(skip(client, registry))]
pub async fn publish_vocabulary(
    client: &async_nats::Client,
    subject: &str,
    registry: &Registry,
) -> Result<(), ServerError> {
    let update = VocabUpdate {
        words: registry.vocabulary(),
    };
    let count = update.words.len();
    let body = Envelope::new(update)
        .to_json_bytes()
        .map_err(|e| ServerError::Nats {
            details: format!("failed to serialize vocabulary: {e}"),
        })?;
    client
        .publish(subject.to_string(), body.into())
        .await
        .map_err(|e| ServerError::Nats {
            details: e.to_string(),
        })?;
    debug!(words = count, "published vocabulary");
    Ok(())
}
