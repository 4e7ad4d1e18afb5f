//! NATS subscriptions for package registration, user turns and feedback.
//!
//! Every inbound request is handled on its own task, so a slow package or
//! classifier only delays the turns bound for it.

use crate::classifier::publish_vocabulary;
use crate::error::ServerError;
use crate::pipeline::{InboundTurn, Pipeline};
use async_nats::Subject;
use futures::StreamExt;
use parley_conversation::{Feedback, RespMsg, Sentiment, TurnStore};
use parley_core::FeedbackId;
use parley_dispatch::{Connector, Envelope, Pkg, Registry, RouteKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Sent when no package can take a turn.
pub const NOT_UNDERSTOOD: &str = "Sorry, I don't know how to help with that yet.";

/// Sent when a turn fails.
pub const APOLOGY: &str = "Sorry, something went wrong on my end. Please try again.";

/// Reply to a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationReply {
    Ok { routes: Vec<RouteKey> },
    Error { message: String },
}

/// Feedback as delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFeedback {
    pub sentence: String,
    #[serde(default)]
    pub sentiment: Sentiment,
}

/// Reply to a feedback submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackReply {
    Ok { id: FeedbackId },
    Error { message: String },
}

/// Registers the package described by an enveloped [`Pkg`] body.
pub async fn handle_registration(
    registry: &Registry,
    connector: &dyn Connector,
    body: &[u8],
) -> RegistrationReply {
    let pkg = match Envelope::<Pkg>::from_json_bytes(body) {
        Ok(envelope) => envelope.into_payload(),
        Err(e) => {
            warn!(error = %e, "malformed registration request");
            return RegistrationReply::Error {
                message: format!("malformed registration request: {e}"),
            };
        }
    };

    match registry.register(pkg, connector).await {
        Ok(registration) => RegistrationReply::Ok {
            routes: registration.routes,
        },
        Err(e) => {
            error!(error = %e, "registration failed");
            RegistrationReply::Error {
                message: e.to_string(),
            }
        }
    }
}

/// Processes an enveloped [`InboundTurn`] body and returns what to tell the
/// user.
///
/// Failures are logged and answered with [`APOLOGY`]; turns no package can
/// take are answered with [`NOT_UNDERSTOOD`].
pub async fn handle_turn(pipeline: &Pipeline, body: &[u8]) -> RespMsg {
    let turn = match Envelope::<InboundTurn>::from_json_bytes(body) {
        Ok(envelope) => envelope.into_payload(),
        Err(e) => {
            warn!(error = %e, "malformed turn");
            return RespMsg::new(Default::default(), APOLOGY);
        }
    };

    match pipeline.process(turn).await {
        Ok(reply) if reply.is_empty() => RespMsg::new(reply.msg_id, NOT_UNDERSTOOD),
        Ok(reply) => reply,
        Err(report) => {
            error!(error = %report, "processing turn");
            RespMsg::new(Default::default(), APOLOGY)
        }
    }
}

/// Stores an enveloped [`InboundFeedback`] body.
pub async fn handle_feedback(store: &dyn TurnStore, body: &[u8]) -> FeedbackReply {
    let inbound = match Envelope::<InboundFeedback>::from_json_bytes(body) {
        Ok(envelope) => envelope.into_payload(),
        Err(e) => {
            warn!(error = %e, "malformed feedback");
            return FeedbackReply::Error {
                message: format!("malformed feedback: {e}"),
            };
        }
    };

    let mut feedback = Feedback::new(inbound.sentence, inbound.sentiment);
    match feedback.save(store).await {
        Ok(()) => FeedbackReply::Ok { id: feedback.id },
        Err(e) => {
            error!(error = %e, "saving feedback");
            FeedbackReply::Error {
                message: e.to_string(),
            }
        }
    }
}

async fn respond<T: Serialize>(client: &async_nats::Client, reply_to: Option<Subject>, body: T) {
    let Some(reply_to) = reply_to else {
        warn!("request has no reply subject");
        return;
    };
    let bytes = match Envelope::new(body).to_json_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "serializing reply");
            return;
        }
    };
    if let Err(e) = client.publish(reply_to, bytes.into()).await {
        error!(error = %e, "sending reply");
    }
}

/// Accepts package registrations until the subscription ends.
///
/// After each successful registration the full vocabulary is republished to
/// the classifier.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created.
#[instrument(skip(client, registry, connector))]
pub async fn serve_registrations(
    client: async_nats::Client,
    subject: String,
    vocab_subject: String,
    registry: Arc<Registry>,
    connector: Arc<dyn Connector>,
) -> Result<(), ServerError> {
    let mut requests = client
        .subscribe(subject.clone())
        .await
        .map_err(|e| ServerError::Nats {
            details: format!("subscribing to {subject}: {e}"),
        })?;
    info!("accepting package registrations");

    while let Some(request) = requests.next().await {
        let client = client.clone();
        let registry = Arc::clone(&registry);
        let connector = Arc::clone(&connector);
        let vocab_subject = vocab_subject.clone();
        tokio::spawn(async move {
            let reply =
                handle_registration(&registry, connector.as_ref(), &request.payload).await;
            if matches!(reply, RegistrationReply::Ok { .. }) {
                if let Err(e) = publish_vocabulary(&client, &vocab_subject, &registry).await {
                    warn!(error = %e, "publishing vocabulary");
                }
            }
            respond(&client, request.reply, reply).await;
        });
    }

    warn!("registration subscription closed");
    Ok(())
}

/// Answers user turns until the subscription ends.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created.
#[instrument(skip(client, pipeline))]
pub async fn serve_turns(
    client: async_nats::Client,
    subject: String,
    pipeline: Arc<Pipeline>,
) -> Result<(), ServerError> {
    let mut requests = client
        .subscribe(subject.clone())
        .await
        .map_err(|e| ServerError::Nats {
            details: format!("subscribing to {subject}: {e}"),
        })?;
    info!("accepting turns");

    while let Some(request) = requests.next().await {
        let client = client.clone();
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let reply = handle_turn(&pipeline, &request.payload).await;
            respond(&client, request.reply, reply).await;
        });
    }

    warn!("turn subscription closed");
    Ok(())
}

/// Stores user feedback until the subscription ends.
///
/// # Errors
///
/// Returns an error if the subscription cannot be created.
#[instrument(skip(client, store))]
pub async fn serve_feedback(
    client: async_nats::Client,
    subject: String,
    store: Arc<dyn TurnStore>,
) -> Result<(), ServerError> {
    let mut requests = client
        .subscribe(subject.clone())
        .await
        .map_err(|e| ServerError::Nats {
            details: format!("subscribing to {subject}: {e}"),
        })?;
    info!("accepting feedback");

    while let Some(request) = requests.next().await {
        let client = client.clone();
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let reply = handle_feedback(store.as_ref(), &request.payload).await;
            respond(&client, request.reply, reply).await;
        });
    }

    warn!("feedback subscription closed");
    Ok(())
}
