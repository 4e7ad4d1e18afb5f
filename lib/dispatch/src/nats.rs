//! NATS request/reply transport for handler connections.
//!
//! Each package runs its own NATS endpoint one port above its configured
//! port. A turn is sent as a request on `<package>.run` or
//! `<package>.follow_up`; bodies in both directions are wrapped in an
//! [`Envelope`].

use crate::connection::{Connector, DispatchMode, HandlerConnection};
use crate::envelope::Envelope;
use crate::error::{ConnectError, DispatchError};
use crate::package::PkgConfig;
use async_trait::async_trait;
use parley_conversation::{Msg, RespMsg};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Body a handler sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandlerReply {
    Ok { reply: RespMsg },
    Error { message: String },
}

/// Returns the subject a package serves `mode` on.
#[must_use]
pub fn subject(package: &str, mode: DispatchMode) -> String {
    format!("{}.{}", package.to_lowercase(), mode.operation())
}

/// Decodes a handler's reply body.
///
/// # Errors
///
/// - `InvalidReply` if the body is not an enveloped [`HandlerReply`]
/// - `Handler` if the handler reported an error
pub fn decode_reply(package: &str, bytes: &[u8]) -> Result<RespMsg, DispatchError> {
    let reply = Envelope::<HandlerReply>::open(bytes, package).map_err(|e| {
        DispatchError::InvalidReply {
            package: package.to_string(),
            message: e.to_string(),
        }
    })?;
    match reply {
        HandlerReply::Ok { reply } => Ok(reply),
        HandlerReply::Error { message } => Err(DispatchError::Handler {
            package: package.to_string(),
            message,
        }),
    }
}

/// Opens a NATS client per package.
#[derive(Debug, Clone, Copy, Default)]
pub struct NatsConnector;

#[async_trait]
impl Connector for NatsConnector {
    #[instrument(skip(self, config), fields(pkg = %config.name))]
    async fn connect(
        &self,
        config: &PkgConfig,
        endpoint: &str,
    ) -> Result<Arc<dyn HandlerConnection>, ConnectError> {
        let url = format!("nats://{endpoint}");
        let client = async_nats::connect(url.as_str())
            .await
            .map_err(|e| ConnectError {
                address: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        debug!(%url, "connected to package");
        Ok(Arc::new(NatsHandlerConnection {
            client,
            package: config.name.clone(),
        }))
    }
}

/// A package reached over NATS.
#[derive(Debug, Clone)]
pub struct NatsHandlerConnection {
    client: async_nats::Client,
    package: String,
}

impl NatsHandlerConnection {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: async_nats::Client, package: impl Into<String>) -> Self {
        Self {
            client,
            package: package.into(),
        }
    }

    async fn request(&self, mode: DispatchMode, msg: &Msg) -> Result<RespMsg, DispatchError> {
        let body = Envelope::new(msg)
            .to_json_bytes()
            .map_err(|e| DispatchError::Transport {
                package: self.package.clone(),
                message: format!("failed to serialize turn: {e}"),
            })?;

        let reply = self
            .client
            .request(subject(&self.package, mode), body.into())
            .await
            .map_err(|e| DispatchError::Transport {
                package: self.package.clone(),
                message: e.to_string(),
            })?;

        decode_reply(&self.package, &reply.payload)
    }
}

#[async_trait]
impl HandlerConnection for NatsHandlerConnection {
    async fn run(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.request(DispatchMode::Run, msg).await
    }

    async fn follow_up(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.request(DispatchMode::FollowUp, msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::MessageId;

    #[test]
    fn subjects_are_package_then_operation() {
        assert_eq!(subject("Coffee", DispatchMode::Run), "coffee.run");
        assert_eq!(subject("pizza", DispatchMode::FollowUp), "pizza.follow_up");
    }

    #[test]
    fn ok_reply_decodes() {
        let body = Envelope::new(HandlerReply::Ok {
            reply: RespMsg::new(MessageId::new(9), "One latte, coming up."),
        })
        .to_json_bytes()
        .unwrap();

        let reply = decode_reply("coffee", &body).unwrap();

        assert_eq!(reply.msg_id, MessageId::new(9));
        assert_eq!(reply.sentence, "One latte, coming up.");
    }

    #[test]
    fn error_reply_is_a_handler_error() {
        let body = br#"{"version":1,"payload":{"status":"error","message":"out of beans"}}"#;

        let err = decode_reply("coffee", body).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Handler {
                package: "coffee".to_string(),
                message: "out of beans".to_string()
            }
        );
    }

    #[test]
    fn garbage_is_an_invalid_reply() {
        let err = decode_reply("coffee", b"not json").unwrap_err();

        assert!(matches!(err, DispatchError::InvalidReply { package, .. } if package == "coffee"));
    }
}
