//! Wire wrapper for NATS bodies.
//!
//! Registrations, turns, handler requests and replies, and classifier
//! traffic all travel as `{"version": N, "payload": ...}`. A peer on another
//! version is still decoded; the mismatch is only logged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Version this build writes.
pub const CURRENT_VERSION: u32 = 1;

/// A body on the handler or classifier transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps `payload` at [`CURRENT_VERSION`].
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            version: CURRENT_VERSION,
            payload,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Returns true if the sender wrote [`CURRENT_VERSION`].
    #[must_use]
    pub fn is_current_version(&self) -> bool {
        self.version == CURRENT_VERSION
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encodes the body for publishing.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded as JSON.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes a received body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an envelope around a `T`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decodes a body from `sender` and returns its payload, warning when the
    /// sender is on another version.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an envelope around a `T`.
    pub fn open(bytes: &[u8], sender: &str) -> Result<T, serde_json::Error> {
        let envelope = Self::from_json_bytes(bytes)?;
        if !envelope.is_current_version() {
            warn!(sender, version = envelope.version, "envelope version mismatch");
        }
        Ok(envelope.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_conversation::RespMsg;
    use parley_core::MessageId;

    #[test]
    fn envelope_json_structure() {
        let envelope = Envelope::new(RespMsg::new(MessageId::new(4), "Done."));
        let json = serde_json::to_value(&envelope).expect("to_value");

        assert_eq!(json["version"], CURRENT_VERSION);
        assert_eq!(json["payload"]["msg_id"], 4);
        assert_eq!(json["payload"]["sentence"], "Done.");
    }

    #[test]
    fn open_accepts_other_versions() {
        let reply: RespMsg = Envelope::open(
            br#"{"version":2,"payload":{"msg_id":9,"sentence":"later"}}"#,
            "coffee",
        )
        .expect("open");
        assert_eq!(reply.msg_id, MessageId::new(9));
        assert_eq!(reply.sentence, "later");
    }

    #[test]
    fn open_rejects_bare_payload() {
        let result: Result<RespMsg, _> =
            Envelope::open(br#"{"msg_id":1,"sentence":"hi"}"#, "coffee");
        assert!(result.is_err());
    }

    #[test]
    fn older_version_is_detected() {
        let envelope: Envelope<RespMsg> =
            Envelope::from_json_bytes(br#"{"version":0,"payload":{"msg_id":1,"sentence":"hi"}}"#)
                .expect("deserialize");
        assert!(!envelope.is_current_version());
        assert_eq!(envelope.into_payload().sentence, "hi");
    }
}
