//! Strongly-typed ID types for persisted entities.
//!
//! IDs are opaque numbers generated by the store on insert. A value of zero
//! means "not persisted yet".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed numeric ID wrapper.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an ID from its raw value.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Returns true if the store has not assigned this ID yet.
            #[must_use]
            pub const fn is_unassigned(&self) -> bool {
                self.0 == 0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let raw = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                raw.parse::<u64>()
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user.
    UserId,
    "usr"
);

define_id!(
    /// Unique identifier for a persisted turn.
    MessageId,
    "msg"
);

define_id!(
    /// Unique identifier for a feedback entry.
    FeedbackId,
    "fb"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_display_format() {
        assert_eq!(MessageId::new(42).to_string(), "msg_42");
    }

    #[test]
    fn parse_with_prefix() {
        let parsed: UserId = "usr_17".parse().expect("should parse");
        assert_eq!(parsed, UserId::new(17));
    }

    #[test]
    fn parse_without_prefix() {
        let parsed: MessageId = "9".parse().expect("should parse");
        assert_eq!(parsed.get(), 9);
    }

    #[test]
    fn parse_invalid_number() {
        let err = "usr_abc".parse::<UserId>().unwrap_err();
        assert_eq!(err.id_type, "UserId");
    }

    #[test]
    fn default_is_unassigned() {
        assert!(MessageId::default().is_unassigned());
        assert!(!MessageId::new(1).is_unassigned());
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&UserId::new(5)).expect("serialize");
        assert_eq!(json, "5");
    }
}
