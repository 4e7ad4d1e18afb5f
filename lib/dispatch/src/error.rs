//! Error types for the dispatch crate.
//!
//! - `ConnectError`: a handler endpoint could not be reached
//! - `RegistryError`: registration failures
//! - `RoutingError`: no handler for a computed or fallback routing key
//! - `DispatchError`: remote invocation failures

use parley_conversation::StoreError;
use std::fmt;

/// Errors from opening a handler connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectError {
    /// The endpoint that was dialed.
    pub address: String,
    /// Why the connection failed.
    pub reason: String,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to connect to {}: {}", self.address, self.reason)
    }
}

impl std::error::Error for ConnectError {}

/// Errors from package registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The configured port leaves no room for the RPC port above it.
    InvalidPort { package: String, port: u16 },
    /// The handler's endpoint could not be reached.
    ConnectionFailed { package: String, source: ConnectError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { package, port } => {
                write!(f, "package '{package}' configured with unusable port {port}")
            }
            Self::ConnectionFailed { package, source } => {
                write!(f, "registering package '{package}': {source}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from routing a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No package is registered for the routing key.
    MissingPackage { route: String },
    /// Last-route lookup failed.
    Store(StoreError),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPackage { route } => write!(f, "missing package for route '{route}'"),
            Self::Store(e) => write!(f, "last route lookup failed: {e}"),
        }
    }
}

impl std::error::Error for RoutingError {}

impl From<StoreError> for RoutingError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Errors from invoking a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The request never got a reply.
    Transport { package: String, message: String },
    /// The handler answered with an error.
    Handler { package: String, message: String },
    /// The handler's reply could not be decoded.
    InvalidReply { package: String, message: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { package, message } => {
                write!(f, "calling package '{package}' failed: {message}")
            }
            Self::Handler { package, message } => {
                write!(f, "package '{package}' returned an error: {message}")
            }
            Self::InvalidReply { package, message } => {
                write!(f, "invalid response from package '{package}': {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_names_the_route() {
        let err = RoutingError::MissingPackage {
            route: "order_pizza".to_string(),
        };
        assert!(err.to_string().contains("order_pizza"));
    }

    #[test]
    fn connection_failure_names_package_and_address() {
        let err = RegistryError::ConnectionFailed {
            package: "coffee".to_string(),
            source: ConnectError {
                address: "10.0.0.5:4223".to_string(),
                reason: "connection refused".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("coffee"));
        assert!(text.contains("10.0.0.5:4223"));
    }
}
