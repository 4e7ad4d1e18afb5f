//! Routing and dispatch for parley.
//!
//! This crate provides:
//!
//! - **Package Registry**: routing key to handler connection, filled by
//!   handler self-registration
//! - **Router**: picks the handler for a turn, falling back to the user's
//!   last route
//! - **Dispatcher**: invokes a handler's `run` or `follow_up` operation
//! - **NATS transport**: request/reply handler connections

pub mod connection;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod nats;
pub mod package;
pub mod registry;
pub mod router;

pub use connection::{Connector, DispatchMode, HandlerConnection};
pub use dispatcher::invoke;
pub use envelope::Envelope;
pub use error::{ConnectError, DispatchError, RegistryError, RoutingError};
pub use nats::{HandlerReply, NatsConnector, NatsHandlerConnection};
pub use package::{Pkg, PkgConfig, PkgWrapper, RouteKey, Trigger, Vocab};
pub use registry::{Registration, Registry};
pub use router::{Route, Router};

#[cfg(test)]
mod testing;
