//! Typed handler connections.

use crate::error::{ConnectError, DispatchError};
use crate::package::PkgConfig;
use async_trait::async_trait;
use parley_conversation::{Msg, RespMsg};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which handler operation a turn is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// The turn freshly matched one of the handler's triggers.
    Run,
    /// The turn continues the user's last conversation with the handler.
    FollowUp,
}

impl DispatchMode {
    /// Name of the remote operation.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::FollowUp => "follow_up",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// A live connection to a registered handler.
#[async_trait]
pub trait HandlerConnection: Send + Sync {
    /// Handles a turn that matched the handler's triggers.
    async fn run(&self, msg: &Msg) -> Result<RespMsg, DispatchError>;

    /// Handles a turn that continues an earlier exchange.
    async fn follow_up(&self, msg: &Msg) -> Result<RespMsg, DispatchError>;

    /// Invokes the operation selected by `mode`.
    async fn call(&self, mode: DispatchMode, msg: &Msg) -> Result<RespMsg, DispatchError> {
        match mode {
            DispatchMode::Run => self.run(msg).await,
            DispatchMode::FollowUp => self.follow_up(msg).await,
        }
    }
}

/// Opens handler connections during registration.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to the package's RPC `endpoint`.
    async fn connect(
        &self,
        config: &PkgConfig,
        endpoint: &str,
    ) -> Result<Arc<dyn HandlerConnection>, ConnectError>;
}
