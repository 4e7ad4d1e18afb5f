//! Handler ("package") descriptions and routing keys.

use crate::connection::HandlerConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a package runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgConfig {
    /// Package name; also the prefix of its remote operations.
    pub name: String,
    /// Host the package listens on.
    pub server_address: String,
    /// Configured port. The RPC endpoint is one above it.
    pub port: u16,
}

impl PkgConfig {
    /// Returns `server_address:(port + 1)`, or `None` if the port is the
    /// highest one available.
    #[must_use]
    pub fn rpc_endpoint(&self) -> Option<String> {
        let port = self.port.checked_add(1)?;
        Some(format!("{}:{port}", self.server_address))
    }
}

/// Commands and objects that route to a package. Every command is paired
/// with every object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
}

/// Words a package understands beyond its triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocab {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
}

/// A package's registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pkg {
    pub config: PkgConfig,
    pub trigger: Trigger,
    #[serde(default)]
    pub vocab: Option<Vocab>,
}

impl Pkg {
    /// Returns the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Routing keys for every (command, object) trigger pair, commands
    /// outermost.
    pub fn route_keys(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.trigger.commands.iter().flat_map(move |command| {
            self.trigger
                .objects
                .iter()
                .map(move |object| RouteKey::new(command, object))
        })
    }

    /// Every word this package contributes to the classifier vocabulary.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        let vocab = self.vocab.iter().flat_map(|v| v.commands.iter().chain(&v.objects));
        self.trigger
            .commands
            .iter()
            .chain(&self.trigger.objects)
            .chain(vocab)
            .map(String::as_str)
    }
}

/// A registered package bound to its live connection.
pub struct PkgWrapper {
    pub pkg: Arc<Pkg>,
    pub connection: Arc<dyn HandlerConnection>,
}

impl PkgWrapper {
    /// Returns the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.pkg.name()
    }
}

impl fmt::Debug for PkgWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkgWrapper")
            .field("pkg", &self.pkg.config.name)
            .finish_non_exhaustive()
    }
}

/// Routing key: `lowercase(command)_lowercase(object)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    /// Key every turn without an identified user is routed to.
    pub const ONBOARDING: &'static str = "onboard_onboard";

    /// Derives the key for a command and an object.
    #[must_use]
    pub fn new(command: &str, object: &str) -> Self {
        Self(format!("{command}_{object}").to_lowercase())
    }

    /// The reserved onboarding key.
    #[must_use]
    pub fn onboarding() -> Self {
        Self(Self::ONBOARDING.to_string())
    }

    /// Wraps a key read back from turn history.
    #[must_use]
    pub fn from_stored(route: impl Into<String>) -> Self {
        Self(route.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
