//! Picks the package that should handle a turn.
//!
//! Routing order:
//! 1. Turns without an identified user go to onboarding
//! 2. First registered (command, object) pair, commands outermost
//! 3. The user's last route, dispatched as a follow-up

use crate::connection::DispatchMode;
use crate::error::RoutingError;
use crate::package::{PkgWrapper, RouteKey};
use crate::registry::Registry;
use parley_conversation::{Msg, TurnStore};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// The outcome of routing a turn.
#[derive(Debug, Clone)]
pub struct Route {
    pub package: Arc<PkgWrapper>,
    pub key: RouteKey,
    pub mode: DispatchMode,
}

/// Resolves turns to registered packages.
pub struct Router<S: TurnStore + ?Sized> {
    registry: Arc<Registry>,
    store: Arc<S>,
}

impl<S: TurnStore + ?Sized> Router<S> {
    /// Creates a router over a registry and the turn history.
    pub fn new(registry: Arc<Registry>, store: Arc<S>) -> Self {
        Self { registry, store }
    }

    /// Returns the registry this router reads.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Routes a turn.
    ///
    /// Returns `Ok(None)` when nothing matched and the user has no earlier
    /// route to continue; what to tell the user is up to the caller.
    ///
    /// # Errors
    ///
    /// - `MissingPackage` if onboarding or the user's last route is not
    ///   registered
    /// - `Store` if the last-route lookup fails
    #[instrument(skip_all, fields(user_id = ?msg.user_id()))]
    pub async fn route(&self, msg: &Msg) -> Result<Option<Route>, RoutingError> {
        let Some(user) = msg.user_id() else {
            let key = RouteKey::onboarding();
            return match self.registry.lookup(&key) {
                Some(package) => Ok(Some(Route {
                    package,
                    key,
                    mode: DispatchMode::Run,
                })),
                None => {
                    error!("missing required onboard package");
                    Err(RoutingError::MissingPackage {
                        route: key.to_string(),
                    })
                }
            };
        };

        if let Some(route) = self.match_trigger(msg) {
            return Ok(Some(route));
        }

        debug!("getting last route");
        let Some(last) = self.store.last_route(user).await? else {
            warn!("no last route");
            return Ok(None);
        };
        let key = RouteKey::from_stored(last);
        debug!(route = %key, "got last route");

        let package = self
            .registry
            .lookup(&key)
            .ok_or_else(|| RoutingError::MissingPackage {
                route: key.to_string(),
            })?;
        Ok(Some(Route {
            package,
            key,
            mode: DispatchMode::FollowUp,
        }))
    }

    fn match_trigger(&self, msg: &Msg) -> Option<Route> {
        let input = &msg.structured_input;
        for command in &input.commands {
            for object in &input.objects {
                let key = RouteKey::new(command, object);
                debug!(route = %key, "searching route");
                if let Some(package) = self.registry.lookup(&key) {
                    return Some(Route {
                        package,
                        key,
                        mode: DispatchMode::Run,
                    });
                }
            }
        }
        None
    }
}
