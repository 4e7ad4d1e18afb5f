//! Package registry.
//!
//! Maps routing keys to registered packages. Packages register themselves
//! at runtime and stay registered for the life of the process; a key that is
//! registered twice keeps the later registration.

use crate::connection::Connector;
use crate::error::RegistryError;
use crate::package::{Pkg, PkgWrapper, RouteKey};
use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Outcome of a successful registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Every routing key written, commands outermost.
    pub routes: Vec<RouteKey>,
    /// Keys that were already registered, with the package that held them.
    pub displaced: Vec<(RouteKey, String)>,
}

/// Registry of packages by routing key, plus the vocabulary they brought.
#[derive(Debug, Default)]
pub struct Registry {
    packages: Mutex<HashMap<RouteKey, Arc<PkgWrapper>>>,
    vocabulary: DashSet<String>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn packages(&self) -> MutexGuard<'_, HashMap<RouteKey, Arc<PkgWrapper>>> {
        self.packages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a package under every (command, object) pair of its
    /// trigger.
    ///
    /// The connection is opened before any key is written, so a failed
    /// registration leaves the registry untouched. Keys that were already
    /// registered are reported in [`Registration::displaced`].
    ///
    /// # Errors
    ///
    /// Returns an error if the package's RPC endpoint cannot be reached.
    #[instrument(skip_all, fields(pkg = %pkg.name(), port = pkg.config.port))]
    pub async fn register(
        &self,
        pkg: Pkg,
        connector: &dyn Connector,
    ) -> Result<Registration, RegistryError> {
        debug!("registering");
        let endpoint = pkg
            .config
            .rpc_endpoint()
            .ok_or_else(|| RegistryError::InvalidPort {
                package: pkg.config.name.clone(),
                port: pkg.config.port,
            })?;
        let connection = connector
            .connect(&pkg.config, &endpoint)
            .await
            .map_err(|source| RegistryError::ConnectionFailed {
                package: pkg.config.name.clone(),
                source,
            })?;

        let pkg = Arc::new(pkg);
        for word in pkg.words() {
            self.vocabulary.insert(word.to_lowercase());
        }

        let wrapper = Arc::new(PkgWrapper {
            pkg: Arc::clone(&pkg),
            connection,
        });
        let mut registration = Registration {
            routes: pkg.route_keys().collect(),
            displaced: Vec::new(),
        };
        for key in &registration.routes {
            let previous = self.packages().insert(key.clone(), Arc::clone(&wrapper));
            if let Some(previous) = previous {
                warn!(
                    route = %key,
                    previous = %previous.name(),
                    "duplicate package or trigger"
                );
                registration
                    .displaced
                    .push((key.clone(), previous.name().to_string()));
            }
        }

        info!(
            routes = registration.routes.len(),
            displaced = registration.displaced.len(),
            %endpoint,
            "registered package"
        );
        Ok(registration)
    }

    /// Returns the package registered for `key`.
    #[must_use]
    pub fn lookup(&self, key: &RouteKey) -> Option<Arc<PkgWrapper>> {
        self.packages().get(key).cloned()
    }

    /// Returns every registered routing key, sorted.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteKey> {
        let mut routes: Vec<RouteKey> = self.packages().keys().cloned().collect();
        routes.sort();
        routes
    }

    /// Returns the number of registered routing keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages().len()
    }

    /// Returns whether no package has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages().is_empty()
    }

    /// Returns true if any package registered `word`, ignoring case.
    #[must_use]
    pub fn knows_word(&self, word: &str) -> bool {
        self.vocabulary.contains(&word.to_lowercase())
    }

    /// Returns a sorted snapshot of the vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> Vec<String> {
        let mut words: Vec<String> = self.vocabulary.iter().map(|w| w.key().clone()).collect();
        words.sort();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::HandlerConnection;
    use crate::package::Vocab;
    use crate::testing::{FakeConnector, pkg};
    use parley_conversation::Msg;

    async fn reply_from(registry: &Registry, route: &str) -> String {
        let wrapper = registry
            .lookup(&RouteKey::from_stored(route))
            .expect("registered route");
        wrapper
            .connection
            .run(&Msg::new(None, "hi"))
            .await
            .unwrap()
            .sentence
    }

    #[tokio::test]
    async fn disjoint_packages_own_their_pairs() {
        let registry = Registry::new();
        let connector = FakeConnector::default();
        registry
            .register(pkg("coffee", 4000, &["buy"], &["coffee", "latte"]), &connector)
            .await
            .unwrap();
        registry
            .register(pkg("pizza", 5000, &["order"], &["pizza"]), &connector)
            .await
            .unwrap();

        for route in ["buy_coffee", "buy_latte"] {
            let wrapper = registry.lookup(&RouteKey::from_stored(route)).unwrap();
            assert_eq!(wrapper.name(), "coffee");
        }
        assert_eq!(
            registry
                .lookup(&RouteKey::new("order", "pizza"))
                .unwrap()
                .name(),
            "pizza"
        );
        assert!(registry.lookup(&RouteKey::new("order", "coffee")).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn connects_one_port_above_configured_port() {
        let registry = Registry::new();
        let connector = FakeConnector::default();
        registry
            .register(pkg("coffee", 4000, &["buy"], &["coffee"]), &connector)
            .await
            .unwrap();

        assert_eq!(*connector.dialed.lock().unwrap(), ["127.0.0.1:4001"]);
    }

    #[tokio::test]
    async fn pairs_share_one_connection() {
        let registry = Registry::new();
        registry
            .register(
                pkg("coffee", 4000, &["buy", "order"], &["coffee"]),
                &FakeConnector::default(),
            )
            .await
            .unwrap();

        let buy = registry.lookup(&RouteKey::new("buy", "coffee")).unwrap();
        let order = registry.lookup(&RouteKey::new("order", "coffee")).unwrap();
        assert!(Arc::ptr_eq(&buy.connection, &order.connection));
    }

    #[tokio::test]
    async fn duplicate_key_keeps_later_registration() {
        let registry = Registry::new();
        let connector = FakeConnector::default();
        registry
            .register(pkg("coffee", 4000, &["buy"], &["coffee"]), &connector)
            .await
            .unwrap();
        let second = registry
            .register(pkg("cafe", 6000, &["buy"], &["coffee"]), &connector)
            .await
            .unwrap();

        assert_eq!(
            second.displaced,
            [(RouteKey::new("buy", "coffee"), "coffee".to_string())]
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(reply_from(&registry, "buy_coffee").await, "cafe@127.0.0.1:6001 run");
    }

    #[tokio::test]
    async fn reregistering_yields_same_keys() {
        let registry = Registry::new();
        let connector = FakeConnector::default();
        let coffee = pkg("coffee", 4000, &["buy", "Order"], &["coffee", "latte"]);

        let first = registry.register(coffee.clone(), &connector).await.unwrap();
        let routes_after_first = registry.routes();
        let second = registry.register(coffee, &connector).await.unwrap();

        assert_eq!(first.routes, second.routes);
        assert!(first.displaced.is_empty());
        assert_eq!(second.displaced.len(), 4);
        assert_eq!(registry.routes(), routes_after_first);
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn failed_connection_writes_nothing() {
        let registry = Registry::new();
        let err = registry
            .register(
                pkg("coffee", 4000, &["buy"], &["coffee"]),
                &FakeConnector::refusing(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::ConnectionFailed { .. }));
        assert!(registry.is_empty());
        assert!(registry.vocabulary().is_empty());
    }

    #[tokio::test]
    async fn unusable_port_is_rejected() {
        let registry = Registry::new();
        let connector = FakeConnector::default();
        let err = registry
            .register(pkg("coffee", u16::MAX, &["buy"], &["coffee"]), &connector)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::InvalidPort {
                package: "coffee".to_string(),
                port: u16::MAX
            }
        );
        assert!(connector.dialed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn vocabulary_collects_triggers_and_broader_vocab() {
        let registry = Registry::new();
        let mut coffee = pkg("coffee", 4000, &["buy"], &["coffee"]);
        coffee.vocab = Some(Vocab {
            commands: vec!["brew".to_string()],
            objects: vec!["espresso".to_string(), "coffee".to_string()],
        });

        registry
            .register(coffee, &FakeConnector::default())
            .await
            .unwrap();

        assert_eq!(registry.vocabulary(), ["brew", "buy", "coffee", "espresso"]);
        assert!(registry.knows_word("espresso"));
        assert!(!registry.knows_word("pizza"));
    }

    #[tokio::test]
    async fn vocabulary_is_case_insensitive_like_routing_keys() {
        let registry = Registry::new();
        registry
            .register(
                pkg("coffee", 4000, &["Buy"], &["Coffee"]),
                &FakeConnector::default(),
            )
            .await
            .unwrap();

        assert_eq!(registry.vocabulary(), ["buy", "coffee"]);
        assert!(registry.knows_word("buy"));
        assert!(registry.knows_word("COFFEE"));
        assert!(registry.lookup(&RouteKey::new("buy", "coffee")).is_some());
    }
}
