//! Turn-processing pipeline.
//!
//! One inbound utterance flows through:
//! 1. Classification (structured input, stems, sentence fields)
//! 2. Pronoun resolution against the user's history
//! 3. Routing
//! 4. Persistence of the user turn and its structured input
//! 5. Package state loading and dispatch
//! 6. Persistence of the package's reply

use crate::error::PipelineError;
use parley_conversation::{
    Classifier, EnglishStemmer, FlexIdType, Msg, RespMsg, Stemmer, TurnStore, User,
    resolve_context,
};
use parley_core::UserId;
use parley_dispatch::{Registry, Router, invoke};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A user utterance as delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundTurn {
    /// Channel-agnostic user address.
    #[serde(default)]
    pub flex_id: String,
    #[serde(default)]
    pub flex_id_type: FlexIdType,
    /// `None` for contacts that have not been onboarded.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub sentence: String,
}

/// Processes turns end to end.
pub struct Pipeline {
    router: Router<dyn TurnStore>,
    store: Arc<dyn TurnStore>,
    classifier: Arc<dyn Classifier>,
    stemmer: Arc<dyn Stemmer>,
}

impl Pipeline {
    /// Creates a pipeline with the default stemmer.
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn TurnStore>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            router: Router::new(registry, Arc::clone(&store)),
            store,
            classifier,
            stemmer: Arc::new(EnglishStemmer::new()),
        }
    }

    /// Replaces the stemmer.
    #[must_use]
    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = stemmer;
        self
    }

    /// Returns the registry turns are routed against.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        self.router.registry()
    }

    /// Processes one turn and returns the package's reply.
    ///
    /// An empty reply means no package could take the turn.
    ///
    /// # Errors
    ///
    /// Returns an error if context resolution, routing, dispatch or
    /// persistence fails. Nothing is retried.
    #[instrument(skip_all, fields(flex_id = %turn.flex_id, user_id = ?turn.user_id))]
    pub async fn process(
        &self,
        turn: InboundTurn,
    ) -> parley_core::Result<RespMsg, PipelineError> {
        let store = self.store.as_ref();
        let user = turn.user_id.map(User::new);
        let mut msg = Msg::classified(
            self.classifier.as_ref(),
            self.stemmer.as_ref(),
            user,
            turn.sentence,
        )
        .await
        .with_flex_id(turn.flex_id, turn.flex_id_type);

        // Anonymous turns go straight to onboarding.
        if msg.user.is_some() {
            msg.structured_input = resolve_context(store, &msg)
                .await
                .map_err(PipelineError::from)?;
        }

        let route = self
            .router
            .route(&msg)
            .await
            .map_err(PipelineError::from)?;
        if let Some(route) = &route {
            msg.route = route.key.to_string();
            msg.package = route.package.name().to_string();
        }

        msg.save(store).await.map_err(PipelineError::from)?;
        store
            .insert_input(&msg)
            .await
            .map_err(PipelineError::from)?;

        if route.is_some() {
            msg.load_state(store).await.map_err(PipelineError::from)?;
        }

        let mut reply = invoke(route.as_ref(), &msg)
            .await
            .map_err(PipelineError::from)?;
        if reply.msg_id.is_unassigned() {
            reply.msg_id = msg.id;
        }
        if reply.is_empty() {
            info!(msg_id = %msg.id, "no reply for turn");
            return Ok(reply);
        }

        let mut answer = msg.reply_turn(&reply);
        answer.save(store).await.map_err(PipelineError::from)?;
        debug!(msg_id = %msg.id, reply_id = %answer.id, pkg = %msg.package, "turn answered");
        Ok(reply)
    }
}
