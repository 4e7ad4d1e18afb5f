//! Postgres-backed turn history.

use async_trait::async_trait;
use parley_conversation::{Feedback, Msg, Slot, State, StoreError, TurnStore, last_referent};
use parley_core::{FeedbackId, MessageId, UserId};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

fn query_failed(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed {
        reason: e.to_string(),
    }
}

/// Converts an ID to its column value.
fn to_db(raw: u64) -> Result<i64, StoreError> {
    i64::try_from(raw).map_err(|_| StoreError::InvalidData {
        reason: format!("id {raw} does not fit in a BIGINT column"),
    })
}

/// Converts a column value back to an ID.
fn from_db(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::InvalidData {
        reason: format!("negative id {raw} in database"),
    })
}

/// Query for the last value of a slot on the user's most recent input that
/// detected at least one object.
fn last_slot_query(slot: Slot) -> String {
    format!(
        r#"
        SELECT {column} AS "values"
        FROM inputs
        WHERE user_id = $1 AND cardinality(objects) > 0
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
        column = slot.column()
    )
}

/// Row type for `get_msg`.
#[derive(FromRow)]
struct MsgRow {
    id: i64,
    sentence: String,
    ava_sent: bool,
}

/// Row type for `last_assistant_msg`.
#[derive(FromRow)]
struct AssistantMsgRow {
    id: i64,
    route: String,
    sentence: String,
}

/// Row type for `last_slot_value`.
#[derive(FromRow)]
struct SlotRow {
    values: Vec<String>,
}

/// Repository for turns, classifier input, package state and feedback.
#[derive(Debug, Clone)]
pub struct PgTurnStore {
    pool: PgPool,
}

impl PgTurnStore {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_column(msg: &Msg) -> Result<Option<i64>, StoreError> {
        msg.user_id().map(|id| to_db(id.get())).transpose()
    }
}

#[async_trait]
impl TurnStore for PgTurnStore {
    #[instrument(skip_all, fields(user_id = ?msg.user_id()))]
    async fn insert_msg(&self, msg: &Msg) -> Result<MessageId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages
                (user_id, flex_id, flex_id_type, sentence, sentence_annotated,
                 route, package, ava_sent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(Self::user_column(msg)?)
        .bind(&msg.flex_id)
        .bind(msg.flex_id_type.as_i16())
        .bind(&msg.sentence)
        .bind(&msg.sentence_annotated)
        .bind(&msg.route)
        .bind(&msg.package)
        .bind(msg.ava_sent)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(MessageId::new(from_db(id)?))
    }

    #[instrument(skip_all, fields(msg_id = %msg.id))]
    async fn update_msg(&self, msg: &Msg) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE messages
            SET sentence = $2, package = $3
            WHERE id = $1
            "#,
        )
        .bind(to_db(msg.id.get())?)
        .bind(&msg.sentence)
        .bind(&msg.package)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_msg(&self, id: MessageId) -> Result<Option<Msg>, StoreError> {
        let row: Option<MsgRow> = sqlx::query_as(
            r#"
            SELECT id, sentence, ava_sent
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(to_db(id.get())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(|r| {
            Ok(Msg {
                id: MessageId::new(from_db(r.id)?),
                sentence: r.sentence,
                ava_sent: r.ava_sent,
                ..Default::default()
            })
        })
        .transpose()
    }

    #[instrument(skip(self))]
    async fn last_route(&self, user: UserId) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT route
            FROM messages
            WHERE user_id = $1 AND ava_sent = FALSE AND route <> ''
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(to_db(user.get())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)
    }

    #[instrument(skip(self))]
    async fn last_assistant_msg(&self, user: UserId) -> Result<Option<Msg>, StoreError> {
        let row: Option<AssistantMsgRow> = sqlx::query_as(
            r#"
            SELECT id, route, sentence
            FROM messages
            WHERE user_id = $1 AND ava_sent = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(to_db(user.get())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(|r| {
            Ok(Msg {
                id: MessageId::new(from_db(r.id)?),
                route: r.route,
                sentence: r.sentence,
                ava_sent: true,
                ..Default::default()
            })
        })
        .transpose()
    }

    #[instrument(skip(self))]
    async fn package_state(&self, package: &str) -> Result<Option<State>, StoreError> {
        let state: Option<Json<State>> = sqlx::query_scalar(
            r#"
            SELECT state
            FROM states
            WHERE package = $1
            "#,
        )
        .bind(package)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(state.map(|Json(state)| state))
    }

    #[instrument(skip_all, fields(msg_id = %msg.id))]
    async fn insert_input(&self, msg: &Msg) -> Result<(), StoreError> {
        let input = &msg.structured_input;
        sqlx::query(
            r#"
            INSERT INTO inputs
                (message_id, user_id, commands, objects, actors, times, places)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(to_db(msg.id.get())?)
        .bind(Self::user_column(msg)?)
        .bind(&input.commands)
        .bind(&input.objects)
        .bind(&input.actors)
        .bind(&input.times)
        .bind(&input.places)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn last_slot_value(
        &self,
        user: UserId,
        slot: Slot,
    ) -> Result<Option<String>, StoreError> {
        let row: Option<SlotRow> = sqlx::query_as(&last_slot_query(slot))
            .bind(to_db(user.get())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(row.and_then(|r| last_referent(&r.values).cloned()))
    }

    #[instrument(skip_all, fields(sentiment = ?feedback.sentiment))]
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feedback (sentence, sentiment, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&feedback.sentence)
        .bind(feedback.sentiment.as_i16())
        .bind(feedback.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(FeedbackId::new(from_db(id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_query_reads_the_slot_column() {
        let query = last_slot_query(Slot::Place);
        assert!(query.contains("SELECT places AS \"values\""));
        assert!(query.contains("cardinality(objects) > 0"));
    }

    #[test]
    fn ids_outside_bigint_are_invalid_data() {
        assert_eq!(to_db(42), Ok(42));
        assert!(matches!(to_db(u64::MAX), Err(StoreError::InvalidData { .. })));
        assert!(matches!(from_db(-1), Err(StoreError::InvalidData { .. })));
    }
}
