use parley_conversation::TurnStore;
use parley_dispatch::{NatsConnector, Registry};
use parley_server::{
    classifier::NatsClassifier,
    config::ServerConfig,
    db::PgTurnStore,
    error::ServerError,
    listener::{serve_feedback, serve_registrations, serve_turns},
    pipeline::Pipeline,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> parley_core::Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().map_err(|e| ServerError::Config {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| ServerError::Database {
            details: e.to_string(),
        })?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| ServerError::Database {
            details: format!("migrations failed: {e}"),
        })?;

    let client = async_nats::connect(config.nats.url.as_str())
        .await
        .map_err(|e| ServerError::Nats {
            details: format!("connecting to {}: {e}", config.nats.url),
        })?;
    tracing::info!(url = %config.nats.url, "Connected to NATS");

    let registry = Arc::new(Registry::new());
    let store: Arc<dyn TurnStore> = Arc::new(PgTurnStore::new(db_pool));
    let classifier = Arc::new(NatsClassifier::new(
        client.clone(),
        config.nats.classify_subject.clone(),
    ));
    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        classifier,
    ));

    let registrations = tokio::spawn(serve_registrations(
        client.clone(),
        config.nats.register_subject.clone(),
        config.nats.vocab_subject(),
        registry,
        Arc::new(NatsConnector),
    ));
    let turns = tokio::spawn(serve_turns(
        client.clone(),
        config.nats.turn_subject.clone(),
        pipeline,
    ));
    let feedback = tokio::spawn(serve_feedback(
        client,
        config.nats.feedback_subject.clone(),
        store,
    ));

    tokio::select! {
        result = registrations => stopped("registration listener", result)?,
        result = turns => stopped("turn listener", result)?,
        result = feedback => stopped("feedback listener", result)?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }
    Ok(())
}

fn stopped(
    listener: &str,
    result: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(Ok(())) => {
            tracing::warn!(listener, "listener stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(ServerError::Nats {
            details: format!("{listener} task failed: {e}"),
        }),
    }
}
