//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (e.g. `NATS__URL`).

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// NATS connection and subject configuration.
    #[serde(default)]
    pub nats: NatsSettings,
}

/// Where the server talks to packages, channels and the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsSettings {
    /// URL of the core NATS server.
    #[serde(default = "default_nats_url")]
    pub url: String,

    /// Subject packages send registration requests to.
    #[serde(default = "default_register_subject")]
    pub register_subject: String,

    /// Subject channels send user turns to.
    #[serde(default = "default_turn_subject")]
    pub turn_subject: String,

    /// Subject channels send user feedback to.
    #[serde(default = "default_feedback_subject")]
    pub feedback_subject: String,

    /// Subject the classifier answers on. Vocabulary updates go to
    /// `<classify_subject>.vocab`.
    #[serde(default = "default_classify_subject")]
    pub classify_subject: String,
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_register_subject() -> String {
    "parley.register".to_string()
}

fn default_turn_subject() -> String {
    "parley.turn".to_string()
}

fn default_feedback_subject() -> String {
    "parley.feedback".to_string()
}

fn default_classify_subject() -> String {
    "parley.classify".to_string()
}

impl NatsSettings {
    /// Subject registered vocabulary is published on.
    #[must_use]
    pub fn vocab_subject(&self) -> String {
        format!("{}.vocab", self.classify_subject)
    }
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
            register_subject: default_register_subject(),
            turn_subject: default_turn_subject(),
            feedback_subject: default_feedback_subject(),
            classify_subject: default_classify_subject(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
