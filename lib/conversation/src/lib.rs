//! Conversation model for the parley routing core.
//!
//! This crate provides:
//!
//! - **Turns**: `Msg`, `RespMsg` and `Feedback`, plus the classifier output
//!   (`StructuredInput`) attached to each turn
//! - **Persistence contract**: the `TurnStore` trait and an in-memory store
//! - **Context resolution**: pronoun substitution from persisted history

pub mod classify;
pub mod context;
pub mod error;
pub mod feedback;
pub mod input;
pub mod memory;
pub mod msg;
pub mod store;

pub use classify::{Classification, Classifier, EnglishStemmer, Stemmer};
pub use context::resolve_context;
pub use error::{ClassifierError, ContextError, ConversationError, StoreError};
pub use feedback::{Feedback, Sentiment};
pub use input::{Slot, StructuredInput, last_referent};
pub use memory::InMemoryTurnStore;
pub use msg::{FlexIdType, Msg, RespMsg, State, User, sentence_fields};
pub use store::TurnStore;
