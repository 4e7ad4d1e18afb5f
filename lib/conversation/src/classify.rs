//! Seams to the language collaborators: the classifier and the stemmer.

use crate::error::ClassifierError;
use crate::input::StructuredInput;
use crate::msg::{Msg, User};
use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer as Snowball};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// Classifier output for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub input: StructuredInput,
    /// Classifier-normalized form of the sentence.
    pub annotated: String,
    /// Confidence in the range 0.0 - 1.0.
    pub confidence: f64,
}

/// Turns raw text into structured input.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;
}

/// Reduces a word to its stem.
pub trait Stemmer: Send + Sync {
    fn stem(&self, word: &str) -> String;
}

/// Porter2 stemmer for English.
///
/// Trailing punctuation is stripped and the word lowercased before stemming.
pub struct EnglishStemmer {
    inner: Snowball,
}

impl EnglishStemmer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Snowball::create(Algorithm::English),
        }
    }
}

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnglishStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnglishStemmer").finish_non_exhaustive()
    }
}

impl Stemmer for EnglishStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word
            .trim_end_matches([',', '.', '?', ';', ':', '!', '-', '/'])
            .to_lowercase();
        self.inner.stem(&word).into_owned()
    }
}

impl Msg {
    /// Builds a user turn from raw text: stems, sentence fields and
    /// classifier output.
    ///
    /// A classifier failure is logged and leaves the structured input empty,
    /// so the turn can still fall back to the user's last route.
    pub async fn classified(
        classifier: &dyn Classifier,
        stemmer: &dyn Stemmer,
        user: Option<User>,
        sentence: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(user, sentence);
        msg.stems = msg
            .sentence
            .split_whitespace()
            .map(|word| stemmer.stem(word))
            .collect();

        match classifier.classify(&msg.sentence).await {
            Ok(classification) => {
                debug!(confidence = classification.confidence, "classified sentence");
                msg.structured_input = classification.input;
                msg.sentence_annotated = classification.annotated;
            }
            Err(e) => error!(error = %e, "classifying sentence"),
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(Result<Classification, ClassifierError>);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            self.0.clone()
        }
    }

    #[test]
    fn english_stemmer_reduces_inflections() {
        let stemmer = EnglishStemmer::new();
        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("Buying,"), "buy");
        assert_eq!(stemmer.stem("Pizzas?!"), "pizza");
        assert_eq!(stemmer.stem("!"), "");
    }

    #[tokio::test]
    async fn classified_msg_carries_classifier_output() {
        let classifier = FixedClassifier(Ok(Classification {
            input: StructuredInput {
                commands: vec!["buy".to_string()],
                objects: vec!["coffee".to_string()],
                ..Default::default()
            },
            annotated: "_C(buy) _O(coffee)".to_string(),
            confidence: 0.9,
        }));

        let msg =
            Msg::classified(&classifier, &EnglishStemmer::new(), None, "Buying pizzas!").await;

        assert_eq!(msg.stems, ["buy", "pizza"]);
        assert_eq!(msg.sentence_fields, ["buying", "pizzas", "!"]);
        assert_eq!(msg.structured_input.commands, ["buy"]);
        assert_eq!(msg.sentence_annotated, "_C(buy) _O(coffee)");
    }

    #[tokio::test]
    async fn classifier_failure_leaves_input_empty() {
        let classifier = FixedClassifier(Err(ClassifierError::Unavailable {
            reason: "no responders".to_string(),
        }));

        let msg = Msg::classified(&classifier, &EnglishStemmer::new(), None, "large please").await;

        assert!(msg.structured_input.is_empty());
        assert_eq!(msg.sentence, "large please");
    }
}
