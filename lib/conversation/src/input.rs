//! Classifier output for a single utterance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic slot a pronoun refers to, and the structured-input list it
/// lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Things: "it", "that".
    Object,
    /// People: "him", "them".
    Actor,
    /// Moments: "then".
    Time,
    /// Locations: "there".
    Place,
}

impl Slot {
    /// Every slot, in classification order.
    pub const ALL: [Slot; 4] = [Slot::Object, Slot::Actor, Slot::Time, Slot::Place];

    /// Classifies a pronoun token. Returns `None` for words with no known
    /// category.
    #[must_use]
    pub fn for_pronoun(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "it" | "that" | "this" | "those" | "these" => Some(Self::Object),
            "me" | "us" | "you" | "him" | "her" | "them" | "he" | "she" | "they" => {
                Some(Self::Actor)
            }
            "then" => Some(Self::Time),
            "there" | "here" => Some(Self::Place),
            _ => None,
        }
    }

    /// Name of the persisted column holding this slot's values.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Object => "objects",
            Self::Actor => "actors",
            Self::Time => "times",
            Self::Place => "places",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Returns the last value that is not itself a pronoun.
///
/// Pronouns left unresolved on an earlier turn are stored as-is and must not
/// come back as referents.
#[must_use]
pub fn last_referent(values: &[String]) -> Option<&String> {
    values
        .iter()
        .rev()
        .find(|value| Slot::for_pronoun(value).is_none())
}

/// Commands, objects, actors, times and places detected in one utterance,
/// each in the order the classifier produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredInput {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub places: Vec<String>,
    /// Pronoun tokens the classifier detected, in sentence order.
    #[serde(default)]
    pub pronouns: Vec<String>,
}

impl StructuredInput {
    /// Returns the detected pronoun tokens.
    #[must_use]
    pub fn pronouns(&self) -> &[String] {
        &self.pronouns
    }

    /// Returns the values recorded for a slot.
    #[must_use]
    pub fn slot(&self, slot: Slot) -> &[String] {
        match slot {
            Slot::Object => &self.objects,
            Slot::Actor => &self.actors,
            Slot::Time => &self.times,
            Slot::Place => &self.places,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Vec<String> {
        match slot {
            Slot::Object => &mut self.objects,
            Slot::Actor => &mut self.actors,
            Slot::Time => &mut self.times,
            Slot::Place => &mut self.places,
        }
    }

    /// Replaces every occurrence of `token` in the slot list with `referent`.
    ///
    /// Returns how many entries were rewritten.
    pub fn replace(&mut self, slot: Slot, token: &str, referent: &str) -> usize {
        let mut replaced = 0;
        for value in self.slot_mut(slot).iter_mut() {
            if value.eq_ignore_ascii_case(token) {
                *value = referent.to_string();
                replaced += 1;
            }
        }
        replaced
    }

    /// Returns the last referent recorded for a slot.
    #[must_use]
    pub fn referent(&self, slot: Slot) -> Option<&String> {
        last_referent(self.slot(slot))
    }

    /// Returns true if at least one object was detected.
    #[must_use]
    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    /// Returns true if the classifier detected nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
            && Slot::ALL.iter().all(|slot| self.slot(*slot).is_empty())
            && self.pronouns.is_empty()
    }
}
