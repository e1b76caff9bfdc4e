//! Entity type descriptors.
//!
//! An [`Entity`] is not an occurrence in text. It describes one class of the
//! open label set handed to a zero-shot backend: a name plus a natural
//! language description the model conditions on.

use serde::{Deserialize, Serialize};

/// A user-supplied entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Label emitted on spans of this type.
    pub name: String,
    /// Natural language description of the type.
    #[serde(default)]
    pub description: String,
    /// Optional surface forms known to belong to the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vec<String>>,
}

impl Entity {
    /// Create an entity type with a description.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            vocabulary: None,
        }
    }

    /// Attach a vocabulary.
    #[must_use]
    pub fn with_vocabulary<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary = Some(words.into_iter().map(Into::into).collect());
        self
    }
}
