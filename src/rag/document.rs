//! Document and chunk records passed between pipeline stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to documents and chunks. Keys keep insertion order.
pub type Metadata = Map<String, Value>;

/// Metadata key holding a chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";
/// Metadata key holding a chunk's character offset within the normalized text.
pub const START_OFFSET_KEY: &str = "start_offset";

/// A document handed over by the ingestion source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Document text (raw before normalization, normalized after)
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A bounded excerpt of a normalized document, ready for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Sequence number within the source document, if recorded.
    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata
            .get(CHUNK_INDEX_KEY)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }

    /// Character offset within the normalized source text, if recorded.
    pub fn start_offset(&self) -> Option<usize> {
        self.metadata
            .get(START_OFFSET_KEY)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }
}

/// Length in characters. Every budget in this crate is measured this way.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
