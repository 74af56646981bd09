//! Collaborator seams around the text pipeline.
//!
//! The vector database and the embedding model live outside this crate. These
//! traits are the only contact points: `VectorSearch` answers similarity queries,
//! `ChunkSink` receives prepared chunks for embedding and storage.

use async_trait::async_trait;

use super::document::{Chunk, Metadata};
use crate::core::errors::{SearchError, SinkError};

/// Nearest-neighbour search over a stored collection.
///
/// Implementations return results already ranked by relevance; the caller never
/// re-sorts them.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Top-`k` chunks with the backend's raw relevance score.
    ///
    /// Backends that cannot score results return `SearchError::ScoresUnavailable`.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<(Chunk, f64)>, SearchError>;

    /// Top-`k` chunks without scores.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<Chunk>, SearchError>;
}

/// Receives chunks for embedding and persistence in a named collection.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    async fn add_chunks(&self, chunks: Vec<Chunk>) -> Result<(), SinkError>;
}
