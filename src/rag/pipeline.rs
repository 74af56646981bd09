//! Stage wiring for ingestion and query time.
//!
//! Ingestion: raw documents -> `Normalizer` -> `ChunkSplitter` -> `ChunkSink`.
//! Query: `Retriever` (search, normalize, filter) -> `PromptBuilder`.

use std::sync::Arc;

use serde::Serialize;

use super::chunker::ChunkSplitter;
use super::context_builder::PromptBuilder;
use super::document::{Chunk, RawDocument};
use super::normalizer::Normalizer;
use super::prompt::Prompt;
use super::retriever::{Retriever, SearchParams};
use super::scoring::ScoredResult;
use super::store::{ChunkSink, VectorSearch};
use crate::core::config::{RagConfig, RetrievalConfig};
use crate::core::errors::{ChunkError, RetrievalError, SinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Cleans and chunks documents for the embedding collaborator.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    normalizer: Normalizer,
    splitter: ChunkSplitter,
}

impl IngestPipeline {
    pub fn new(config: &RagConfig) -> Result<Self, ChunkError> {
        Ok(Self {
            normalizer: Normalizer::new(),
            splitter: ChunkSplitter::new(config.chunking)?,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Normalizes every document and splits the result. Documents that normalize
    /// to nothing contribute no chunks.
    pub fn prepare(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        let normalized = self.normalizer.normalize_documents(documents);
        self.splitter.split_documents(&normalized)
    }

    /// Prepares the documents and hands the chunks to `sink` in one batch.
    pub async fn ingest(
        &self,
        documents: &[RawDocument],
        sink: &dyn ChunkSink,
    ) -> Result<IngestReport, SinkError> {
        let chunks = self.prepare(documents);
        let report = IngestReport {
            documents: documents.len(),
            chunks: chunks.len(),
        };

        if chunks.is_empty() {
            tracing::warn!("No chunks produced from {} documents", documents.len());
            return Ok(report);
        }

        tracing::info!(
            "Storing {} chunks from {} documents",
            report.chunks,
            report.documents
        );
        sink.add_chunks(chunks).await?;
        Ok(report)
    }
}

/// Retrieves context for a query and frames it as a prompt.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    retrieval: RetrievalConfig,
}

impl QueryPipeline {
    /// Uses the default retrieval settings for [`ask`](Self::ask).
    pub fn new(retriever: Retriever, prompt_builder: PromptBuilder) -> Self {
        Self {
            retriever,
            prompt_builder,
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Wires the `retrieval` and `prompt` sections of `config` around `search`.
    pub fn from_config(config: &RagConfig, search: Arc<dyn VectorSearch>) -> Self {
        Self {
            retriever: Retriever::new(search),
            prompt_builder: PromptBuilder::new(config.prompt),
            retrieval: config.retrieval,
        }
    }

    /// Answers `query` with the configured `k` and `min_score`.
    pub async fn ask(&self, query: &str) -> Result<(Prompt, Vec<ScoredResult>), RetrievalError> {
        let params = SearchParams::with_config(query, &self.retrieval);
        self.prompt_for(&params).await
    }

    /// Searches, then assembles a prompt from whatever survived the filter.
    pub async fn prompt_for(
        &self,
        params: &SearchParams,
    ) -> Result<(Prompt, Vec<ScoredResult>), RetrievalError> {
        let results = self.retriever.search(params).await?;
        let prompt = self.prompt_builder.assemble(&params.query, &results);
        Ok((prompt, results))
    }
}
