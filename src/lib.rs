//! Text preparation for retrieval-augmented generation: normalization, chunking,
//! score normalization and filtering, and prompt assembly.

pub mod core;
pub mod rag;

pub use crate::core::config::RagConfig;
pub use crate::core::errors::{
    ChunkError, ConfigError, RetrievalError, SearchError, SearchParamsError, SinkError,
};
pub use crate::rag::{
    filter_results, normalize_score, Chunk, ChunkSink, ChunkSplitter, IngestPipeline,
    Metadata, Normalizer, Prompt, PromptBuilder, QueryPipeline, RawDocument, Retriever,
    ScoredResult, SearchHit, SearchParams, VectorSearch,
};
