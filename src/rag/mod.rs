//! RAG text pipeline.
//!
//! - `Normalizer`: cleans raw text into plain text
//! - `ChunkSplitter`: splits normalized text into bounded, overlapping chunks
//! - `scoring`: maps backend scores onto `[0, 1]` and applies the threshold
//! - `PromptBuilder`: frames retrieved records into a budget-bounded prompt

mod chunker;
mod context_builder;
mod document;
mod normalizer;
mod pipeline;
mod prompt;
mod retriever;
mod scoring;
mod store;

pub use chunker::ChunkSplitter;
pub use context_builder::{ContextRecord, PromptBuilder};
pub use document::{char_len, Chunk, Metadata, RawDocument, CHUNK_INDEX_KEY, START_OFFSET_KEY};
pub use normalizer::Normalizer;
pub use pipeline::{IngestPipeline, IngestReport, QueryPipeline};
pub use prompt::{Prompt, ANSWER_CUE, EMPTY_CONTEXT, SYSTEM_INSTRUCTION};
pub use retriever::{Retriever, SearchParams};
pub use scoring::{filter_results, normalize_score, ScoredResult, SearchHit};
pub use store::{ChunkSink, VectorSearch};
