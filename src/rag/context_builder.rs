//! Prompt assembly.
//!
//! Formats retrieved records into a delimited context block, frames it with the
//! fixed system instruction and the user query, and keeps the result within the
//! character budget by dropping whole records from the tail.

use serde_json::Value;

use super::document::{char_len, Chunk, Metadata};
use super::prompt::{render, Prompt, EMPTY_CONTEXT, SYSTEM_INSTRUCTION};
use super::scoring::{ScoredResult, SearchHit};
use crate::core::config::PromptConfig;

const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Anything that can appear in the context block.
pub trait ContextRecord {
    fn content(&self) -> &str;
    fn metadata(&self) -> &Metadata;
}

impl ContextRecord for Chunk {
    fn content(&self) -> &str {
        &self.content
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl ContextRecord for ScoredResult {
    fn content(&self) -> &str {
        &self.content
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl ContextRecord for SearchHit {
    fn content(&self) -> &str {
        &self.content
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Builds budget-bounded prompts for the generation model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PromptConfig::default())
    }
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Assembles the prompt text for `query` grounded on `records`, in order.
    pub fn build_prompt<R: ContextRecord>(&self, query: &str, records: &[R]) -> String {
        self.assemble(query, records).full_text
    }

    /// Like [`build_prompt`](Self::build_prompt) but keeps the individual parts.
    ///
    /// The first pass includes every record. If that prompt exceeds
    /// `max_context_chars`, the context block is rebuilt once, keeping records
    /// until the next one would not fit in the room left by the fixed frame.
    pub fn assemble<R: ContextRecord>(&self, query: &str, records: &[R]) -> Prompt {
        let limit = self.config.max_context_chars;
        let prompt = Prompt::new(query, format_context(records, None));
        let length = prompt.len();
        if length <= limit {
            return prompt;
        }

        tracing::info!(
            "Prompt exceeded limit, truncating context (length {}, limit {})",
            length,
            limit
        );
        let frame = char_len(&render(SYSTEM_INSTRUCTION, query, ""));
        let budget = limit.saturating_sub(frame);
        let truncated = Prompt::new(query, format_context(records, Some(budget)));
        tracing::debug!(
            "Context truncated to {} characters, prompt length {}",
            char_len(&truncated.context_block),
            truncated.len()
        );
        truncated
    }
}

/// Joins formatted records. With a budget, stops before the first record that
/// would push the block past it; later records are dropped too.
fn format_context<R: ContextRecord>(records: &[R], budget: Option<usize>) -> String {
    let mut context = String::new();
    let mut context_len = 0usize;

    for record in records {
        let entry = format_record(record);
        let entry_len = char_len(&entry);
        if let Some(budget) = budget {
            if context_len + entry_len > budget {
                break;
            }
        }
        context.push_str(&entry);
        context_len += entry_len;
    }

    if context.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        context
    }
}

fn format_record<R: ContextRecord>(record: &R) -> String {
    let metadata = record.metadata();
    let metadata_json = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());
    format!(
        "\n---\nSource: {}\nMetadata: {}\nContent:\n{}\n---\n",
        source_label(metadata),
        metadata_json,
        record.content()
    )
}

/// First usable `source`, then `title`, else "Unknown Source".
///
/// Null, `false`, zero and blank strings count as absent. Other values are
/// rendered as JSON.
fn source_label(metadata: &Metadata) -> String {
    ["source", "title"]
        .into_iter()
        .filter_map(|key| metadata.get(key))
        .find_map(|value| match value {
            Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}
