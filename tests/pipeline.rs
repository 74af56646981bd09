use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use ragprep::core::config::load_config_from;
use ragprep::rag::{
    char_len, Chunk, ChunkSink, IngestPipeline, Metadata, PromptBuilder, QueryPipeline,
    RawDocument, Retriever, SearchParams, VectorSearch,
};
use ragprep::{RagConfig, SearchError, SinkError};

/// Stores chunks in memory and scores them by query-word overlap.
#[derive(Default)]
struct MemoryStore {
    chunks: Mutex<Vec<Chunk>>,
}

#[async_trait]
impl ChunkSink for MemoryStore {
    async fn add_chunks(&self, chunks: Vec<Chunk>) -> Result<(), SinkError> {
        self.chunks.lock().unwrap().extend(chunks);
        Ok(())
    }
}

#[async_trait]
impl VectorSearch for MemoryStore {
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        _filter: Option<&Metadata>,
    ) -> Result<Vec<(Chunk, f64)>, SearchError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .collect();
        let mut scored: Vec<(Chunk, f64)> = self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .map(|chunk| {
                let body = chunk.content.to_lowercase();
                let hits = terms.iter().filter(|t| body.contains(t.as_str())).count();
                (chunk.clone(), hits as f64 / terms.len().max(1) as f64)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        scored.truncate(k);
        Ok(scored)
    }

    async fn similarity_search(
        &self,
        _query: &str,
        _k: usize,
        _filter: Option<&Metadata>,
    ) -> Result<Vec<Chunk>, SearchError> {
        Err(SearchError::Backend("not used".to_string()))
    }
}

fn metadata(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().expect("object metadata")
}

#[tokio::test]
async fn ingest_then_query_builds_grounded_prompt() {
    let config = RagConfig::default();
    let ingest = IngestPipeline::new(&config).expect("default config is valid");
    let store = Arc::new(MemoryStore::default());

    let documents = vec![
        RawDocument::new(
            "<html><body><h1>Rust Ownership</h1><p>Ownership moves values between \
             bindings.&nbsp;Borrowing lends access without moving.</p>\
             <p>Copyright 2023 Example Corp. All rights reserved.</p></body></html>",
        )
        .with_metadata(metadata(json!({ "source": "ownership.html", "lang": "en" }))),
        RawDocument::new("Footer: internal\nLifetimes describe how long references stay valid.")
            .with_metadata(metadata(json!({ "title": "Lifetimes" }))),
        RawDocument::new("<div>   </div>"),
    ];

    let report = ingest
        .ingest(&documents, store.as_ref())
        .await
        .expect("memory sink accepts chunks");
    assert_eq!(report.documents, 3);
    assert_eq!(report.chunks, 2);

    {
        let stored = store.chunks.lock().unwrap();
        assert!(stored[0].content.starts_with("Rust Ownership Ownership moves values"));
        assert!(!stored[0].content.contains("Copyright"));
        assert!(!stored[0].content.contains('<'));
        assert_eq!(stored[0].metadata["lang"], json!("en"));
        assert_eq!(stored[0].chunk_index(), Some(0));
        assert_eq!(
            stored[1].content,
            "Lifetimes describe how long references stay valid."
        );
    }

    let query = QueryPipeline::new(Retriever::new(store.clone()), PromptBuilder::new(config.prompt));
    let params = SearchParams {
        k: 2,
        min_score: 0.5,
        ..SearchParams::new("ownership moves values")
    };

    let (prompt, results) = query.prompt_for(&params).await.expect("query succeeds");

    assert_eq!(results.len(), 1);
    assert!(prompt.full_text.contains("SYSTEM INSTRUCTIONS"));
    assert!(prompt.full_text.contains("ownership moves values"));
    assert!(prompt.full_text.contains("Source: ownership.html"));
    assert!(!prompt.full_text.contains("Source: Lifetimes"));
    assert!(prompt.full_text.ends_with("ANSWER:"));
}

#[tokio::test]
async fn query_without_matches_uses_placeholder() {
    let store = Arc::new(MemoryStore::default());
    let query = QueryPipeline::new(Retriever::new(store), PromptBuilder::default());

    let (prompt, results) = query
        .prompt_for(&SearchParams::new("anything at all"))
        .await
        .expect("query succeeds");

    assert!(results.is_empty());
    assert_eq!(prompt.context_block, "No context provided.");
}

#[test]
fn long_documents_respect_configured_chunk_size() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ragprep.yml");
    fs::write(
        &path,
        "chunking:\n  chunk_size: 120\n  chunk_overlap: 30\nprompt:\n  max_context_chars: 5000\n",
    )
    .expect("write config");

    let config = load_config_from(&path).expect("config loads");
    assert_eq!(config.chunking.chunk_size, 120);
    assert_eq!(config.prompt.max_context_chars, 5000);

    let paragraph = "Chunking keeps related sentences together. ".repeat(12);
    let text = format!("<p>{paragraph}</p>\n\n<p>{paragraph}</p>");
    let pipeline = IngestPipeline::new(&config).expect("valid config");
    let normalized = pipeline.normalizer().normalize(&text);
    let chunks = pipeline.prepare(&[RawDocument::new(text)]);

    assert!(chunks.len() > 2);
    assert!(chunks.iter().all(|c| char_len(&c.content) <= 120));
    let mut last_offset = None;
    for (idx, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index(), Some(idx));
        let offset = chunk.start_offset().expect("chunks are verbatim slices");
        let located: String = normalized
            .chars()
            .skip(offset)
            .take(char_len(&chunk.content))
            .collect();
        assert_eq!(located, chunk.content);
        assert!(last_offset.map_or(true, |last| offset > last));
        last_offset = Some(offset);
    }
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ragprep.yml");
    fs::write(&path, "chunking:\n  chunk_size: 50\n  chunk_overlap: 50\n").expect("write config");

    let err = load_config_from(&path).unwrap_err();
    assert!(err.to_string().contains("chunking.chunk_overlap"));
}

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = load_config_from(&dir.path().join("absent.yml")).expect("defaults");
    assert_eq!(config, RagConfig::default());
}

#[tokio::test]
async fn configured_retrieval_settings_drive_queries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(MemoryStore::default());
    let documents = vec![
        RawDocument::new("alpha beta gamma").with_metadata(metadata(json!({ "source": "a" }))),
        RawDocument::new("alpha beta delta").with_metadata(metadata(json!({ "source": "b" }))),
        RawDocument::new("alpha zeta").with_metadata(metadata(json!({ "source": "c" }))),
    ];
    IngestPipeline::new(&RagConfig::default())
        .expect("default config is valid")
        .ingest(&documents, store.as_ref())
        .await
        .expect("memory sink accepts chunks");

    let sources = |results: &[ragprep::ScoredResult]| -> Vec<String> {
        results
            .iter()
            .map(|r| r.metadata["source"].as_str().unwrap_or_default().to_string())
            .collect()
    };

    let narrow = dir.path().join("narrow.yml");
    fs::write(&narrow, "retrieval:\n  k: 1\n  min_score: 0.4\n").expect("write config");
    let config = load_config_from(&narrow).expect("config loads");
    let (_, results) = QueryPipeline::from_config(&config, store.clone())
        .ask("alpha beta")
        .await
        .expect("query succeeds");
    assert_eq!(sources(&results), vec!["a"]);

    let strict = dir.path().join("strict.yml");
    fs::write(&strict, "retrieval:\n  k: 3\n  min_score: 0.9\n").expect("write config");
    let config = load_config_from(&strict).expect("config loads");
    let (prompt, results) = QueryPipeline::from_config(&config, store.clone())
        .ask("alpha beta")
        .await
        .expect("query succeeds");
    assert_eq!(sources(&results), vec!["a", "b"]);
    assert!(!prompt.full_text.contains("Source: c"));

    let loose = dir.path().join("loose.yml");
    fs::write(&loose, "retrieval:\n  k: 3\n  min_score: 0.4\n").expect("write config");
    let config = load_config_from(&loose).expect("config loads");
    let (_, results) = QueryPipeline::from_config(&config, store)
        .ask("alpha beta")
        .await
        .expect("query succeeds");
    assert_eq!(sources(&results), vec!["a", "b", "c"]);
}
