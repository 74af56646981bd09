//! Built-in defaults applied when a config key is absent.

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

pub const SEARCH_K: usize = 2;
pub const SEARCH_K_MAX: usize = 100;
pub const MIN_SCORE: f64 = 0.5;

/// Roughly 30k tokens at ~4 characters per token.
pub const MAX_CONTEXT_CHARS: usize = 120_000;

pub const LOG_LEVEL: &str = "info";

pub const CONFIG_ENV_VAR: &str = "RAGPREP_CONFIG_PATH";
pub const CONFIG_FILE_NAME: &str = "ragprep.yml";
