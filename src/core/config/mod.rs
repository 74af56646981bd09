pub mod defaults;
pub mod service;
pub mod types;
pub mod validation;

pub use service::{config_path, load_config, load_config_from};
pub use types::{ChunkingConfig, LoggingConfig, PromptConfig, RagConfig, RetrievalConfig};
