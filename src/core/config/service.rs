use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::defaults;
use super::types::RagConfig;
use super::validation::{validate_config, validate_raw_config};
use crate::core::errors::ConfigError;

/// Resolves the config file location: explicit path, then the environment
/// override, then `ragprep.yml` in the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = env::var(defaults::CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(defaults::CONFIG_FILE_NAME)
}

/// Loads and validates the config from the resolved location.
pub fn load_config(explicit: Option<&Path>) -> Result<RagConfig, ConfigError> {
    load_config_from(&config_path(explicit))
}

/// Loads and validates the config at `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<RagConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config found at {:?}, using defaults", path);
        return Ok(RagConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&contents).map_err(|err| match err {
        ParseFailure::Yaml(source) => ConfigError::Parse {
            path: path.display().to_string(),
            source,
        },
        ParseFailure::Invalid(err) => err,
    })?;

    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

enum ParseFailure {
    Yaml(serde_yaml::Error),
    Invalid(ConfigError),
}

fn parse_config(contents: &str) -> Result<RagConfig, ParseFailure> {
    if contents.trim().is_empty() {
        return Ok(RagConfig::default());
    }
    let raw: Value = serde_yaml::from_str(contents).map_err(ParseFailure::Yaml)?;
    validate_raw_config(&raw).map_err(ParseFailure::Invalid)?;

    let config: RagConfig = if raw.is_null() {
        RagConfig::default()
    } else {
        serde_json::from_value(raw)
            .map_err(|err| ParseFailure::Invalid(ConfigError::invalid("root", err.to_string())))?
    };
    validate_config(&config).map_err(ParseFailure::Invalid)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<RagConfig, ConfigError> {
        parse_config(contents).map_err(|err| match err {
            ParseFailure::Yaml(source) => ConfigError::Parse {
                path: "inline".to_string(),
                source,
            },
            ParseFailure::Invalid(err) => err,
        })
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse("").expect("empty yaml should parse");
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse("chunking:\n  chunk_size: 400\n  chunk_overlap: 40\n")
            .expect("partial config should parse");
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 40);
        assert_eq!(config.prompt.max_context_chars, defaults::MAX_CONTEXT_CHARS);
        assert_eq!(config.retrieval.k, defaults::SEARCH_K);
    }

    #[test]
    fn overlap_contract_is_enforced() {
        let err = parse("chunking:\n  chunk_size: 100\n  chunk_overlap: 150\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse("chunking: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_path_wins() {
        let path = config_path(Some(Path::new("/tmp/custom.yml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.yml"));
    }
}
