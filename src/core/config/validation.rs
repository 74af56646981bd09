use serde_json::{Map, Value};

use super::defaults;
use super::types::RagConfig;
use crate::core::errors::ConfigError;

/// Checks the raw document shape before it is deserialized, so type errors carry
/// the dotted path of the offending key.
pub fn validate_raw_config(config: &Value) -> Result<(), ConfigError> {
    let root = match config {
        Value::Object(map) => map,
        Value::Null => return Ok(()),
        _ => return Err(config_type_error("root", "mapping")),
    };

    if let Some(chunking) = expect_optional_object(root, "chunking")? {
        validate_u64_field(
            chunking,
            "chunking.chunk_size",
            "chunk_size",
            1,
            10_000_000,
        )?;
        validate_u64_field(
            chunking,
            "chunking.chunk_overlap",
            "chunk_overlap",
            0,
            10_000_000,
        )?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(
            retrieval,
            "retrieval.k",
            "k",
            1,
            defaults::SEARCH_K_MAX as u64,
        )?;
        validate_f64_field(retrieval, "retrieval.min_score", "min_score", 0.0, 1.0)?;
    }

    if let Some(prompt) = expect_optional_object(root, "prompt")? {
        validate_u64_field(
            prompt,
            "prompt.max_context_chars",
            "max_context_chars",
            1,
            100_000_000,
        )?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_optional_string_field(logging, "logging.level", "level")?;
        validate_optional_string_field(logging, "logging.log_dir", "log_dir")?;
    }

    Ok(())
}

/// Cross-field contracts that only make sense on the typed config.
pub fn validate_config(config: &RagConfig) -> Result<(), ConfigError> {
    let chunking = &config.chunking;
    if chunking.chunk_size == 0 {
        return Err(ConfigError::invalid(
            "chunking.chunk_size",
            "must be greater than zero",
        ));
    }
    if chunking.chunk_overlap >= chunking.chunk_size {
        return Err(ConfigError::invalid(
            "chunking.chunk_overlap",
            format!(
                "must be smaller than chunk_size ({})",
                chunking.chunk_size
            ),
        ));
    }
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        return Err(ConfigError::invalid(
            "retrieval.min_score",
            "must be between 0 and 1",
        ));
    }
    if config.retrieval.k == 0 || config.retrieval.k > defaults::SEARCH_K_MAX {
        return Err(ConfigError::invalid(
            "retrieval.k",
            format!("must be between 1 and {}", defaults::SEARCH_K_MAX),
        ));
    }
    if config.prompt.max_context_chars == 0 {
        return Err(ConfigError::invalid(
            "prompt.max_context_chars",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "mapping")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "non-negative integer"));
    };
    if number < min || number > max {
        return Err(ConfigError::invalid(
            path,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(ConfigError::invalid(
            path,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::invalid(path, format!("expected {}", expected))
}
