use crate::utils::error::{ReconError, Result};
use std::collections::HashSet;
use url::Url;

pub const INPUT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ReconError {
    ReconError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// Input tables must be delimited text files.
pub fn validate_input_file(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    let allowed: HashSet<&str> = INPUT_EXTENSIONS.iter().copied().collect();

    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(invalid(
            field_name,
            path,
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                INPUT_EXTENSIONS.join(", ")
            ),
        )),
        None => Err(invalid(field_name, path, "File has no extension or invalid filename")),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// API keys must be present and not an unsubstituted `${VAR}` placeholder.
pub fn validate_api_key(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReconError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    if value.starts_with("${") && value.ends_with('}') {
        return Err(ReconError::MissingConfigError {
            field: format!("{} (environment variable {} is not set)", field_name, value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("llm.endpoint", "https://api.groq.com/openai/v1/chat/completions").is_ok());
        assert!(validate_url("llm.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("llm.endpoint", "").is_err());
        assert!(validate_url("llm.endpoint", "invalid-url").is_err());
        assert!(validate_url("llm.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_input_file() {
        assert!(validate_input_file("input.transactions", "data/recon.csv").is_ok());
        assert!(validate_input_file("input.transactions", "data/RECON.CSV").is_ok());
        assert!(validate_input_file("input.comments", "data/comments.xlsx").is_err());
        assert!(validate_input_file("input.comments", "data/comments").is_err());
        assert!(validate_input_file("input.comments", "").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("llm.temperature", 0.1_f32, 0.0, 2.0).is_ok());
        assert!(validate_range("llm.temperature", 2.5_f32, 0.0, 2.0).is_err());
        assert!(validate_positive_number("processing.concurrent_requests", 0, 1).is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("llm.api_key", "gsk_123").is_ok());
        assert!(validate_api_key("llm.api_key", "  ").is_err());
        assert!(matches!(
            validate_api_key("llm.api_key", "${GROQ_API_KEY}"),
            Err(ReconError::MissingConfigError { .. })
        ));
    }
}
