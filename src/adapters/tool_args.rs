//! Normalizes loosely formatted tool invocations into typed requests.
//!
//! Agents often pass arguments as a single string such as
//! `input_csv = 'data/t.csv', output_csv = 'out.csv'` or just a quoted path.

use crate::utils::error::{ReconError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

pub const PREPROCESS_TOOL: &str = "preprocess_transactions";
pub const RESOLVE_TOOL: &str = "resolve_comments";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// `output_csv` is a filesystem path; None writes the default
    /// discrepancy key under the output root.
    PreprocessTransactions {
        input_csv: String,
        output_csv: Option<String>,
    },
    ResolveComments {
        comments_csv: String,
    },
}

impl ToolRequest {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::PreprocessTransactions { .. } => PREPROCESS_TOOL,
            ToolRequest::ResolveComments { .. } => RESOLVE_TOOL,
        }
    }
}

fn argument_error(message: impl Into<String>) -> ReconError {
    ReconError::ToolArgumentError {
        message: message.into(),
    }
}

fn pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| argument_error(format!("invalid pattern {}: {}", source, e)))
}

/// Collects `key = "value"` / `key='value'` pairs.
pub fn parse_kwargs(input: &str) -> Result<HashMap<String, String>> {
    let re = pattern(r#"(\w+)\s*=\s*['"]([^'"]+)['"]"#)?;
    Ok(re
        .captures_iter(input.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect())
}

/// Best-effort single path from free text.
pub fn extract_path(input: &str) -> Result<String> {
    let s = input.trim();

    let quoted = pattern(r#"["']([^"']+)["']"#)?;
    if let Some(caps) = quoted.captures(s) {
        return Ok(caps[1].to_string());
    }

    let unterminated = pattern(r#"["']([^"']+)$"#)?;
    if let Some(caps) = unterminated.captures(s) {
        return Ok(caps[1].to_string());
    }

    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() > 1 {
        if let Some(last) = parts.last() {
            return Ok(last.trim_matches(|c| c == '"' || c == '\'').to_string());
        }
    }

    Ok(s.to_string())
}

fn json_arguments(input: &str) -> Option<HashMap<String, String>> {
    match serde_json::from_str::<Value>(input.trim()).ok()? {
        Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

pub fn parse_tool_request(tool: &str, input: &str) -> Result<ToolRequest> {
    let structured = json_arguments(input);
    let arguments = match &structured {
        Some(args) => args.clone(),
        None => parse_kwargs(input)?,
    };
    tracing::debug!("🔧 {} arguments: {:?}", tool, arguments);

    match tool {
        PREPROCESS_TOOL => {
            let input_csv = match arguments.get("input_csv") {
                Some(path) => path.clone(),
                None if structured.is_none() && arguments.is_empty() => extract_path(input)?,
                None => String::new(),
            };
            if input_csv.is_empty() {
                return Err(argument_error(format!(
                    "input_csv not found in tool input: {}",
                    input
                )));
            }
            let output_csv = arguments.get("output_csv").cloned();
            Ok(ToolRequest::PreprocessTransactions {
                input_csv,
                output_csv,
            })
        }
        RESOLVE_TOOL => {
            let comments_csv = match (arguments.get("comments_csv"), &structured) {
                (Some(path), _) => path.clone(),
                (None, Some(_)) => String::new(),
                (None, None) => extract_path(input)?,
            };
            if comments_csv.is_empty() {
                return Err(argument_error(format!(
                    "comments_csv not found in tool input: {}",
                    input
                )));
            }
            Ok(ToolRequest::ResolveComments { comments_csv })
        }
        other => Err(argument_error(format!(
            "unknown tool '{}', expected {} or {}",
            other, PREPROCESS_TOOL, RESOLVE_TOOL
        ))),
    }
}
