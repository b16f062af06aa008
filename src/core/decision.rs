use crate::core::{DecisionRecord, LanguageModel};
use crate::utils::error::ReconError;
use serde_json::{Map, Value};
use std::time::Duration;

pub const PARSE_FAILURE_PATTERN: &str = "Unknown";
pub const CALL_FAILURE_PATTERN: &str = "Error";
pub const PARSE_FAILURE_SUMMARY: &str = "Failed to parse LLM response";
pub const MANUAL_REVIEW: &str = "Manual review required";

const DEFAULT_PATTERN: &str = "Unknown";
const DEFAULT_NEXT_STEPS: &str = "No steps specified";

/// Builds the analysis request for one comment. Case id and comment are
/// embedded verbatim.
pub fn build_prompt(case_id: &str, comment: &str) -> String {
    format!(
        r#"Analyze this financial reconciliation comment and determine:

Order ID: {case_id}
Comment: {comment}

Please respond in JSON format with the following structure:
{{
    "is_resolved": true/false,
    "resolution_summary": "Brief summary of what happened",
    "next_steps": "What should be done next (if unresolved)",
    "resolution_pattern": "Category/pattern of resolution (e.g., 'Payment Verification', 'System Sync Issue', 'Manual Correction', 'Customer Refund', etc.)",
    "confidence": 0.0-1.0
}}

Consider:
- Is the issue fully resolved?
- What was the root cause?
- What pattern does this resolution follow?
- What are the next steps if unresolved?"#
    )
}

/// Substring from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

/// 解析模型回覆；無法解析時回傳 "Unknown" 模式的替代紀錄
pub fn parse_decision(case_id: &str, comment: &str, reply: &str) -> DecisionRecord {
    let parsed = extract_json_object(reply)
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        });

    match parsed {
        Some(fields) => decision_from_fields(case_id, comment, &fields),
        None => {
            tracing::warn!("⚠️ Failed to parse LLM response for Order ID {}", case_id);
            tracing::debug!("Unparseable reply for {}: {}", case_id, reply);
            fallback_decision(
                case_id,
                comment,
                PARSE_FAILURE_SUMMARY.to_string(),
                PARSE_FAILURE_PATTERN,
            )
        }
    }
}

/// Synthetic unresolved record used when a decision could not be obtained.
pub fn fallback_decision(case_id: &str, comment: &str, summary: String, pattern: &str) -> DecisionRecord {
    DecisionRecord {
        case_id: case_id.to_string(),
        original_comment: comment.to_string(),
        is_resolved: false,
        resolution_summary: summary,
        next_steps: MANUAL_REVIEW.to_string(),
        resolution_pattern: pattern.to_string(),
        confidence: 0.0,
    }
}

fn decision_from_fields(case_id: &str, comment: &str, fields: &Map<String, Value>) -> DecisionRecord {
    DecisionRecord {
        case_id: case_id.to_string(),
        original_comment: comment.to_string(),
        is_resolved: fields.get("is_resolved").map(as_flag).unwrap_or(false),
        resolution_summary: text_field(fields, "resolution_summary").unwrap_or_default(),
        next_steps: text_field(fields, "next_steps").unwrap_or_else(|| DEFAULT_NEXT_STEPS.to_string()),
        resolution_pattern: text_field(fields, "resolution_pattern")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
        confidence: fields.get("confidence").map(as_confidence).unwrap_or(0.0),
    }
}

fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "resolved"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

fn as_confidence(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// 針對單一評論呼叫模型並產生決策紀錄，永遠不回傳錯誤
pub struct DecisionExtractor<M: LanguageModel> {
    model: M,
    timeout: Duration,
}

impl<M: LanguageModel> DecisionExtractor<M> {
    pub fn new(model: M, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub async fn decide(&self, case_id: &str, comment: &str) -> DecisionRecord {
        let prompt = build_prompt(case_id, comment);

        let reply = match tokio::time::timeout(self.timeout, self.model.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ReconError::Timeout {
                after: self.timeout,
            }),
        };

        let decision = match reply {
            Ok(reply) => parse_decision(case_id, comment, &reply),
            Err(e) => {
                tracing::error!("❌ Error processing Order ID {}: {}", case_id, e);
                fallback_decision(case_id, comment, format!("Error: {}", e), CALL_FAILURE_PATTERN)
            }
        };

        tracing::info!(
            "Processed Order ID {}: {}",
            case_id,
            if decision.is_resolved { "Resolved" } else { "Unresolved" }
        );
        decision
    }
}
