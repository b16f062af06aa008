use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// 交易表中的一列，欄位缺值時為 None
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub txn_ref_id: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub recon_status: Option<String>,
}

impl TransactionRecord {
    pub fn is_complete(&self) -> bool {
        self.txn_ref_id.is_some()
            && self.amount.is_some()
            && self.date.is_some()
            && self.recon_status.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyRecord {
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Date")]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    /// 0-based data row index in the source table
    pub row: usize,
    pub case_id: String,
    pub comment: String,
}

/// Outcome of triaging one comment. Column order here is the column order of
/// the resolved/unresolved tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "order_id")]
    pub case_id: String,
    pub original_comment: String,
    pub is_resolved: bool,
    pub resolution_summary: String,
    pub next_steps: String,
    pub resolution_pattern: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStepEntry {
    pub order_id: String,
    pub next_steps: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternEntry {
    pub case_id: String,
    pub pattern: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternExample {
    pub order_id: String,
    pub summary: String,
}

/// 解決模式統計報告；映射欄位保留插入順序輸出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub total_resolved: usize,
    #[serde(serialize_with = "ordered_map")]
    pub pattern_frequency: Vec<(String, usize)>,
    #[serde(serialize_with = "ordered_map")]
    pub pattern_examples: Vec<(String, Vec<PatternExample>)>,
    pub top_patterns: Vec<String>,
    pub analysis_summary: String,
}

fn ordered_map<S, V>(pairs: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub output_path: String,
    pub rows_read: usize,
    pub rows_incomplete: usize,
    pub discrepancies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub skipped_count: usize,
    pub resolved_path: String,
    pub unresolved_path: String,
    pub next_steps_path: String,
    pub patterns_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub discrepancies: Option<FilterReport>,
    pub resolution: Option<ResolutionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CaseIdPolicy {
    /// 記錄警告並略過該列
    #[default]
    Skip,
    /// 整個評論處理中止
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum UploadTarget {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    All,
    Filter,
    Resolve,
}

impl Stage {
    pub fn runs_filter(self) -> bool {
        matches!(self, Stage::All | Stage::Filter)
    }

    pub fn runs_resolve(self) -> bool {
        matches!(self, Stage::All | Stage::Resolve)
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            timeout: Duration::from_secs(60),
        }
    }
}
