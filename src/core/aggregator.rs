use crate::core::decision::DecisionExtractor;
use crate::core::patterns::analyze_patterns;
use crate::core::table::{load_table, write_table, Table};
use crate::core::{
    CaseIdPolicy, CommentRecord, DecisionRecord, LanguageModel, NextStepEntry, PatternEntry,
    ResolutionSummary, Storage,
};
use crate::utils::error::{ReconError, Result};
use futures::stream::{self, StreamExt};

pub const COMMENTS: &str = "Comments";
pub const ORDER_ID: &str = "Order ID";
pub const TRANSACTION_ID: &str = "Transaction ID";

pub const RESOLVED_KEY: &str = "resolved/resolved.csv";
pub const UNRESOLVED_KEY: &str = "unresolved/unresolved.csv";
pub const NEXT_STEPS_KEY: &str = "unresolved/next_steps.csv";
pub const PATTERNS_KEY: &str = "patterns/patterns.json";

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

const DECISION_COLUMNS: [&str; 7] = [
    "order_id",
    "original_comment",
    "is_resolved",
    "resolution_summary",
    "next_steps",
    "resolution_pattern",
    "confidence",
];
const NEXT_STEP_COLUMNS: [&str; 3] = ["order_id", "next_steps", "summary"];

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// 只處理前 N 列；None 表示全部處理
    pub sample_size: Option<usize>,
    pub concurrent_requests: usize,
    pub case_id_policy: CaseIdPolicy,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            sample_size: Some(DEFAULT_SAMPLE_SIZE),
            concurrent_requests: 1,
            case_id_policy: CaseIdPolicy::Skip,
        }
    }
}

/// Comment rows that survived loading, plus the ones skipped for lacking a case id.
#[derive(Debug, Clone, Default)]
pub struct CommentBatch {
    pub comments: Vec<CommentRecord>,
    pub skipped_rows: Vec<usize>,
}

/// Decisions routed into their output collections, in input order.
#[derive(Debug, Clone, Default)]
pub struct TriageOutcome {
    pub resolved: Vec<DecisionRecord>,
    pub unresolved: Vec<DecisionRecord>,
    pub next_steps: Vec<NextStepEntry>,
    pub patterns: Vec<PatternEntry>,
}

impl TriageOutcome {
    pub fn route(&mut self, decision: DecisionRecord) {
        if decision.is_resolved {
            self.patterns.push(PatternEntry {
                case_id: decision.case_id.clone(),
                pattern: decision.resolution_pattern.clone(),
                summary: decision.resolution_summary.clone(),
            });
            self.resolved.push(decision);
        } else {
            self.next_steps.push(NextStepEntry {
                order_id: decision.case_id.clone(),
                next_steps: decision.next_steps.clone(),
                summary: decision.resolution_summary.clone(),
            });
            self.unresolved.push(decision);
        }
    }
}

/// Builds comment records from a loaded table, applying the sample window
/// and the missing-case-id policy.
pub fn comment_records(table: &Table, options: &AggregatorOptions) -> Result<CommentBatch> {
    let order_id = table.column(ORDER_ID);
    let transaction_id = table.column(TRANSACTION_ID);
    let comments = table.column(COMMENTS);

    if order_id.is_none() && transaction_id.is_none() {
        return Err(ReconError::SchemaError {
            path: table.path().to_string(),
            missing: vec![format!("{} or {}", ORDER_ID, TRANSACTION_ID)],
        });
    }

    let window = options.sample_size.unwrap_or(table.len()).min(table.len());
    let mut batch = CommentBatch::default();

    for row in 0..window {
        let case_id = table
            .cell(row, order_id)
            .or_else(|| table.cell(row, transaction_id));

        match case_id {
            Some(case_id) => batch.comments.push(CommentRecord {
                row,
                case_id: case_id.to_string(),
                comment: table.cell(row, comments).unwrap_or_default().to_string(),
            }),
            None => match options.case_id_policy {
                CaseIdPolicy::Abort => {
                    return Err(ReconError::MissingCaseId {
                        path: table.path().to_string(),
                        row,
                    })
                }
                CaseIdPolicy::Skip => {
                    tracing::warn!(
                        "⏭️ Skipping row {} of {}: no Order ID or Transaction ID",
                        row,
                        table.path()
                    );
                    batch.skipped_rows.push(row);
                }
            },
        }
    }

    Ok(batch)
}

/// 逐列呼叫模型判斷評論是否已解決，並輸出各類結果檔案
pub struct CaseAggregator<S: Storage, M: LanguageModel> {
    storage: S,
    extractor: DecisionExtractor<M>,
    options: AggregatorOptions,
}

impl<S: Storage, M: LanguageModel> CaseAggregator<S, M> {
    pub fn new(storage: S, extractor: DecisionExtractor<M>, options: AggregatorOptions) -> Self {
        Self {
            storage,
            extractor,
            options,
        }
    }

    pub fn load_comments(&self, path: &str) -> Result<CommentBatch> {
        let table = load_table(path, &[COMMENTS])?;
        let batch = comment_records(&table, &self.options)?;

        match self.options.sample_size {
            Some(limit) if limit < table.len() => tracing::info!(
                "📋 Processing {} of {} comments (sample mode)",
                batch.comments.len(),
                table.len()
            ),
            _ => tracing::info!("📋 Processing {} comments", batch.comments.len()),
        }
        Ok(batch)
    }

    /// Runs the extractor over every comment. At most `concurrent_requests`
    /// calls are in flight; results come back in input order.
    pub async fn triage(&self, comments: Vec<CommentRecord>) -> TriageOutcome {
        let extractor = &self.extractor;
        let concurrency = self.options.concurrent_requests.max(1);

        let decisions: Vec<DecisionRecord> = stream::iter(comments)
            .map(move |comment| async move {
                tracing::debug!("Triage source row {} (Order ID {})", comment.row, comment.case_id);
                extractor.decide(&comment.case_id, &comment.comment).await
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut outcome = TriageOutcome::default();
        for decision in decisions {
            outcome.route(decision);
        }
        outcome
    }

    pub async fn persist(&self, outcome: &TriageOutcome, skipped_count: usize) -> Result<ResolutionSummary> {
        let resolved = write_table(&DECISION_COLUMNS, &outcome.resolved)?;
        self.storage.write_file(RESOLVED_KEY, &resolved).await?;

        let unresolved = write_table(&DECISION_COLUMNS, &outcome.unresolved)?;
        self.storage.write_file(UNRESOLVED_KEY, &unresolved).await?;

        let next_steps = write_table(&NEXT_STEP_COLUMNS, &outcome.next_steps)?;
        self.storage.write_file(NEXT_STEPS_KEY, &next_steps).await?;

        let report = analyze_patterns(&outcome.patterns);
        let patterns = serde_json::to_vec_pretty(&report)?;
        self.storage.write_file(PATTERNS_KEY, &patterns).await?;
        tracing::info!("🧭 {}", report.analysis_summary);

        Ok(ResolutionSummary {
            resolved_count: outcome.resolved.len(),
            unresolved_count: outcome.unresolved.len(),
            skipped_count,
            resolved_path: self.storage.location(RESOLVED_KEY),
            unresolved_path: self.storage.location(UNRESOLVED_KEY),
            next_steps_path: self.storage.location(NEXT_STEPS_KEY),
            patterns_path: self.storage.location(PATTERNS_KEY),
        })
    }

    pub async fn resolve_comments(&self, comments_path: &str) -> Result<ResolutionSummary> {
        tracing::info!("🤖 Starting LLM resolution of comments from {}", comments_path);

        let batch = self.load_comments(comments_path)?;
        let outcome = self.triage(batch.comments).await;
        let summary = self.persist(&outcome, batch.skipped_rows.len()).await?;

        tracing::info!(
            "✅ Resolution complete: {} resolved, {} unresolved, {} skipped",
            summary.resolved_count,
            summary.unresolved_count,
            summary.skipped_count
        );
        Ok(summary)
    }
}
