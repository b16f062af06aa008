pub mod aggregator;
pub mod decision;
pub mod engine;
pub mod patterns;
pub mod record_filter;
pub mod table;

pub use crate::domain::model::{
    CaseIdPolicy, CommentRecord, DecisionRecord, DiscrepancyRecord, FilterReport, NextStepEntry,
    PatternEntry, PatternExample, PatternReport, ResolutionSummary, RunReport, Stage,
    TransactionRecord,
};
pub use crate::domain::ports::{ConfigProvider, LanguageModel, Storage};
pub use crate::utils::error::Result;

/// Default key of the discrepancy table inside the output storage.
pub const DISCREPANCIES_KEY: &str = "discrepancies/discrepancies.csv";
