use crate::core::aggregator::{AggregatorOptions, CaseAggregator};
use crate::core::decision::DecisionExtractor;
use crate::core::record_filter::RecordFilter;
use crate::core::{
    ConfigProvider, FilterReport, LanguageModel, ResolutionSummary, RunReport, Stage, Storage,
    DISCREPANCIES_KEY,
};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs the reconciliation stages against one output storage.
pub struct ReconEngine<S: Storage + Clone, M: LanguageModel> {
    filter: RecordFilter<S>,
    aggregator: CaseAggregator<S, M>,
    monitor: SystemMonitor,
}

impl<S: Storage + Clone, M: LanguageModel> ReconEngine<S, M> {
    pub fn new(storage: S, extractor: DecisionExtractor<M>, options: AggregatorOptions) -> Self {
        Self::new_with_monitoring(storage, extractor, options, false)
    }

    pub fn new_with_monitoring(
        storage: S,
        extractor: DecisionExtractor<M>,
        options: AggregatorOptions,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            filter: RecordFilter::new(storage.clone()),
            aggregator: CaseAggregator::new(storage, extractor, options),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 依設定建立引擎
    pub fn from_config<C: ConfigProvider>(storage: S, model: M, config: &C, monitor_enabled: bool) -> Self {
        let extractor = DecisionExtractor::new(model, config.model_settings().timeout);
        let options = AggregatorOptions {
            sample_size: config.sample_size(),
            concurrent_requests: config.concurrent_requests(),
            case_id_policy: config.case_id_policy(),
        };
        Self::new_with_monitoring(storage, extractor, options, monitor_enabled)
    }

    pub async fn filter_transactions(&self, input_path: &str, output_key: &str) -> Result<FilterReport> {
        self.monitor.log_stats("Preprocessing started");
        let report = self.filter.filter_transactions(input_path, output_key).await?;
        self.monitor.log_stats("Preprocessing finished");
        Ok(report)
    }

    pub async fn resolve_comments(&self, comments_path: &str) -> Result<ResolutionSummary> {
        self.monitor.log_stats("Resolution started");
        let summary = self.aggregator.resolve_comments(comments_path).await?;
        self.monitor.log_stats("Resolution finished");
        Ok(summary)
    }

    pub async fn run(&self, transactions_path: &str, comments_path: &str, stage: Stage) -> Result<RunReport> {
        tracing::info!("🚀 Starting reconciliation run ({:?})", stage);
        let mut report = RunReport::default();

        if stage.runs_filter() {
            report.discrepancies = Some(
                self.filter_transactions(transactions_path, DISCREPANCIES_KEY)
                    .await?,
            );
        }

        if stage.runs_resolve() {
            report.resolution = Some(self.resolve_comments(comments_path).await?);
        }

        self.monitor.log_final_stats();
        Ok(report)
    }
}
