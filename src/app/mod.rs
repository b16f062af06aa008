//! Glue shared by the binaries: storage selection, result printing and exit codes.

use crate::adapters::groq::GroqClient;
use crate::adapters::tool_args::ToolRequest;
use crate::config::cli::LocalStorage;
use crate::core::engine::ReconEngine;
use crate::core::{ConfigProvider, RunReport, Storage, DISCREPANCIES_KEY};
use crate::domain::model::UploadTarget;
use crate::utils::error::{ErrorSeverity, ReconError, Result};
use std::path::Path;

/// 依上傳目標建立儲存並執行完整流程
pub async fn run_configured<C: ConfigProvider>(config: &C, monitor_enabled: bool) -> Result<RunReport> {
    match config.upload_target() {
        UploadTarget::Local => {
            let storage = LocalStorage::new(config.output_path().to_string());
            run_with_storage(storage, config, monitor_enabled).await
        }
        UploadTarget::Remote => run_remote(config, monitor_enabled).await,
    }
}

async fn run_with_storage<S, C>(storage: S, config: &C, monitor_enabled: bool) -> Result<RunReport>
where
    S: Storage + Clone,
    C: ConfigProvider,
{
    let model = GroqClient::new(config.model_settings());
    let engine = ReconEngine::from_config(storage, model, config, monitor_enabled);
    engine
        .run(config.transactions_path(), config.comments_path(), config.stage())
        .await
}

#[cfg(feature = "remote")]
async fn run_remote<C: ConfigProvider>(config: &C, monitor_enabled: bool) -> Result<RunReport> {
    use crate::config::remote::RemoteConfig;
    use crate::utils::validation::Validate;

    let remote = RemoteConfig::from_env()?;
    remote.validate()?;
    let storage = remote.storage().await;
    run_with_storage(storage, config, monitor_enabled).await
}

#[cfg(not(feature = "remote"))]
async fn run_remote<C: ConfigProvider>(_config: &C, _monitor_enabled: bool) -> Result<RunReport> {
    Err(ReconError::ConfigError {
        message: "upload target 'remote' requires building with the 'remote' feature".to_string(),
    })
}

/// Storage and key for a tool's output file. An explicit path is written
/// exactly where it points; otherwise the default key under `output_root`.
pub fn tool_output(output_root: &str, output_csv: Option<&str>) -> Result<(LocalStorage, String)> {
    let Some(path) = output_csv else {
        return Ok((LocalStorage::new(output_root.to_string()), DISCREPANCIES_KEY.to_string()));
    };

    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ReconError::ToolArgumentError {
            message: format!("output_csv '{}' does not name a file", path),
        })?;
    let parent = match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
        _ => ".".to_string(),
    };
    Ok((LocalStorage::new(parent), file_name.to_string()))
}

/// Runs a single normalized tool request against local storage.
pub async fn run_tool_request<C: ConfigProvider>(
    config: &C,
    request: &ToolRequest,
    monitor_enabled: bool,
) -> Result<RunReport> {
    let output_csv = match request {
        ToolRequest::PreprocessTransactions { output_csv, .. } => output_csv.as_deref(),
        ToolRequest::ResolveComments { .. } => None,
    };
    let (storage, output_key) = tool_output(config.output_path(), output_csv)?;
    let model = GroqClient::new(config.model_settings());
    let engine = ReconEngine::from_config(storage, model, config, monitor_enabled);

    let mut report = RunReport::default();
    match request {
        ToolRequest::PreprocessTransactions { input_csv, .. } => {
            report.discrepancies = Some(engine.filter_transactions(input_csv, &output_key).await?);
        }
        ToolRequest::ResolveComments { comments_csv } => {
            report.resolution = Some(engine.resolve_comments(comments_csv).await?);
        }
    }
    Ok(report)
}

pub fn print_report(report: &RunReport) {
    if let Some(filter) = &report.discrepancies {
        println!(
            "✅ {} of {} transactions flagged as discrepancies ({} incomplete rows dropped)",
            filter.discrepancies, filter.rows_read, filter.rows_incomplete
        );
        println!("📁 Discrepancies: {}", filter.output_path);
    }
    if let Some(resolution) = &report.resolution {
        println!(
            "✅ Resolved: {}, Unresolved: {}, Skipped rows: {}",
            resolution.resolved_count, resolution.unresolved_count, resolution.skipped_count
        );
        println!("📁 Resolved: {}", resolution.resolved_path);
        println!("📁 Unresolved: {}", resolution.unresolved_path);
        println!("📁 Next steps: {}", resolution.next_steps_path);
        println!("📁 Patterns: {}", resolution.patterns_path);
    }
}

pub fn exit_code(error: &ReconError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

/// 記錄錯誤並回傳退出碼
pub fn report_failure(error: &ReconError) -> i32 {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("❌ {}", error.user_friendly_message());
    if let Some(path) = error.offending_path() {
        eprintln!("📄 Offending file: {}", path);
    }
    eprintln!("💡 {}", error.recovery_suggestion());
    exit_code(error)
}
