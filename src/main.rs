use clap::Parser;
use recon_triage::app;
use recon_triage::utils::{logger, validation::Validate};
use recon_triage::CliConfig;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, &config.logging_config());

    tracing::info!("Starting recon-triage");
    tracing::debug!(
        "Stage: {:?}, transactions: {}, comments: {}, output: {}",
        config.stage,
        config.transactions,
        config.comments,
        config.output_path
    );

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(app::exit_code(&e));
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match app::run_configured(&config, config.monitor).await {
        Ok(report) => {
            tracing::info!("✅ Reconciliation run completed");
            app::print_report(&report);
        }
        Err(e) => {
            let code = app::report_failure(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }
}
