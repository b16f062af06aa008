use clap::Parser;
use recon_triage::app;
use recon_triage::core::aggregator::{comment_records, AggregatorOptions, COMMENTS};
use recon_triage::core::record_filter::{
    select_discrepancies, transaction_records, AMOUNT, DATE, RECON_STATUS, TXN_REF_ID,
};
use recon_triage::core::table::load_table;
use recon_triage::core::ConfigProvider;
use recon_triage::utils::error::Result;
use recon_triage::utils::{logger, validation::Validate};
use recon_triage::TomlConfig;

#[derive(Parser)]
#[command(name = "toml-recon")]
#[command(about = "Reconciliation triage driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "recon-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Validate the inputs and show the plan without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose, &config.logging_config());
    tracing::info!("🚀 Starting TOML-based reconciliation: {}", config.run_name());
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(app::exit_code(&e));
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the model will not be called");
        if let Err(e) = perform_dry_run(&config) {
            std::process::exit(app::report_failure(&e));
        }
        return;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match app::run_configured(&config, monitor_enabled).await {
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

fn display_config_summary(config: &TomlConfig) {
    let settings = config.model_settings();
    println!("📋 Run: {} ({:?})", config.run_name(), config.stage());
    println!("   Transactions: {}", config.transactions_path());
    println!("   Comments:     {}", config.comments_path());
    println!("   Output:       {} ({:?})", config.output_path(), config.upload_target());
    println!(
        "   Model:        {} @ {} (timeout {:?})",
        settings.model, settings.endpoint, settings.timeout
    );
    match config.sample_size() {
        Some(size) => println!("   Sample:       first {} comment rows", size),
        None => println!("   Sample:       all comment rows"),
    }
    println!(
        "   Concurrency:  {} (missing case id: {:?})",
        config.concurrent_requests(),
        config.case_id_policy()
    );
}

fn perform_dry_run(config: &TomlConfig) -> Result<()> {
    let stage = config.stage();

    if stage.runs_filter() {
        let table = load_table(
            config.transactions_path(),
            &[TXN_REF_ID, AMOUNT, DATE, RECON_STATUS],
        )?;
        let records = transaction_records(&table);
        let discrepancies = select_discrepancies(&records);
        println!(
            "🔍 Would flag {} of {} transaction rows ({:?} encoded)",
            discrepancies.len(),
            table.len(),
            table.encoding()
        );
    }

    if stage.runs_resolve() {
        let table = load_table(config.comments_path(), &[COMMENTS])?;
        let options = AggregatorOptions {
            sample_size: config.sample_size(),
            concurrent_requests: config.concurrent_requests(),
            case_id_policy: config.case_id_policy(),
        };
        let batch = comment_records(&table, &options)?;
        println!(
            "🔍 Would send {} comments to the model ({} rows skipped for missing case id)",
            batch.comments.len(),
            batch.skipped_rows.len()
        );
    }

    println!("✅ Dry run completed, no files were written");
    Ok(())
}
