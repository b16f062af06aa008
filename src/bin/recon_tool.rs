use clap::Parser;
use recon_triage::adapters::tool_args::{parse_tool_request, ToolRequest};
use recon_triage::app;
use recon_triage::utils::logger;
use recon_triage::utils::validation::{validate_api_key, validate_input_file};
use recon_triage::CliConfig;

/// Runs one pipeline stage from an agent-style tool call.
#[derive(Parser)]
#[command(name = "recon-tool")]
#[command(about = "Run preprocess_transactions or resolve_comments from a tool argument string")]
struct Args {
    /// preprocess_transactions | resolve_comments
    tool: String,

    /// Tool input: a JSON object, key = "value" pairs or a bare path
    input: String,

    #[command(flatten)]
    settings: CliConfig,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = args.settings;

    logger::init_logger(config.verbose, &config.logging_config());

    let request = match parse_tool_request(&args.tool, &args.input) {
        Ok(request) => request,
        Err(e) => std::process::exit(app::report_failure(&e)),
    };
    tracing::info!("🔧 Running {}: {:?}", request.tool_name(), request);

    let checked = match &request {
        ToolRequest::PreprocessTransactions { input_csv, .. } => {
            validate_input_file("input_csv", input_csv)
        }
        ToolRequest::ResolveComments { comments_csv } => validate_input_file("comments_csv", comments_csv)
            .and_then(|_| validate_api_key("api_key", &config.api_key)),
    };
    if let Err(e) = checked {
        std::process::exit(app::report_failure(&e));
    }

    match app::run_tool_request(&config, &request, config.monitor).await {
        Ok(report) => app::print_report(&report),
        Err(e) => {
            let code = app::report_failure(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }
}
