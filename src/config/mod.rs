pub mod cli;
#[cfg(feature = "remote")]
pub mod remote;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::CliConfig;

#[cfg(feature = "cli")]
mod args {
    use crate::core::aggregator::DEFAULT_SAMPLE_SIZE;
    use crate::core::{CaseIdPolicy, ConfigProvider, Stage};
    use crate::domain::model::{ModelSettings, UploadTarget};
    use crate::utils::error::Result;
    use crate::utils::logger::LoggingConfig;
    use crate::utils::validation::*;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "recon-triage")]
    #[command(about = "Reconcile transactions and triage discrepancy comments with an LLM")]
    pub struct CliConfig {
        /// Transaction table (needs txn_ref_id, sys_a_amount_attribute_1, sys_a_date, recon_status)
        #[arg(long, default_value = "data/transactions.csv")]
        pub transactions: String,

        /// Comments table (needs Comments and Order ID or Transaction ID)
        #[arg(long, default_value = "data/comments.csv")]
        pub comments: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_enum, env = "UPLOAD_TARGET", default_value = "local")]
        pub upload_target: UploadTarget,

        #[arg(long, value_enum, default_value = "all")]
        pub stage: Stage,

        #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, default_value = "")]
        pub api_key: String,

        #[arg(long, default_value = "https://api.groq.com/openai/v1/chat/completions")]
        pub llm_endpoint: String,

        #[arg(long, default_value = "llama-3.3-70b-versatile")]
        pub model: String,

        #[arg(long, default_value = "0.1")]
        pub temperature: f32,

        #[arg(long, default_value = "500")]
        pub max_tokens: u32,

        /// Per-call model timeout in seconds
        #[arg(long, default_value = "60")]
        pub request_timeout: u64,

        /// Number of comment rows to process (sample mode)
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        pub sample_size: usize,

        /// Process every comment row, ignoring --sample-size
        #[arg(long)]
        pub process_all: bool,

        #[arg(long, default_value = "1")]
        pub concurrent_requests: usize,

        #[arg(long, value_enum, default_value = "skip")]
        pub on_missing_case_id: CaseIdPolicy,

        /// Debug log file; pass an empty value to disable
        #[arg(long, default_value = "output/agent.log")]
        pub log_file: String,

        #[arg(long, default_value = "1")]
        pub log_max_size_mb: u64,

        #[arg(long, default_value = "7")]
        pub log_retention_days: u64,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log stage timings and memory usage")]
        pub monitor: bool,
    }

    impl CliConfig {
        pub fn logging_config(&self) -> LoggingConfig {
            LoggingConfig {
                level: None,
                file: (!self.log_file.is_empty()).then(|| self.log_file.clone()),
                max_file_size_mb: Some(self.log_max_size_mb),
                retention_days: Some(self.log_retention_days),
            }
        }
    }

    impl ConfigProvider for CliConfig {
        fn transactions_path(&self) -> &str {
            &self.transactions
        }

        fn comments_path(&self) -> &str {
            &self.comments
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn upload_target(&self) -> UploadTarget {
            self.upload_target
        }

        fn model_settings(&self) -> ModelSettings {
            ModelSettings {
                endpoint: self.llm_endpoint.clone(),
                api_key: self.api_key.clone(),
                model: self.model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                timeout: Duration::from_secs(self.request_timeout),
            }
        }

        fn sample_size(&self) -> Option<usize> {
            (!self.process_all).then_some(self.sample_size)
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn case_id_policy(&self) -> CaseIdPolicy {
            self.on_missing_case_id
        }

        fn stage(&self) -> Stage {
            self.stage
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if self.stage.runs_filter() {
                validate_input_file("transactions", &self.transactions)?;
            }
            if self.stage.runs_resolve() {
                validate_input_file("comments", &self.comments)?;
                validate_api_key("api_key", &self.api_key)?;
                validate_url("llm_endpoint", &self.llm_endpoint)?;
                validate_non_empty_string("model", &self.model)?;
                validate_range("temperature", self.temperature, 0.0, 2.0)?;
                validate_positive_number("max_tokens", self.max_tokens as usize, 1)?;
                validate_positive_number("request_timeout", self.request_timeout as usize, 1)?;
                validate_range("concurrent_requests", self.concurrent_requests, 1, 64)?;
                if !self.process_all {
                    validate_positive_number("sample_size", self.sample_size, 1)?;
                }
            }
            validate_path("output_path", &self.output_path)?;
            Ok(())
        }
    }

}
