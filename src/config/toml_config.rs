use crate::core::aggregator::DEFAULT_SAMPLE_SIZE;
use crate::core::{CaseIdPolicy, ConfigProvider, Stage};
use crate::domain::model::{ModelSettings, UploadTarget};
use crate::utils::error::{ReconError, Result};
use crate::utils::logger::LoggingConfig;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: Option<RunConfig>,
    pub input: InputConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: Option<String>,
    pub stage: Option<Stage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub transactions: String,
    pub comments: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub sample_size: Option<usize>,
    pub process_all: Option<bool>,
    pub concurrent_requests: Option<usize>,
    pub on_missing_case_id: Option<CaseIdPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub upload_target: Option<UploadTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReconError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReconError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GROQ_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReconError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn run_name(&self) -> &str {
        self.run
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .unwrap_or("reconciliation")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn validate_config(&self) -> Result<()> {
        let stage = self.stage();

        if stage.runs_filter() {
            validation::validate_input_file("input.transactions", &self.input.transactions)?;
        }

        if stage.runs_resolve() {
            let settings = self.model_settings();
            validation::validate_input_file("input.comments", &self.input.comments)?;
            validation::validate_api_key("llm.api_key", &settings.api_key)?;
            validation::validate_url("llm.endpoint", &settings.endpoint)?;
            validation::validate_non_empty_string("llm.model", &settings.model)?;
            validation::validate_range("llm.temperature", settings.temperature, 0.0, 2.0)?;
            validation::validate_positive_number("llm.max_tokens", settings.max_tokens as usize, 1)?;
            validation::validate_positive_number(
                "llm.timeout_seconds",
                settings.timeout.as_secs() as usize,
                1,
            )?;
            validation::validate_range(
                "processing.concurrent_requests",
                self.concurrent_requests(),
                1,
                64,
            )?;
            if let Some(size) = self.sample_size() {
                validation::validate_positive_number("processing.sample_size", size, 1)?;
            }
        }

        validation::validate_path("output.path", &self.output.path)?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn transactions_path(&self) -> &str {
        &self.input.transactions
    }

    fn comments_path(&self) -> &str {
        &self.input.comments
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn upload_target(&self) -> UploadTarget {
        self.output.upload_target.unwrap_or_default()
    }

    fn model_settings(&self) -> ModelSettings {
        let defaults = ModelSettings::default();
        let llm = &self.llm;
        ModelSettings {
            endpoint: llm.endpoint.clone().unwrap_or(defaults.endpoint),
            api_key: llm.api_key.clone().unwrap_or(defaults.api_key),
            model: llm.model.clone().unwrap_or(defaults.model),
            temperature: llm.temperature.unwrap_or(defaults.temperature),
            max_tokens: llm.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: llm
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    fn sample_size(&self) -> Option<usize> {
        if self.processing.process_all.unwrap_or(false) {
            None
        } else {
            Some(self.processing.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE))
        }
    }

    fn concurrent_requests(&self) -> usize {
        self.processing.concurrent_requests.unwrap_or(1)
    }

    fn case_id_policy(&self) -> CaseIdPolicy {
        self.processing.on_missing_case_id.unwrap_or_default()
    }

    fn stage(&self) -> Stage {
        self.run.as_ref().and_then(|r| r.stage).unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[input]
transactions = "data/transactions.csv"
comments = "data/comments.csv"

[llm]
api_key = "gsk_test"

[output]
path = "./output"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.stage(), Stage::All);
        assert_eq!(config.sample_size(), Some(10));
        assert_eq!(config.concurrent_requests(), 1);
        assert_eq!(config.upload_target(), UploadTarget::Local);
        assert_eq!(config.model_settings().model, "llama-3.3-70b-versatile");
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[run]
name = "daily"
stage = "resolve"

[input]
transactions = "in/t.csv"
comments = "in/c.csv"

[llm]
endpoint = "http://localhost:9000/v1/chat/completions"
api_key = "k"
model = "llama-3.1-8b-instant"
temperature = 0.0
max_tokens = 300
timeout_seconds = 15

[processing]
process_all = true
concurrent_requests = 4
on_missing_case_id = "abort"

[output]
path = "/tmp/recon"
upload_target = "remote"

[logging]
file = "logs/recon.log"
retention_days = 3

[monitoring]
enabled = true
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.run_name(), "daily");
        assert_eq!(config.stage(), Stage::Resolve);
        assert_eq!(config.sample_size(), None);
        assert_eq!(config.concurrent_requests(), 4);
        assert_eq!(config.case_id_policy(), CaseIdPolicy::Abort);
        assert_eq!(config.upload_target(), UploadTarget::Remote);
        assert_eq!(config.model_settings().timeout, Duration::from_secs(15));
        assert_eq!(config.logging_config().retention_days, Some(3));
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RECON_TEST_API_KEY", "gsk_from_env");

        let toml_content = MINIMAL.replace("gsk_test", "${RECON_TEST_API_KEY}");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.model_settings().api_key, "gsk_from_env");

        std::env::remove_var("RECON_TEST_API_KEY");
    }

    #[test]
    fn test_unset_api_key_variable_fails_validation() {
        let toml_content = MINIMAL.replace("gsk_test", "${RECON_TEST_UNSET_KEY}");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ReconError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = MINIMAL.replace("data/comments.csv", "data/comments.xlsx");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input.transactions, "data/transactions.csv");
    }
}
