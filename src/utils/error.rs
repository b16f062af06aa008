use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Cannot read input file {path}: {source}")]
    InputError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse table {path}: {message}")]
    TableError { path: String, message: String },

    #[error("Table {path} is missing required column(s): {}", .missing.join(", "))]
    SchemaError { path: String, missing: Vec<String> },

    #[error("Row {row} of {path} has neither an 'Order ID' nor a 'Transaction ID'")]
    MissingCaseId { path: String, row: usize },

    #[error("Language model call failed: {message}")]
    LlmError { message: String },

    #[error("Language model call timed out after {after:?}")]
    Timeout { after: std::time::Duration },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Cannot interpret tool arguments: {message}")]
    ToolArgumentError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Model,
    Configuration,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReconError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReconError::InputError { .. } | ReconError::TableError { .. } => ErrorCategory::Input,
            ReconError::SchemaError { .. } | ReconError::MissingCaseId { .. } => {
                ErrorCategory::Schema
            }
            ReconError::LlmError { .. } | ReconError::Timeout { .. } | ReconError::ApiError(_) => {
                ErrorCategory::Model
            }
            ReconError::ConfigError { .. }
            | ReconError::ConfigValidationError { .. }
            | ReconError::InvalidConfigValueError { .. }
            | ReconError::MissingConfigError { .. }
            | ReconError::ToolArgumentError { .. } => ErrorCategory::Configuration,
            ReconError::StorageError { .. } | ReconError::IoError(_) => ErrorCategory::Storage,
            ReconError::CsvError(_) | ReconError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Schema | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// Path of the input file that caused a run-aborting failure, if any.
    pub fn offending_path(&self) -> Option<&str> {
        match self {
            ReconError::InputError { path, .. }
            | ReconError::TableError { path, .. }
            | ReconError::SchemaError { path, .. }
            | ReconError::MissingCaseId { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReconError::InputError { path, .. } => {
                format!("Check that '{}' exists and is readable", path)
            }
            ReconError::TableError { path, .. } => {
                format!("Make sure '{}' is a comma-separated file with a header row", path)
            }
            ReconError::SchemaError { path, missing } => format!(
                "Add the column(s) {} to '{}' or point to the right file",
                missing.join(", "),
                path
            ),
            ReconError::MissingCaseId { .. } => {
                "Fill in the case id or rerun with --on-missing-case-id skip".to_string()
            }
            ReconError::LlmError { .. } | ReconError::ApiError(_) => {
                "Check GROQ_API_KEY, the model endpoint and your rate limits".to_string()
            }
            ReconError::Timeout { .. } => "Raise the request timeout or retry later".to_string(),
            ReconError::ConfigError { .. }
            | ReconError::ConfigValidationError { .. }
            | ReconError::InvalidConfigValueError { .. }
            | ReconError::MissingConfigError { .. } => {
                "Review the command line flags, .env file or TOML configuration".to_string()
            }
            ReconError::ToolArgumentError { .. } => {
                "Pass arguments as key = \"value\" pairs or a JSON object".to_string()
            }
            ReconError::StorageError { .. } | ReconError::IoError(_) => {
                "Check that the output destination is writable".to_string()
            }
            ReconError::CsvError(_) | ReconError::SerializationError(_) => {
                "This is likely a bug; rerun with --verbose and report the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.offending_path() {
            Some(path) => format!("Run aborted because of '{}': {}", path, self),
            None => format!("Run failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
