pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;

#[cfg(feature = "remote")]
pub use config::remote::{RemoteConfig, S3Storage};

pub use adapters::groq::GroqClient;
pub use core::engine::ReconEngine;
pub use utils::error::{ReconError, Result};
