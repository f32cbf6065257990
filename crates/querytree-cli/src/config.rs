//! CLI configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Settings shared by every command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Builder configuration file (filters, operators and builder options)
    pub builder_config: Option<PathBuf>,

    pub format: OutputFormat,

    /// Indent JSON output
    pub pretty: bool,

    /// Import unresolved references and export invalid trees
    pub allow_invalid: bool,

    /// Ignore rules without a filter or value
    pub skip_empty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            builder_config: None,
            format: OutputFormat::Json,
            pretty: true,
            allow_invalid: false,
            skip_empty: false,
        }
    }
}

impl CliConfig {
    /// Load `querytree.{toml,yaml,json}` from the working directory, then
    /// `QUERYTREE_*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("querytree")
    }

    /// Same as [`CliConfig::load`] with an explicit file name (extension optional)
    pub fn load_from(name: &str) -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(config::Environment::with_prefix("QUERYTREE"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(e) => {
                tracing::warn!("Failed to read configuration ({}), using defaults", e);
                Ok(Self::default())
            }
        }
    }
}
