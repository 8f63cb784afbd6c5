//! Configuration management for the registrar
//!
//! Loads configuration from TOML files with environment variable substitution.
//! The loaded `Settings` value is immutable and passed by reference into each
//! component that needs it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub run: RunConfig,
    pub node: NodeConfig,
    pub names: NamesConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub shuffle_accounts: bool,
    pub use_proxy: bool,
    pub concurrency_limit: usize,
    pub max_retries: u32,
    /// Inclusive bounds, seconds. Normalized to ascending order with both
    /// bounds at least 1.
    pub sleep_range: [u64; 2],
    /// Inclusive bounds for the randomized max gas amount. Normalized like
    /// `sleep_range`.
    pub gas_amount_range: [u64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub url: String,
    pub gas_unit_price: u64,
    pub expiration_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Confirmation poll ceiling, one poll per second.
    pub transaction_wait_secs: u64,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamesConfig {
    pub api_url: String,
    pub generator_url: String,
    pub min_name_len: usize,
    pub registration_duration_secs: u64,
    pub register_function: String,
    pub set_primary_function: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    pub seed_phrases: PathBuf,
    pub proxies: PathBuf,
    pub succeeded: PathBuf,
    pub failed: PathBuf,
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("REGISTRAR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let mut settings: Settings = toml::from_str(&config_str)
            .with_context(|| "Failed to parse configuration")?;

        settings.normalize();
        settings.validate()?;

        Ok(settings)
    }

    /// Clamp and sort the numeric knobs into their valid domains
    fn normalize(&mut self) {
        self.run.concurrency_limit = self.run.concurrency_limit.max(1);
        self.run.max_retries = self.run.max_retries.max(1);
        self.run.sleep_range = normalize_range(self.run.sleep_range);
        self.run.gas_amount_range = normalize_range(self.run.gas_amount_range);
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.node.url.is_empty() {
            anyhow::bail!("Node URL must be configured");
        }
        if self.names.api_url.is_empty() || self.names.generator_url.is_empty() {
            anyhow::bail!("Name service URLs must be configured");
        }
        if self.names.register_function.is_empty() || self.names.set_primary_function.is_empty() {
            anyhow::bail!("Name contract functions must be configured");
        }
        if self.node.transaction_wait_secs == 0 {
            anyhow::bail!("Transaction wait ceiling must be at least 1 second");
        }
        Ok(())
    }
}

/// Sort a two-element inclusive range ascending, with both bounds >= 1
fn normalize_range(range: [u64; 2]) -> [u64; 2] {
    let lo = range[0].max(1);
    let hi = range[1].max(1);
    if lo <= hi {
        [lo, hi]
    } else {
        [hi, lo]
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
