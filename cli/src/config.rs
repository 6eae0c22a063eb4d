//! CLI configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_types::{AccountId, TokenParams};
use tally_utils::LogFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Configuration for a token deployment replayed by the CLI.
///
/// Can be loaded from a TOML file via [`CliConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Account that deploys the token and may mint.
    #[serde(default = "default_owner")]
    pub owner: AccountId,

    /// Reserved account holding all staked principal.
    #[serde(default = "default_custody")]
    pub custody: AccountId,

    /// Further accounts allowed to mint.
    #[serde(default)]
    pub minters: Vec<AccountId>,

    /// Clock reading (Unix seconds) at deployment. Unset means the current
    /// system time.
    #[serde(default)]
    pub start_time: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Token metadata and reward rate.
    #[serde(default)]
    pub token: TokenParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_owner() -> AccountId {
    AccountId::from_low_u64(1)
}

fn default_custody() -> AccountId {
    AccountId::from_low_u64(0x5a4e)
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject configurations the token cannot be deployed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner == self.custody {
            return Err(ConfigError::Parse(
                "owner and custody must be different accounts".into(),
            ));
        }
        if self.minters.contains(&self.custody) {
            return Err(ConfigError::Parse(
                "custody is always a minter; do not list it in minters".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            custody: default_custody(),
            minters: Vec::new(),
            start_time: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
            token: TokenParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = CliConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = CliConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = CliConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.token.reward_apr_bps, 1_000);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.owner, AccountId::from_low_u64(1));
        assert_eq!(config.start_time, None);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            owner = "0x00000000000000000000000000000000000000aa"
            log_format = "json"

            [token]
            symbol = "STK"
            reward_apr_bps = 500
        "#;
        let config = CliConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.owner, AccountId::from_low_u64(0xaa));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.token.symbol, "STK");
        assert_eq!(config.token.reward_apr_bps, 500);
        assert_eq!(config.token.name, "Tally"); // default
    }

    #[test]
    fn owner_equal_to_custody_is_rejected() {
        let toml = r#"
            owner = "0x0000000000000000000000000000000000005a4e"
        "#;
        assert!(matches!(
            CliConfig::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn malformed_account_is_rejected() {
        assert!(matches!(
            CliConfig::from_toml_str("owner = \"brst_1\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "start_time = 42").unwrap();
        let config = CliConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.start_time, Some(42));
    }

    #[test]
    fn missing_file_returns_read_error() {
        let result = CliConfig::from_toml_file(Path::new("/nonexistent/tally.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
