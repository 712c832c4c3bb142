//! Service configuration
//!
//! Loaded from `aotd.toml` in the platform data directory, or from the path
//! named by `AOTD_CONFIG`. Every key is optional.
//!
//! The request protocol carries the caller's identity, `is_admin` included,
//! and the server takes it as given. Anything that can reach the listener can
//! act as an admin, so `listen_addr` stays on loopback unless an
//! authenticating proxy or a trusted private network sits in front of it.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::eligibility::{PolicyKind, RecencyDecay};

/// Environment variable that overrides the config path
pub const CONFIG_ENV: &str = "AOTD_CONFIG";

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "aotd.toml";

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "aotd.db";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone that defines calendar dates
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Database path; defaults to the data directory
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Interface the request server binds. Callers are trusted, see the module docs.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Seed secret; generated and persisted in the database when absent
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub outages: OutageConfig,
    #[serde(default)]
    pub recency: RecencyConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Outage request rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutageConfig {
    /// Days of notice a self-requested outage needs
    #[serde(default = "default_lead_days")]
    pub lead_days: u32,
    /// Longest self-requested window, in days
    #[serde(default = "default_max_days")]
    pub max_days: u32,
}

/// Recency dampening
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default)]
    pub decay: RecencyDecay,
}

/// Block policy list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Evaluated in order; the first block wins
    #[serde(default = "default_policy_order")]
    pub order: Vec<PolicyKind>,
    /// Consecutive days one submitter may win; 0 disables the cap
    #[serde(default = "default_max_consecutive_picks")]
    pub max_consecutive_picks: u32,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_listen_port() -> u16 {
    7341
}

fn default_lead_days() -> u32 {
    3
}

fn default_max_days() -> u32 {
    90
}

fn default_window_days() -> u32 {
    14
}

fn default_policy_order() -> Vec<PolicyKind> {
    vec![
        PolicyKind::Outage,
        PolicyKind::ConsecutiveCap,
        PolicyKind::SelectedToday,
    ]
}

fn default_max_consecutive_picks() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            database: None,
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            secret: None,
            outages: OutageConfig::default(),
            recency: RecencyConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl Default for OutageConfig {
    fn default() -> Self {
        Self {
            lead_days: default_lead_days(),
            max_days: default_max_days(),
        }
    }
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            decay: RecencyDecay::default(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            order: default_policy_order(),
            max_consecutive_picks: default_max_consecutive_picks(),
        }
    }
}

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Could not determine data directory")]
    NoDataDir,
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err.to_string())
    }
}

impl Config {
    /// Parse and validate config from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), timezone = %config.timezone, "Loaded config");
        Ok(config)
    }

    /// Load from `AOTD_CONFIG` or the default path, falling back to defaults
    /// when no file exists there
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Config path: `AOTD_CONFIG` if set, else the data directory
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Database path: configured, else `aotd.db` in the data directory
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DATABASE_FILE)),
        }
    }

    /// Parse the configured timezone
    pub fn parse_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Reject values the evaluator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_timezone()?;

        match self.recency.decay {
            RecencyDecay::Factor { value } if !(value > 0.0 && value <= 1.0) => {
                return Err(ConfigError::Invalid(format!(
                    "recency factor must be in (0, 1], got {value}"
                )));
            }
            RecencyDecay::Linear { floor } if !(floor > 0.0 && floor <= 1.0) => {
                return Err(ConfigError::Invalid(format!(
                    "recency floor must be in (0, 1], got {floor}"
                )));
            }
            _ => {}
        }

        for (i, kind) in self.policy.order.iter().enumerate() {
            if self.policy.order[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!(
                    "policy '{}' listed twice",
                    kind.as_str()
                )));
            }
        }

        if self.outages.max_days == 0 {
            return Err(ConfigError::Invalid("outages.max_days must be positive".into()));
        }

        Ok(())
    }
}

/// Platform data directory, created on demand
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("dev", "onyx", "aotd").ok_or(ConfigError::NoDataDir)?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.timezone, "America/Chicago");
        assert_eq!(config.listen_port, 7341);
        assert!(config.listen_addr.is_loopback());
        assert_eq!(Config::default().listen_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.outages.lead_days, 3);
        assert_eq!(config.outages.max_days, 90);
        assert_eq!(config.recency.window_days, 14);
        assert_eq!(config.recency.decay, RecencyDecay::Halve);
        assert_eq!(config.policy.order.len(), 3);
        assert_eq!(config.policy.max_consecutive_picks, 1);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
timezone = "Europe/London"
database = "/tmp/aotd-test.db"
listen_addr = "0.0.0.0"
listen_port = 9000
secret = "hunter2"

[outages]
lead_days = 5

[recency]
window_days = 7
decay = { kind = "factor", value = 0.25 }

[policy]
order = ["consecutive_cap", "outage"]
max_consecutive_picks = 2
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.parse_timezone().unwrap().name(), "Europe/London");
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.listen_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.secret.as_deref(), Some("hunter2"));
        assert_eq!(config.outages.lead_days, 5);
        assert_eq!(config.outages.max_days, 90);
        assert_eq!(config.recency.decay, RecencyDecay::Factor { value: 0.25 });
        assert_eq!(
            config.policy.order,
            vec![PolicyKind::ConsecutiveCap, PolicyKind::Outage]
        );
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/aotd-test.db")
        );
    }

    #[test]
    fn test_listen_addr_parsing() {
        let config = Config::from_toml(r#"listen_addr = "::1""#).unwrap();
        assert!(config.listen_addr.is_loopback());

        let err = Config::from_toml(r#"listen_addr = "localhost""#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let err = Config::from_toml(r#"timezone = "Mars/Olympus""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone(tz) if tz == "Mars/Olympus"));
    }

    #[test]
    fn test_bad_decay_rejected() {
        let toml = r#"
[recency]
decay = { kind = "factor", value = 1.5 }
"#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_duplicate_policy_rejected() {
        let toml = r#"
[policy]
order = ["outage", "outage"]
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let toml = r#"
[policy]
order = ["vibes"]
"#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "listen_port = 8123\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.listen_port, 8123);
    }
}
