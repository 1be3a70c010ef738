//! Global staybook configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{StaybookError, StaybookResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/staybook";
static DEFAULT_BIND: &str = "127.0.0.1:4100";
static ENV_PREFIX: &str = "STAYBOOK";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Configuration at ~/.config/staybook/config.toml, overridable with
/// `STAYBOOK__<SECTION>__<KEY>` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaybookConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub availability: AvailabilityConfig,

    #[serde(default)]
    pub booking: BookingConfig,

    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Bearer token for admin endpoints. Admin endpoints reject every
    /// request while this is unset.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Shared secret expected in `X-Webhook-Secret` on payment webhooks.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            admin_token: None,
            webhook_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// How often the server refetches every property's iCal feeds.
    #[serde(default = "default_refresh_interval", with = "humantime_duration")]
    pub refresh_interval: Duration,

    #[serde(default = "default_fetch_timeout", with = "humantime_duration")]
    pub fetch_timeout: Duration,
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(20)
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        AvailabilityConfig {
            refresh_interval: default_refresh_interval(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// How long an unpaid booking keeps its nights before it is cancelled.
    #[serde(default = "default_hold_ttl", with = "humantime_duration")]
    pub hold_ttl: Duration,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Cleaning fee used for properties that don't set one (minor units).
    #[serde(default)]
    pub default_cleaning_fee: i64,
}

fn default_hold_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_currency() -> String {
    "jpy".to_string()
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            hold_ttl: default_hold_ttl(),
            currency: default_currency(),
            default_cleaning_fee: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Base URL that payment links are built on.
    #[serde(default = "default_payments_base_url")]
    pub base_url: String,
}

fn default_payments_base_url() -> String {
    format!("http://{DEFAULT_BIND}")
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        PaymentsConfig {
            base_url: default_payments_base_url(),
        }
    }
}

impl Default for StaybookConfig {
    fn default() -> Self {
        StaybookConfig {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            availability: AvailabilityConfig::default(),
            booking: BookingConfig::default(),
            payments: PaymentsConfig::default(),
        }
    }
}

impl StaybookConfig {
    pub fn config_path() -> StaybookResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StaybookError::Config("Could not determine config directory".into()))?
            .join("staybook");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented default file
    /// first if none exists.
    pub fn load() -> StaybookResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> StaybookResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| StaybookError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| StaybookError::Config(e.to_string()))
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> StaybookResult<()> {
        let contents = format!(
            "\
# staybook configuration

# Where documents (properties, bookings, invoices, ...) are stored:
# data_dir = \"{DEFAULT_DATA_DIR}\"

[server]
# bind = \"{DEFAULT_BIND}\"
# admin_token = \"change-me\"
# webhook_secret = \"change-me-too\"

[availability]
# refresh_interval = \"6h\"
# fetch_timeout = \"20s\"

[booking]
# hold_ttl = \"30m\"
# currency = \"jpy\"
# default_cleaning_fee = 0

[payments]
# base_url = \"http://{DEFAULT_BIND}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StaybookError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| StaybookError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        StaybookConfig::create_default_config(&path).unwrap();

        let config = StaybookConfig::load_from(&path).unwrap();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.booking.hold_ttl, Duration::from_secs(1800));
        assert_eq!(config.availability.fetch_timeout, Duration::from_secs(20));
        assert!(config.server.admin_token.is_none());
    }

    #[test]
    fn durations_use_humantime_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/staybook\"\n\n[availability]\nrefresh_interval = \"15m\"\n\n[booking]\nhold_ttl = \"2h\"\ncurrency = \"eur\"\n",
        )
        .unwrap();

        let config = StaybookConfig::load_from(&path).unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/srv/staybook"));
        assert_eq!(config.availability.refresh_interval, Duration::from_secs(900));
        assert_eq!(config.booking.hold_ttl, Duration::from_secs(7200));
        assert_eq!(config.booking.currency, "eur");
    }

    #[test]
    fn bad_duration_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[booking]\nhold_ttl = \"soon\"\n").unwrap();

        let err = StaybookConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, StaybookError::Config(_)));
    }
}
