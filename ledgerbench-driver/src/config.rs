//! Configuration for ledgerbench workload drivers.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `LB__`)
//! 2. YAML configuration file
//! 3. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `LB__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `LB__OPERATION__TARGET_ID=testgo` sets the contract to invoke
//! - `LB__GATEWAY__ENDPOINT=http://localhost:8080` sets the gateway URL
//! - `LB__GATEWAY__CHANNEL=mychannel` sets the ledger channel
//!
//! # YAML Configuration File
//!
//! The above configuration in YAML format would look like this:
//!
//! ```yaml
//! operation:
//!   target_id: testgo
//!
//! gateway:
//!   endpoint: http://localhost:8080
//!   channel: mychannel
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "LB__";

/// The operation a driver submits on every invocation.
///
/// Used in: [`Config::operation`]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Operation {
    /// Contract the operation is addressed to.
    ///
    /// # Default
    ///
    /// `"testgo"`
    ///
    /// # Environment Variable
    ///
    /// `LB__OPERATION__TARGET_ID`
    pub target_id: String,

    /// Contract function to invoke.
    ///
    /// # Default
    ///
    /// `"InitLedger"`
    ///
    /// # Environment Variable
    ///
    /// `LB__OPERATION__OPERATION_NAME`
    pub operation_name: String,

    /// Identity the operation is submitted as.
    ///
    /// # Default
    ///
    /// `"Admin@example.com"`
    ///
    /// # Environment Variable
    ///
    /// `LB__OPERATION__INVOKER_IDENTITY`
    pub invoker_identity: String,

    /// Positional arguments passed to the function.
    ///
    /// # Default
    ///
    /// Empty (no arguments)
    pub arguments: Vec<Value>,
}

impl Default for Operation {
    fn default() -> Self {
        Self {
            target_id: "testgo".to_owned(),
            operation_name: "InitLedger".to_owned(),
            invoker_identity: "Admin@example.com".to_owned(),
            arguments: Vec::new(),
        }
    }
}

/// Connection settings for the HTTP target adapter.
///
/// Used in: [`Config::gateway`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Gateway {
    /// Base URL of the ledger's REST gateway.
    ///
    /// # Default
    ///
    /// `"http://localhost:8080"`
    ///
    /// # Environment Variable
    ///
    /// `LB__GATEWAY__ENDPOINT`
    pub endpoint: String,

    /// Channel that transactions are submitted to.
    ///
    /// # Default
    ///
    /// `"mychannel"`
    ///
    /// # Environment Variable
    ///
    /// `LB__GATEWAY__CHANNEL`
    pub channel: String,

    /// Time to wait for the gateway to endorse and submit a transaction.
    ///
    /// # Default
    ///
    /// `15s`
    ///
    /// # Environment Variable
    ///
    /// `LB__GATEWAY__TIMEOUT`
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Gateway {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_owned(),
            channel: "mychannel".to_owned(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Log output format.
///
/// Parsed case-insensitively, so `LB__LOGGING__FORMAT=JSON` selects [`LogFormat::Json`]. An
/// empty value selects [`LogFormat::Auto`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Simplified plain text output.
    Simplified,

    /// Dump out JSON lines.
    Json,
}

impl LogFormat {
    const ALL: [Self; 4] = [Self::Auto, Self::Pretty, Self::Simplified, Self::Json];

    fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pretty => "pretty",
            Self::Simplified => "simplified",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a [`LogFormat`] name is not recognized.
#[derive(Clone, Debug, Error)]
#[error("unknown log format {0:?}, expected one of auto, pretty, simplified or json")]
pub struct FormatParseError(String);

impl std::str::FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::Auto);
        }

        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormatParseError(s.to_owned()))
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
///
/// Logs are always written to stderr.
///
/// Used in: [`Config::logging`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// The `RUST_LOG` environment variable takes precedence if set.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `LB__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format. See [`LogFormat`] for available options.
    ///
    /// # Default
    ///
    /// `Auto`
    ///
    /// # Environment Variable
    ///
    /// `LB__LOGGING__FORMAT`
    #[serde(with = "display_fromstr")]
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Main configuration of a ledgerbench workload driver.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The operation submitted on every invocation.
    pub operation: Operation,

    /// Settings for the HTTP target adapter.
    pub gateway: Gateway,

    /// Logging configuration.
    pub logging: Logging,
}

impl Config {
    /// Loads configuration from an optional YAML file and the environment.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if `path` is given)
    /// 3. Environment variables (prefixed with `LB__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}
