use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 8082;
pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("STRIPE_SECRET_KEY is not set")]
    MissingSecret,
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected plain or json)")),
        }
    }
}

/// Gateway API secret. Never printed: `Debug` only reveals the key mode.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Stripe live keys are prefixed `sk_live_` (or `rk_live_` when restricted).
    pub fn is_live(&self) -> bool {
        self.0.starts_with("sk_live_") || self.0.starts_with("rk_live_")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_live() { "live" } else { "test" };
        write!(f, "SecretKey({mode}, ***)")
    }
}

/// Command line flags. They take precedence over the environment and the config file.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "payment-service", about = "HTTP front-end for Stripe charges and refunds")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Optional settings read from the TOML file. The secret is deliberately absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_port: Option<u16>,
    pub gateway_base_url: Option<String>,
    pub gateway_timeout_ms: Option<u64>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub gateway_base_url: Url,
    pub gateway_timeout: Duration,
    pub log_format: LogFormat,
    pub stripe_secret_key: SecretKey,
}

impl Config {
    /// Builds the configuration from the process environment and the CLI flags.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        Self::resolve(cli, |name| env::var(name).ok())
    }

    /// Layers, lowest precedence first: defaults, config file, environment, CLI.
    pub fn resolve<F>(cli: &CliArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match &cli.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        let mut server_port = file.server_port.unwrap_or(DEFAULT_PORT);
        let mut base_url = file
            .gateway_base_url
            .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string());
        let mut timeout_ms = file.gateway_timeout_ms.unwrap_or(DEFAULT_GATEWAY_TIMEOUT_MS);
        let mut log_format = file.log_format.unwrap_or_default();

        if let Some(raw) = non_empty(lookup("PORT")) {
            server_port = parse_value("PORT", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("STRIPE_API_BASE")) {
            base_url = raw;
        }
        if let Some(raw) = non_empty(lookup("GATEWAY_TIMEOUT_MS")) {
            timeout_ms = parse_value("GATEWAY_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("LOG_FORMAT")) {
            log_format = parse_value("LOG_FORMAT", &raw)?;
        }

        if let Some(port) = cli.port {
            server_port = port;
        }
        if let Some(format) = cli.log_format {
            log_format = format;
        }

        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "GATEWAY_TIMEOUT_MS",
                reason: "must be greater than 0".to_string(),
            });
        }

        let gateway_base_url = Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            name: "STRIPE_API_BASE",
            reason: e.to_string(),
        })?;
        if !matches!(gateway_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                name: "STRIPE_API_BASE",
                reason: format!("unsupported scheme `{}`", gateway_base_url.scheme()),
            });
        }

        let stripe_secret_key = non_empty(lookup("STRIPE_SECRET_KEY"))
            .map(SecretKey::new)
            .ok_or(ConfigError::MissingSecret)?;

        Ok(Self {
            server_port,
            gateway_base_url,
            gateway_timeout: Duration::from_millis(timeout_ms),
            log_format,
            stripe_secret_key,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })
}
