// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`ClientConfig`] loader.
//! Values are trimmed; an empty variable counts as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MINEGUARD_API_URL` | Backend service base URL | `http://localhost:3000` |
//! | `MINEGUARD_DATA_DIR` | Root directory for local state | `./mineguard-data` |
//! | `MINEGUARD_HTTP_TIMEOUT_SECS` | Timeout for ordinary calls | `30` |
//! | `MINEGUARD_LEDGER_TIMEOUT_SECS` | Timeout for the on-chain submission | `90` |
//! | `MINEGUARD_SIGNER_KEY` | Hex private key for a local signer | unset |
//! | `MINEGUARD_SIGNER_KEY_PATH` | PEM private key file for a local signer | unset |
//! | `MINEGUARD_REMOTE_SIGNER_URL` | JSON-RPC wallet endpoint | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::storage::paths::DATA_ROOT;

pub const API_URL_ENV: &str = "MINEGUARD_API_URL";
pub const DATA_DIR_ENV: &str = "MINEGUARD_DATA_DIR";
pub const HTTP_TIMEOUT_ENV: &str = "MINEGUARD_HTTP_TIMEOUT_SECS";
pub const LEDGER_TIMEOUT_ENV: &str = "MINEGUARD_LEDGER_TIMEOUT_SECS";
pub const SIGNER_KEY_ENV: &str = "MINEGUARD_SIGNER_KEY";
pub const SIGNER_KEY_PATH_ENV: &str = "MINEGUARD_SIGNER_KEY_PATH";
pub const REMOTE_SIGNER_URL_ENV: &str = "MINEGUARD_REMOTE_SIGNER_URL";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Ledger anchoring waits for a block, so it gets a longer budget.
pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 90;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} must be a positive integer number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },

    #[error("unknown log format {0:?} (expected json or pretty)")]
    InvalidLogFormat(String),
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Where the wallet signing capability comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SignerSource {
    /// Hex private key held in process memory.
    Key(String),
    /// PEM private key on disk.
    KeyPath(PathBuf),
    /// External wallet reachable over JSON-RPC.
    Remote(Url),
    None,
}

// Key material must never reach logs.
impl fmt::Debug for SignerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerSource::Key(_) => f.write_str("Key(<redacted>)"),
            SignerSource::KeyPath(path) => f.debug_tuple("KeyPath").field(path).finish(),
            SignerSource::Remote(url) => f.debug_tuple("Remote").field(&url.as_str()).finish(),
            SignerSource::None => f.write_str("None"),
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Normalized base URL (validated as http/https).
    pub api_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub ledger_timeout: Duration,
    pub signer: SignerSource,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from(DATA_ROOT),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            ledger_timeout: Duration::from_secs(DEFAULT_LEDGER_TIMEOUT_SECS),
            signer: SignerSource::None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = match get(API_URL_ENV) {
            Some(raw) => parse_http_url(API_URL_ENV, &raw)?.to_string(),
            None => DEFAULT_API_URL.to_string(),
        };

        let data_dir = get(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DATA_ROOT));

        let http_timeout = parse_timeout(HTTP_TIMEOUT_ENV, get(HTTP_TIMEOUT_ENV), DEFAULT_HTTP_TIMEOUT_SECS)?;
        let ledger_timeout =
            parse_timeout(LEDGER_TIMEOUT_ENV, get(LEDGER_TIMEOUT_ENV), DEFAULT_LEDGER_TIMEOUT_SECS)?;

        // Precedence: inline key, key file, remote wallet
        let signer = if let Some(key) = get(SIGNER_KEY_ENV) {
            SignerSource::Key(key)
        } else if let Some(path) = get(SIGNER_KEY_PATH_ENV) {
            SignerSource::KeyPath(PathBuf::from(path))
        } else if let Some(raw) = get(REMOTE_SIGNER_URL_ENV) {
            SignerSource::Remote(parse_http_url(REMOTE_SIGNER_URL_ENV, &raw)?)
        } else {
            SignerSource::None
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            api_url,
            data_dir,
            http_timeout,
            ledger_timeout,
            signer,
            log_format,
        })
    }

    /// Join a backend path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            name,
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn parse_timeout(
    name: &'static str,
    raw: Option<String>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default_secs));
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout { name, value: raw }),
    }
}
