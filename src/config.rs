// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup (after
//! loading `.env` if present) into immutable values that are passed to the
//! components that need them. Nothing reads the environment after that.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Token issuer domain (e.g. `tenant.us.auth0.com`) | Required |
//! | `API_AUDIENCE` | Expected JWT audience claim | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory of the redb drinks database | In-memory store |
//! | `JWKS_CACHE_TTL_SECS` | How long a fetched JWKS is trusted | `300` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | JWKS HTTP timeout | `10` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerated on `exp` | `0` |
//! | `SEED_SAMPLE_DRINK` | Add the sample drink to an empty store | `false` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve HTTPS with these PEM files | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::jwks::{DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_MIN_REFRESH_INTERVAL};

/// Environment variable name for the issuer domain.
pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
/// Environment variable name for the expected audience.
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Environment variable name for the drinks database directory.
///
/// When unset the service keeps drinks in memory only.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const SEED_SAMPLE_DRINK_ENV: &str = "SEED_SAMPLE_DRINK";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// File name of the drinks database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "drinks.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// Token verification settings, read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Where the issuer publishes its signing keys
    pub jwks_url: Url,
    /// Seconds of clock skew tolerated on `exp`
    pub leeway: u64,
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh_interval: Duration,
    pub jwks_fetch_timeout: Duration,
}

impl AuthConfig {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, jwks_url: Url) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            jwks_url,
            leeway: 0,
            jwks_cache_ttl: DEFAULT_CACHE_TTL,
            jwks_min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            jwks_fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Settings for an Auth0-style tenant: issuer `https://{domain}/` and
    /// keys at `https://{domain}/.well-known/jwks.json`.
    pub fn for_domain(domain: &str, audience: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        if domain.is_empty() {
            return Err(ConfigError::Missing(AUTH0_DOMAIN_ENV));
        }

        let jwks_url = Url::parse(&format!("https://{domain}/.well-known/jwks.json")).map_err(|e| {
            ConfigError::Invalid {
                name: AUTH0_DOMAIN_ENV,
                value: domain.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self::new(format!("https://{domain}/"), audience, jwks_url))
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    pub fn with_jwks_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.jwks_min_refresh_interval = interval;
        self
    }

    pub fn with_jwks_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_fetch_timeout = timeout;
        self
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub bind_addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub seed_sample_drink: bool,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let domain = var(AUTH0_DOMAIN_ENV).ok_or(ConfigError::Missing(AUTH0_DOMAIN_ENV))?;
        let audience = var(API_AUDIENCE_ENV).ok_or(ConfigError::Missing(API_AUDIENCE_ENV))?;

        let auth = AuthConfig::for_domain(&domain, audience)?
            .with_leeway(parse_or(var(JWT_LEEWAY_ENV), JWT_LEEWAY_ENV, 0)?)
            .with_jwks_cache_ttl(Duration::from_secs(parse_or(
                var(JWKS_CACHE_TTL_ENV),
                JWKS_CACHE_TTL_ENV,
                DEFAULT_CACHE_TTL.as_secs(),
            )?))
            .with_jwks_fetch_timeout(Duration::from_secs(parse_or(
                var(JWKS_FETCH_TIMEOUT_ENV),
                JWKS_FETCH_TIMEOUT_ENV,
                DEFAULT_FETCH_TIMEOUT.as_secs(),
            )?));

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
                reason: e.to_string(),
            })?;

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(format) if format == "pretty" => LogFormat::Pretty,
            Some(format) if format == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other,
                    reason: "expected `json` or `pretty`".into(),
                })
            }
        };

        Ok(Self {
            auth,
            bind_addr,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            seed_sample_drink: parse_flag(var(SEED_SAMPLE_DRINK_ENV), SEED_SAMPLE_DRINK_ENV)?,
            tls,
            log_format,
        })
    }

    /// Path of the drinks database, when persistence is enabled.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn parse_flag(value: Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}
