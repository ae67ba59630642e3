//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;

use minibill_auth::{SigningSecret, TokenConfig};
use minibill_billing::BillingConfig;
use minibill_observability::LogFormat;

/// Deployment mode. Only development enables the bootstrap identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!("unknown mode '{other}' (expected production or development)")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub bind_addr: SocketAddr,
    pub jwt_secret: SigningSecret,
    /// Set when no secret was configured and one was generated for this run.
    pub ephemeral_secret: bool,
    pub token_ttl: Duration,
    pub bootstrap_token_ttl: Duration,
    pub billing: BillingConfig,
    /// Seeds the `admin` account when present.
    pub admin_password: Option<String>,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

impl AppConfig {
    /// Defaults for everything but the mode and secret.
    pub fn new(mode: Mode, jwt_secret: SigningSecret) -> Self {
        Self {
            mode,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret,
            ephemeral_secret: false,
            token_ttl: Duration::seconds(TokenConfig::DEFAULT_TTL_SECS),
            bootstrap_token_ttl: Duration::seconds(TokenConfig::DEFAULT_BOOTSTRAP_TTL_SECS),
            billing: BillingConfig::default(),
            admin_password: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match get("MINIBILL_MODE") {
            Some(raw) => raw.parse::<Mode>().map_err(|reason| ConfigError::Invalid {
                key: "MINIBILL_MODE",
                reason,
            })?,
            None => Mode::default(),
        };

        let (jwt_secret, ephemeral_secret) = match (get("JWT_SECRET"), mode) {
            (Some(secret), _) => (SigningSecret::new(secret), false),
            (None, Mode::Development) => {
                let random = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
                (SigningSecret::new(random), true)
            }
            (None, Mode::Production) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let token_ttl = positive_secs(&get, "TOKEN_TTL_SECS", TokenConfig::DEFAULT_TTL_SECS)?;
        let bootstrap_token_ttl = positive_secs(
            &get,
            "BOOTSTRAP_TOKEN_TTL_SECS",
            TokenConfig::DEFAULT_BOOTSTRAP_TTL_SECS,
        )?;

        let default_dateline_days = match get("DEFAULT_DATELINE_DAYS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "DEFAULT_DATELINE_DAYS",
                reason: e.to_string(),
            })?,
            None => BillingConfig::DEFAULT_DATELINE_DAYS,
        };

        Ok(Self {
            mode,
            bind_addr,
            jwt_secret,
            ephemeral_secret,
            token_ttl,
            bootstrap_token_ttl,
            billing: BillingConfig { default_dateline_days },
            admin_password: get("MINIBILL_ADMIN_PASSWORD"),
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(self.jwt_secret.clone())
            .with_ttl(self.token_ttl)
            .with_bootstrap_ttl(self.bootstrap_token_ttl)
    }

    pub fn log_format(&self) -> LogFormat {
        match self.mode {
            Mode::Production => LogFormat::Json,
            Mode::Development => LogFormat::Pretty,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret)
            .field("ephemeral_secret", &self.ephemeral_secret)
            .field("token_ttl", &self.token_ttl)
            .field("bootstrap_token_ttl", &self.bootstrap_token_ttl)
            .field("billing", &self.billing)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn positive_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: i64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(Duration::seconds(default));
    };
    match raw.parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::seconds(secs)),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
