//! Runtime settings for the coordination service.
//!
//! Everything is read from `PAJ_*` variables; a `.env` file in the working directory is loaded
//! first when present. The eligibility rule table can be replaced per deployment through two
//! comma-separated lists, validated the same way as a table built in code.

use std::env;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr};

use crate::workflows::diversion::{EligibilityRules, RuleTableError};

pub const ENV_VAR: &str = "PAJ_ENV";
pub const HOST_VAR: &str = "PAJ_HOST";
pub const PORT_VAR: &str = "PAJ_PORT";
pub const LOG_LEVEL_VAR: &str = "PAJ_LOG_LEVEL";
pub const ABSOLUTE_EXCLUSIONS_VAR: &str = "PAJ_ABSOLUTE_EXCLUSIONS";
pub const SUMMARY_ELIGIBLE_EXCEPTIONS_VAR: &str = "PAJ_SUMMARY_ELIGIBLE_EXCEPTIONS";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("prod" | "production") => Self::Production,
            Some("test" | "ci") => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub program: ProgramConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Program rules the service evaluates candidates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    pub rules: EligibilityRules,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PAJ_PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),
    #[error("PAJ_HOST must be localhost or an IPv4/IPv6 address")]
    InvalidHost(#[source] AddrParseError),
    #[error("invalid eligibility rule table: {0}")]
    RuleTable(#[from] RuleTableError),
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match read(PORT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment: AppEnvironment::parse(read(ENV_VAR).as_deref()),
            server: ServerConfig {
                host: read(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            },
            telemetry: TelemetryConfig {
                log_level: read(LOG_LEVEL_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            },
            program: ProgramConfig {
                rules: rule_table(
                    read(ABSOLUTE_EXCLUSIONS_VAR),
                    read(SUMMARY_ELIGIBLE_EXCEPTIONS_VAR),
                )?,
            },
        })
    }
}

/// Either list may be overridden alone; the other keeps its standard entries.
fn rule_table(
    absolute: Option<String>,
    summary_eligible: Option<String>,
) -> Result<EligibilityRules, ConfigError> {
    let standard = EligibilityRules::standard();
    if absolute.is_none() && summary_eligible.is_none() {
        return Ok(standard);
    }

    let absolute = absolute
        .map(|raw| parse_list(&raw))
        .unwrap_or_else(|| standard.absolute_exclusions().to_vec());
    let summary_eligible = summary_eligible
        .map(|raw| parse_list(&raw))
        .unwrap_or_else(|| standard.summary_eligible_exceptions().to_vec());

    Ok(EligibilityRules::new(absolute, summary_eligible)?)
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host.parse().map_err(ConfigError::InvalidHost)?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
