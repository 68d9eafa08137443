//! Environment configuration

use roster_ldap::config::{DEFAULT_LDAPS_PORT, DEFAULT_LDAP_PORT};
use roster_ldap::LdapConfig;

/// Configuration for one roster run.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// DNS domain to report on; also determines the search base.
    pub domain: String,

    /// Connection settings for the domain controller.
    pub ldap: LdapConfig,
}

impl RosterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Tests supply variables this way without touching the process
    /// environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let domain = reader("ROSTER_DOMAIN")
            .map(|d| d.trim().to_string())
            .ok()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("ROSTER_DOMAIN".into()))?;

        let host = reader("ROSTER_LDAP_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| domain.clone());

        let use_ssl = parse_flag(&reader, "ROSTER_LDAP_SSL")?;
        let use_starttls = parse_flag(&reader, "ROSTER_LDAP_STARTTLS")?;

        let default_port = if use_ssl {
            DEFAULT_LDAPS_PORT
        } else {
            DEFAULT_LDAP_PORT
        };
        let port = parse_or(&reader, "ROSTER_LDAP_PORT", default_port)?;

        let mut ldap = LdapConfig::new(host);
        ldap.port = port;
        ldap.use_ssl = use_ssl;
        ldap.use_starttls = use_starttls;
        ldap.bind_dn = reader("ROSTER_BIND_DN").unwrap_or_default();
        ldap.bind_password = reader("ROSTER_BIND_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());
        ldap.page_size = parse_or(&reader, "ROSTER_PAGE_SIZE", ldap.page_size)?;
        ldap.connection_timeout_secs = parse_or(
            &reader,
            "ROSTER_CONNECT_TIMEOUT_SECS",
            ldap.connection_timeout_secs,
        )?;

        ldap.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self { domain, ldap })
    }
}

fn parse_or<F, T>(reader: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match reader(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_flag<F>(reader: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(raw) = reader(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(ConfigError::InvalidValue(
            key.into(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("{0}")]
    Invalid(String),
}
