//! LDAP connection configuration

use roster_core::{RosterError, RosterResult};

/// Configuration for connecting to an Active Directory domain controller.
#[derive(Clone)]
pub struct LdapConfig {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port (389 for LDAP, 636 for LDAPS).
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    pub use_starttls: bool,

    /// Bind DN or UPN; empty for an anonymous bind.
    pub bind_dn: String,

    /// Bind password.
    pub bind_password: Option<String>,

    /// Page size for the full enumeration.
    pub page_size: i32,

    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("page_size", &self.page_size)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

pub const DEFAULT_LDAP_PORT: u16 = 389;
pub const DEFAULT_LDAPS_PORT: u16 = 636;
pub const DEFAULT_PAGE_SIZE: i32 = 500;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

impl LdapConfig {
    /// Create a config for an anonymous plain-LDAP connection to `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_LDAP_PORT,
            use_ssl: false,
            use_starttls: false,
            bind_dn: String::new(),
            bind_password: None,
            page_size: DEFAULT_PAGE_SIZE,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }

    /// Set bind credentials.
    pub fn with_credentials(
        mut self,
        bind_dn: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.bind_dn = bind_dn.into();
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = DEFAULT_LDAPS_PORT;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Server URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RosterResult<()> {
        if self.host.trim().is_empty() {
            return Err(RosterError::invalid_configuration("host is required"));
        }
        if self.port == 0 {
            return Err(RosterError::invalid_configuration("port must be non-zero"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(RosterError::invalid_configuration(
                "use either SSL or STARTTLS, not both",
            ));
        }
        if self.page_size <= 0 {
            return Err(RosterError::invalid_configuration(
                "page size must be positive",
            ));
        }
        if self.bind_password.is_some() && self.bind_dn.is_empty() {
            return Err(RosterError::invalid_configuration(
                "bind password given without a bind DN",
            ));
        }
        Ok(())
    }
}

/// Search base for a DNS domain: `corp.example.com` becomes
/// `DC=corp,DC=example,DC=com`.
pub fn domain_to_base_dn(domain: &str) -> RosterResult<String> {
    let labels: Vec<&str> = domain
        .trim()
        .trim_end_matches('.')
        .split('.')
        .collect();
    if labels.iter().any(|label| label.is_empty()) {
        return Err(RosterError::invalid_configuration(format!(
            "invalid domain name '{domain}'"
        )));
    }
    Ok(labels
        .iter()
        .map(|label| format!("DC={label}"))
        .collect::<Vec<_>>()
        .join(","))
}
