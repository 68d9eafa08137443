//! LDAP directory client
//!
//! Implements the `roster-core` directory traits over `ldap3`.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchStream};
use tracing::{debug, info, instrument, warn};

use roster_core::account_control::CONTROL_ATTRIBUTE;
use roster_core::directory::{DirectoryClient, DirectorySession, EntryStream};
use roster_core::timestamp::{parse_generalized_time, EncodingKind, TimeSource};
use roster_core::{AttributeBag, RawValue, RosterError, RosterResult};

use crate::config::{domain_to_base_dn, LdapConfig};

/// Attribute the entry DN is exposed under.
const DN_ATTRIBUTE: &str = "distinguishedName";

/// LDAP result code for invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

type PagedStream = SearchStream<'static, String, Vec<String>>;

/// Directory client for Active Directory over LDAP.
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    /// Create a client after validating `config`.
    pub fn new(config: LdapConfig) -> RosterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Connect and bind.
    async fn create_connection(&self) -> RosterResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                RosterError::server_unreachable_with_source(&url, "failed to connect", e)
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| {
                RosterError::server_unreachable_with_source(
                    &url,
                    format!("bind failed for '{bind_dn}'"),
                    e,
                )
            })?;

        if result.rc != 0 {
            let message = if result.rc == RC_INVALID_CREDENTIALS {
                format!("invalid credentials for '{bind_dn}'")
            } else {
                format!("bind failed with code {}: {}", result.rc, result.text)
            };
            // Drop the half-open connection before reporting.
            if let Err(e) = ldap.unbind().await {
                debug!(error = %e, "Unbind after failed bind");
            }
            return Err(RosterError::server_unreachable(&url, message));
        }

        info!(host = %self.config.host, "LDAP connection established");

        Ok(ldap)
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn open(&self, domain: &str) -> RosterResult<Box<dyn DirectorySession>> {
        let base_dn = domain_to_base_dn(domain)?;
        let ldap = self.create_connection().await?;
        Ok(Box::new(LdapSession {
            ldap: Some(ldap),
            server: self.config.url(),
            base_dn,
            page_size: self.config.page_size,
        }))
    }
}

/// Bound LDAP connection rooted at the domain's base DN.
pub struct LdapSession {
    /// `None` once closed.
    ldap: Option<Ldap>,
    server: String,
    base_dn: String,
    page_size: i32,
}

impl LdapSession {
    fn ldap(&mut self) -> RosterResult<&mut Ldap> {
        let server = &self.server;
        self.ldap
            .as_mut()
            .ok_or_else(|| RosterError::server_unreachable(server, "session already closed"))
    }
}

/// Classify a protocol error: a server result code is a search failure,
/// anything else means the connection is gone.
fn map_ldap_error(err: LdapError, server: &str, filter: &str) -> RosterError {
    match err {
        LdapError::LdapResult { result } => RosterError::search_failed(
            filter,
            format!("server returned code {}: {}", result.rc, result.text),
        ),
        other => RosterError::server_unreachable_with_source(server, "search interrupted", other),
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        filter: &str,
        attributes: &[&str],
    ) -> RosterResult<Box<dyn EntryStream>> {
        let server = self.server.clone();
        let base_dn = self.base_dn.clone();
        let page_size = self.page_size;
        let attrs: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();

        debug!(base_dn = %base_dn, filter = %filter, page_size, "Starting paged search");

        let adapters: Vec<Box<dyn Adapter<'static, String, Vec<String>>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];

        let stream = self
            .ldap()?
            .streaming_search_with(adapters, &base_dn, Scope::Subtree, filter, attrs)
            .await
            .map_err(|e| map_ldap_error(e, &server, filter))?;

        Ok(Box::new(LdapEntryStream {
            stream,
            server,
            filter: filter.to_string(),
            finished: false,
        }))
    }

    async fn search_one(
        &mut self,
        filter: &str,
        attributes: &[&str],
    ) -> RosterResult<Option<AttributeBag>> {
        let server = self.server.clone();
        let base_dn = self.base_dn.clone();

        debug!(base_dn = %base_dn, filter = %filter, "Searching for a single entry");

        let result = self
            .ldap()?
            .search(&base_dn, Scope::Subtree, filter, attributes.to_vec())
            .await
            .map_err(|e| map_ldap_error(e, &server, filter))?;

        let (entries, _res) = result
            .success()
            .map_err(|e| map_ldap_error(e, &server, filter))?;

        let mut entries = entries
            .into_iter()
            .filter(|entry| !entry.is_ref())
            .map(SearchEntry::construct);

        let first = entries.next();
        let extra = entries.count();
        if extra > 0 {
            warn!(filter = %filter, extra, "Search matched more than one entry; using the first");
        }

        Ok(first.map(entry_to_bag))
    }

    async fn close(&mut self) -> RosterResult<()> {
        if let Some(mut ldap) = self.ldap.take() {
            ldap.unbind().await.map_err(|e| {
                RosterError::server_unreachable_with_source(&self.server, "unbind failed", e)
            })?;
            debug!(server = %self.server, "LDAP session closed");
        }
        Ok(())
    }
}

/// Paged search results, fetched from the server on demand.
pub struct LdapEntryStream {
    stream: PagedStream,
    server: String,
    filter: String,
    finished: bool,
}

#[async_trait]
impl EntryStream for LdapEntryStream {
    async fn next_entry(&mut self) -> RosterResult<Option<AttributeBag>> {
        if self.finished {
            return Ok(None);
        }

        match self.stream.next().await {
            Ok(Some(entry)) => Ok(Some(entry_to_bag(SearchEntry::construct(entry)))),
            Ok(None) => {
                self.finished = true;
                let result = self.stream.finish().await;
                result
                    .success()
                    .map_err(|e| map_ldap_error(e, &self.server, &self.filter))?;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(map_ldap_error(e, &self.server, &self.filter))
            }
        }
    }
}

/// Decode a textual value according to the attribute it belongs to.
///
/// Values that do not parse stay text so the decoders downstream can report
/// them.
fn decode_value(name: &str, value: String) -> RawValue {
    if let Some(source) = TimeSource::from_attribute(name) {
        let decoded = match source.encoding() {
            EncodingKind::CalendarValue => parse_generalized_time(&value).map(RawValue::Timestamp),
            EncodingKind::SplitInteger64 => value.trim().parse().ok().map(RawValue::large_integer),
        };
        return decoded.unwrap_or(RawValue::String(value));
    }

    if name.eq_ignore_ascii_case(CONTROL_ATTRIBUTE) {
        if let Ok(parsed) = value.trim().parse::<i64>() {
            return RawValue::Integer(parsed);
        }
    }

    RawValue::String(value)
}

/// Convert an LDAP search entry to an attribute bag.
pub fn entry_to_bag(entry: SearchEntry) -> AttributeBag {
    let mut bag = AttributeBag::new();

    let has_dn_attribute = entry
        .attrs
        .keys()
        .any(|name| name.eq_ignore_ascii_case(DN_ATTRIBUTE));
    if !has_dn_attribute && !entry.dn.is_empty() {
        bag.set(DN_ATTRIBUTE, entry.dn);
    }

    for (name, values) in entry.attrs {
        let values: Vec<RawValue> = values
            .into_iter()
            .map(|value| decode_value(&name, value))
            .collect();
        bag.set_values(name, values);
    }

    for (name, values) in entry.bin_attrs {
        bag.set_values(name, values.into_iter().map(RawValue::Binary).collect());
    }

    bag
}
