//! Shared test helpers: an in-memory directory.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use roster_core::{
    AttributeBag, DirectoryClient, DirectorySession, EntryStream, RawValue, RosterError,
    RosterResult,
};

/// Directory double serving a fixed list of records.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: Vec<AttributeBag>,
    unreachable: bool,
    /// Drop the connection after yielding this many results.
    fail_after: Option<usize>,
    /// Reject every search request.
    failing_search: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MemoryDirectory {
    pub fn new(entries: Vec<AttributeBag>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for MemoryDirectory {
    async fn open(&self, domain: &str) -> RosterResult<Box<dyn DirectorySession>> {
        if self.unreachable {
            return Err(RosterError::server_unreachable(domain, "refused"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            domain: domain.to_string(),
            entries: self.entries.clone(),
            fail_after: self.fail_after,
            failing_search: self.failing_search,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct MemorySession {
    domain: String,
    entries: Vec<AttributeBag>,
    fail_after: Option<usize>,
    failing_search: bool,
    closed: Arc<AtomicUsize>,
}

impl MemorySession {
    fn check_search(&self, filter: &str) -> RosterResult<()> {
        if self.failing_search {
            return Err(RosterError::search_failed(filter, "size limit exceeded"));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectorySession for MemorySession {
    async fn search(
        &mut self,
        filter: &str,
        _attributes: &[&str],
    ) -> RosterResult<Box<dyn EntryStream>> {
        self.check_search(filter)?;
        Ok(Box::new(MemoryStream {
            domain: self.domain.clone(),
            pending: self.entries.clone().into(),
            remaining_before_failure: self.fail_after,
        }))
    }

    async fn search_one(
        &mut self,
        filter: &str,
        _attributes: &[&str],
    ) -> RosterResult<Option<AttributeBag>> {
        self.check_search(filter)?;
        Ok(self
            .entries
            .iter()
            .find(|bag| {
                bag.first_string("sAMAccountName")
                    .is_some_and(|name| filter.contains(&format!("(sAMAccountName={name})")))
            })
            .cloned())
    }

    async fn close(&mut self) -> RosterResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MemoryStream {
    domain: String,
    pending: VecDeque<AttributeBag>,
    remaining_before_failure: Option<usize>,
}

#[async_trait]
impl EntryStream for MemoryStream {
    async fn next_entry(&mut self) -> RosterResult<Option<AttributeBag>> {
        if let Some(remaining) = self.remaining_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(RosterError::server_unreachable(
                    self.domain.clone(),
                    "connection reset by peer",
                ));
            }
            *remaining -= 1;
        }
        Ok(self.pending.pop_front())
    }
}

/// A typical enabled account.
pub fn user(logon_name: &str, uac: i64, dn: &str) -> AttributeBag {
    AttributeBag::new()
        .with(
            "objectGUID",
            RawValue::Binary(logon_name.as_bytes().to_vec()),
        )
        .with("distinguishedName", dn)
        .with("sAMAccountName", logon_name)
        .with("userAccountControl", uac)
}

/// An account with every timestamp and two groups.
pub fn full_user(logon_name: &str) -> AttributeBag {
    let mut bag = user(
        logon_name,
        0x200,
        &format!("CN={logon_name},OU=Users,DC=example,DC=com"),
    )
    .with("mail", format!("{logon_name}@example.com"))
    .with(
        "whenCreated",
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
    )
    .with(
        "whenChanged",
        Utc.with_ymd_and_hms(2024, 6, 20, 15, 30, 45).unwrap(),
    )
    .with(
        "lastLogon",
        RawValue::LargeInteger {
            high: 30_267_983,
            low: -1_395_851_264,
        },
    )
    .with("lastLogoff", RawValue::large_integer(0))
    .with("accountExpires", RawValue::large_integer(i64::MAX));
    bag.push("memberOf", "CN=Everyone,OU=Groups,DC=example,DC=com");
    bag.push("memberOf", "CN=Engineering,OU=Groups,DC=example,DC=com");
    bag
}
