//! Directory client traits
//!
//! The reporters only need three things from a directory: open a bound
//! session, stream the results of a search, and fetch at most one exact
//! match. Transport, bind and paging live behind these traits.

use async_trait::async_trait;
use tracing::warn;

use crate::attribute::AttributeBag;
use crate::error::RosterResult;

/// Factory for directory sessions.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Connect and bind to the directory serving `domain`.
    ///
    /// Fails with `ServerUnreachable` when the server cannot be reached or
    /// refuses the bind.
    async fn open(&self, domain: &str) -> RosterResult<Box<dyn DirectorySession>>;
}

/// A bound connection to the directory.
#[async_trait]
pub trait DirectorySession: Send {
    /// Start a subtree search below the domain root, fetching `attributes`
    /// (`"*"` for all user attributes).
    ///
    /// Results are produced lazily and can be walked once.
    async fn search(
        &mut self,
        filter: &str,
        attributes: &[&str],
    ) -> RosterResult<Box<dyn EntryStream>>;

    /// Run a search expected to match at most one record.
    async fn search_one(
        &mut self,
        filter: &str,
        attributes: &[&str],
    ) -> RosterResult<Option<AttributeBag>>;

    /// Unbind and release the connection.
    async fn close(&mut self) -> RosterResult<()>;
}

/// Forward-only sequence of search results.
#[async_trait]
pub trait EntryStream: Send {
    /// Next result, or `None` once the search is exhausted.
    async fn next_entry(&mut self) -> RosterResult<Option<AttributeBag>>;
}

/// Close a session, logging instead of failing.
///
/// Called on every exit path of an operation so the operation's own outcome
/// is never replaced by a close error.
pub async fn release(mut session: Box<dyn DirectorySession>) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "Error while closing directory session");
    }
}

/// Search filters and attribute lists used by the reporters.
pub mod filter {
    /// Attributes needed to summarize an account during enumeration.
    pub const SUMMARY_ATTRIBUTES: [&str; 4] = [
        "sAMAccountName",
        "objectGUID",
        "userAccountControl",
        "distinguishedName",
    ];

    /// Every user attribute.
    pub const ALL_ATTRIBUTES: [&str; 1] = ["*"];

    /// Every user principal.
    pub const ALL_ACCOUNTS: &str = "(&(objectCategory=person)(objectClass=user))";

    /// Exact match on the short logon name.
    pub fn exact_account(logon_name: &str) -> String {
        format!(
            "(&(objectCategory=person)(objectClass=user)(sAMAccountName={}))",
            escape_value(logon_name)
        )
    }

    /// Escape special characters in LDAP filter values (RFC 4515).
    pub fn escape_value(value: &str) -> String {
        value
            .replace('\\', "\\5c")
            .replace('*', "\\2a")
            .replace('(', "\\28")
            .replace(')', "\\29")
            .replace('\0', "\\00")
    }
}
