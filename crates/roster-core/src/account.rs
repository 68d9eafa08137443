//! Account records
//!
//! A decoded view of one directory principal, built transiently from a
//! search result and dropped once it has been reported.

use chrono::{DateTime, Utc};
use tracing::error;

use crate::account_control::evaluate_status;
use crate::attribute::AttributeBag;
use crate::error::{RosterError, RosterResult};
use crate::groups::groups_of;
use crate::timestamp::{resolve, TimeSource};

/// Attribute holding the short logon name.
pub const LOGON_NAME_ATTRIBUTE: &str = "sAMAccountName";

/// Read the short logon name of a record.
///
/// `Ok(None)` when absent, `DecodeFault` when present but not text.
pub fn logon_name(bag: &AttributeBag) -> RosterResult<Option<&str>> {
    if !bag.has_attribute(LOGON_NAME_ATTRIBUTE) {
        return Ok(None);
    }
    let value = bag.raw_value(LOGON_NAME_ATTRIBUTE)?;
    value.as_string().map(Some).ok_or_else(|| {
        RosterError::decode_fault(
            LOGON_NAME_ATTRIBUTE,
            "string",
            format!("found {}", value.kind()),
        )
    })
}

/// Decoded view over one account's attribute bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub display_id: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub changed_at: Option<DateTime<Utc>>,
    pub last_logon_at: Option<DateTime<Utc>>,
    pub last_logoff_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub groups: Vec<String>,
}

impl AccountRecord {
    /// Decode every derived field of a record.
    ///
    /// Fails on a logon name that is not text, a timestamp decode fault
    /// outside `accountExpires`, or a malformed group DN. Each fault is
    /// logged with the record's logon name before it is returned.
    pub fn from_bag(bag: &AttributeBag) -> RosterResult<Self> {
        let display_id = logon_name(bag)
            .inspect_err(|e| {
                error!(error = %e, "Logon name could not be decoded");
            })?
            .map(str::to_string);
        let key = display_id.as_deref().unwrap_or("<no logon name>");

        let mut instants = [None; 5];
        for (slot, source) in instants.iter_mut().zip(TimeSource::ALL) {
            *slot = resolve(bag, source).inspect_err(|e| {
                error!(
                    logon_name = %key,
                    attribute = %source,
                    error = %e,
                    "Timestamp decode fault is fatal"
                );
            })?;
        }
        let [created_at, changed_at, last_logon_at, last_logoff_at, expires_at] = instants;

        let groups = groups_of(bag).inspect_err(|e| {
            error!(logon_name = %key, error = %e, "Group listing failed");
        })?;

        Ok(Self {
            display_id,
            active: evaluate_status(bag),
            created_at,
            changed_at,
            last_logon_at,
            last_logoff_at,
            expires_at,
            groups,
        })
    }

    /// The instant recorded for a timestamp table entry.
    pub fn timestamp(&self, source: TimeSource) -> Option<DateTime<Utc>> {
        match source {
            TimeSource::WhenCreated => self.created_at,
            TimeSource::WhenChanged => self.changed_at,
            TimeSource::LastLogon => self.last_logon_at,
            TimeSource::LastLogoff => self.last_logoff_at,
            TimeSource::AccountExpires => self.expires_at,
        }
    }
}
