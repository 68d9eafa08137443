//! Detail reporter
//!
//! Looks up a single account by logon name and decodes its full attribute
//! set: plain attributes, computed status, the five timestamps and the short
//! names of its groups.

use tracing::{error, info, instrument};

use crate::account::AccountRecord;
use crate::account_control::{UserAccountControl, CONTROL_ATTRIBUTE};
use crate::attribute::{AttributeBag, RawValue};
use crate::directory::{filter, release, DirectoryClient};
use crate::error::RosterResult;
use crate::groups::MEMBERSHIP_ATTRIBUTE;
use crate::timestamp::{format_instant, TimeSource};

/// Separator between the values of a multi-valued attribute.
const VALUE_SEPARATOR: &str = "; ";

/// Decoded attribute dump for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailReport {
    pub logon_name: String,
    /// Plain attributes in directory order, values already rendered.
    pub attributes: Vec<(String, String)>,
    pub record: AccountRecord,
}

impl DetailReport {
    /// Decode a record found for `logon_name`.
    pub fn from_bag(logon_name: &str, bag: &AttributeBag) -> RosterResult<Self> {
        let record = AccountRecord::from_bag(bag)?;

        let attributes = bag
            .iter()
            .filter(|(name, _)| {
                TimeSource::from_attribute(name).is_none()
                    && !name.eq_ignore_ascii_case(MEMBERSHIP_ATTRIBUTE)
            })
            .map(|(name, values)| (name.to_string(), render_values(name, values)))
            .collect();

        Ok(Self {
            logon_name: logon_name.to_string(),
            attributes,
            record,
        })
    }

    /// Output lines in reporting order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (name, value) in &self.attributes {
            lines.push(format!("{name} = {value}"));
        }

        lines.push(format!("active = {}", self.record.active));

        for source in TimeSource::ALL {
            match self.record.timestamp(source) {
                Some(instant) => lines.push(format!("{source} = {}", format_instant(&instant))),
                None => lines.push(format!("{source} not set")),
            }
        }

        lines.push(format!("{MEMBERSHIP_ATTRIBUTE}:"));
        lines.extend(self.record.groups.iter().cloned());
        lines
    }
}

/// Render the values of one attribute.
///
/// A single control value is shown with its flag names when it fits in 32
/// bits; anything else is shown as stored.
fn render_values(name: &str, values: &[RawValue]) -> String {
    if name.eq_ignore_ascii_case(CONTROL_ATTRIBUTE) {
        if let [value] = values {
            if let Some(uac) = value.as_integer().and_then(UserAccountControl::from_raw) {
                return uac.to_string();
            }
        }
    }

    values
        .iter()
        .map(RawValue::to_string)
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

/// Result of a detail query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    /// No account matched; a valid, empty result.
    NotFound { logon_name: String },
    Found(DetailReport),
}

impl DetailOutcome {
    pub fn lines(&self) -> Vec<String> {
        match self {
            DetailOutcome::NotFound { logon_name } => {
                vec![format!("No data found for {logon_name}")]
            }
            DetailOutcome::Found(report) => report.lines(),
        }
    }
}

/// Fetch and decode the account named `logon_name` in `domain`.
///
/// Connectivity failures are not recovered here; they propagate together
/// with timestamp decode faults and malformed group DNs.
#[instrument(skip(client))]
pub async fn describe_account(
    client: &dyn DirectoryClient,
    domain: &str,
    logon_name: &str,
) -> RosterResult<DetailOutcome> {
    let mut session = client.open(domain).await.inspect_err(|e| {
        error!(
            domain = %domain,
            logon_name = %logon_name,
            error = %e,
            "Detail query could not reach the directory"
        );
    })?;

    let found = session
        .search_one(&filter::exact_account(logon_name), &filter::ALL_ATTRIBUTES)
        .await
        .inspect_err(|e| {
            error!(logon_name = %logon_name, error = %e, "Detail search failed");
        });
    release(session).await;

    let Some(bag) = found? else {
        info!(logon_name = %logon_name, "No account matched");
        return Ok(DetailOutcome::NotFound {
            logon_name: logon_name.to_string(),
        });
    };

    DetailReport::from_bag(logon_name, &bag).map(DetailOutcome::Found)
}
