//! Enumeration reporter
//!
//! Walks every user principal in the domain and emits one summary line per
//! search result. A bad record never stops the walk; an unreachable server
//! ends it with a single connectivity report.

use tracing::{debug, error, info, instrument, warn};

use crate::account::logon_name;
use crate::account_control::evaluate_status;
use crate::attribute::AttributeBag;
use crate::directory::{filter, release, DirectoryClient, DirectorySession};
use crate::error::{RosterError, RosterResult};

/// Summary of one enumerated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    /// 1-based position in the result stream.
    pub sequence: usize,
    pub logon_name: Option<String>,
    pub active: bool,
}

impl std::fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.sequence,
            self.logon_name.as_deref().unwrap_or("<no logon name>"),
            if self.active { "active" } else { "inactive" }
        )
    }
}

/// One emitted enumeration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationLine {
    Account(AccountSummary),
    /// The result was retrieved but could not be summarized.
    Undecodable { sequence: usize, reason: String },
}

impl EnumerationLine {
    pub fn sequence(&self) -> usize {
        match self {
            EnumerationLine::Account(summary) => summary.sequence,
            EnumerationLine::Undecodable { sequence, .. } => *sequence,
        }
    }
}

impl std::fmt::Display for EnumerationLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumerationLine::Account(summary) => write!(f, "{summary}"),
            EnumerationLine::Undecodable { sequence, reason } => {
                write!(f, "{sequence}: <undecodable: {reason}>")
            }
        }
    }
}

/// Outcome of an enumeration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumerationReport {
    /// Lines emitted, including undecodable ones.
    pub emitted: usize,
    /// Results that could not be summarized.
    pub undecodable: usize,
    /// Set when the directory could not be reached.
    pub connectivity_failure: Option<String>,
}

impl EnumerationReport {
    fn unreachable(err: &RosterError) -> Self {
        Self {
            connectivity_failure: Some(format!("Unable to reach directory server: {err}")),
            ..Default::default()
        }
    }
}

/// Summarize one search result.
fn summarize(sequence: usize, bag: &AttributeBag) -> EnumerationLine {
    match logon_name(bag) {
        Ok(name) => EnumerationLine::Account(AccountSummary {
            sequence,
            logon_name: name.map(str::to_string),
            active: evaluate_status(bag),
        }),
        Err(e) => {
            warn!(sequence, error = %e, "Failed to decode enumerated account");
            EnumerationLine::Undecodable {
                sequence,
                reason: e.to_string(),
            }
        }
    }
}

async fn walk<F>(
    session: &mut dyn DirectorySession,
    report: &mut EnumerationReport,
    emit: &mut F,
) -> RosterResult<()>
where
    F: FnMut(EnumerationLine),
{
    let mut results = session
        .search(filter::ALL_ACCOUNTS, &filter::SUMMARY_ATTRIBUTES)
        .await?;
    let mut sequence = 0;

    while let Some(bag) = results.next_entry().await? {
        sequence += 1;
        let line = summarize(sequence, &bag);
        if matches!(line, EnumerationLine::Undecodable { .. }) {
            report.undecodable += 1;
        }
        report.emitted += 1;
        emit(line);
    }

    debug!(results = sequence, "Enumeration stream exhausted");
    Ok(())
}

/// Enumerate every account of `domain`, passing each line to `emit` as soon
/// as it is produced.
///
/// Connectivity failures are reported in the returned report rather than
/// raised. Any other directory error is returned.
#[instrument(skip(client, emit))]
pub async fn enumerate_accounts<F>(
    client: &dyn DirectoryClient,
    domain: &str,
    mut emit: F,
) -> RosterResult<EnumerationReport>
where
    F: FnMut(EnumerationLine),
{
    let mut session = match client.open(domain).await {
        Ok(session) => session,
        Err(e) if e.is_connectivity() => {
            error!(domain = %domain, error = %e, "Enumeration could not reach the directory");
            return Ok(EnumerationReport::unreachable(&e));
        }
        Err(e) => return Err(e),
    };

    let mut report = EnumerationReport::default();
    let outcome = walk(session.as_mut(), &mut report, &mut emit).await;
    release(session).await;

    match outcome {
        Ok(()) => {
            info!(
                emitted = report.emitted,
                undecodable = report.undecodable,
                "Enumeration completed"
            );
            Ok(report)
        }
        Err(e) if e.is_connectivity() => {
            error!(
                domain = %domain,
                emitted = report.emitted,
                error = %e,
                "Lost the directory during enumeration"
            );
            report.connectivity_failure = EnumerationReport::unreachable(&e).connectivity_failure;
            Ok(report)
        }
        Err(e) => {
            error!(domain = %domain, error = %e, "Enumeration failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::RawValue;

    #[test]
    fn test_summary_display() {
        let summary = AccountSummary {
            sequence: 3,
            logon_name: Some("jdoe".to_string()),
            active: true,
        };
        assert_eq!(summary.to_string(), "3: jdoe active");

        let summary = AccountSummary {
            sequence: 4,
            logon_name: None,
            active: false,
        };
        assert_eq!(summary.to_string(), "4: <no logon name> inactive");
    }

    #[test]
    fn test_summarize_undecodable_name() {
        let bag = AttributeBag::new().with("sAMAccountName", RawValue::Integer(7));
        let line = summarize(2, &bag);
        assert_eq!(line.sequence(), 2);
        assert!(matches!(line, EnumerationLine::Undecodable { .. }));
        assert!(line.to_string().starts_with("2: <undecodable: "));
    }

    #[test]
    fn test_summarize_placeholder_entry_inactive() {
        let bag = AttributeBag::new().with("sAMAccountName", "ghost");
        assert_eq!(
            summarize(1, &bag),
            EnumerationLine::Account(AccountSummary {
                sequence: 1,
                logon_name: Some("ghost".to_string()),
                active: false,
            })
        );
    }
}
