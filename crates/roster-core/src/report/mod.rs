//! Reporters invoked by the command line.

pub mod detail;
pub mod enumerate;

pub use detail::{describe_account, DetailOutcome, DetailReport};
pub use enumerate::{enumerate_accounts, AccountSummary, EnumerationLine, EnumerationReport};
