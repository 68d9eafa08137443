//! # Roster Core
//!
//! Decoding of Active Directory account records.
//!
//! Directory services expose account metadata in several incompatible
//! encodings. This crate normalizes them:
//!
//! - [`attribute`] - case-insensitive attribute bags of raw values
//! - [`timestamp`] - calendar values and split 64-bit tick counts to `DateTime<Utc>`
//! - [`account_control`] - active/inactive status from `userAccountControl` and container path
//! - [`groups`] - short group names from `memberOf` distinguished names
//! - [`report`] - the enumeration and detail reporters
//!
//! The directory itself is reached through the [`directory`] traits, which
//! `roster-ldap` implements over LDAP.
//!
//! ## Example
//!
//! ```ignore
//! use roster_core::report::{describe_account, enumerate_accounts};
//!
//! let report = enumerate_accounts(&client, "corp.example.com", |line| println!("{line}")).await?;
//! let outcome = describe_account(&client, "corp.example.com", "jdoe").await?;
//! for line in outcome.lines() {
//!     println!("{line}");
//! }
//! ```

pub mod account;
pub mod account_control;
pub mod attribute;
pub mod directory;
pub mod error;
pub mod groups;
pub mod report;
pub mod timestamp;

// Re-exports
pub use account::AccountRecord;
pub use account_control::{evaluate_status, UserAccountControl};
pub use attribute::{AttributeBag, RawValue};
pub use directory::{DirectoryClient, DirectorySession, EntryStream};
pub use error::{RosterError, RosterResult};
pub use groups::extract_group_names;
pub use timestamp::{EncodingKind, TimeSource};
