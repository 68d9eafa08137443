//! # Roster LDAP
//!
//! Active Directory access over LDAP for `roster-core`.
//!
//! [`LdapDirectory`] binds with the configured credentials, roots every
//! search at the domain's base DN and pages through large result sets.
//! Attribute values are typed on the way in: generalized time becomes a
//! timestamp, 64-bit tick counts become split large integers and
//! `userAccountControl` becomes an integer.
//!
//! ## Example
//!
//! ```ignore
//! use roster_ldap::{LdapConfig, LdapDirectory};
//!
//! let config = LdapConfig::new("dc01.corp.example.com")
//!     .with_credentials("svc-roster@corp.example.com", "secret");
//! let directory = LdapDirectory::new(config)?;
//! let session = directory.open("corp.example.com").await?;
//! ```

pub mod config;
pub mod connector;

pub use config::{domain_to_base_dn, LdapConfig};
pub use connector::{entry_to_bag, LdapDirectory};
