//! Group membership extraction
//!
//! Turns `memberOf` distinguished names into short group names by taking the
//! value of the first RDN: `CN=Everyone,OU=Groups,DC=example,DC=com` becomes
//! `Everyone`.

use tracing::{debug, warn};

use crate::attribute::AttributeBag;
use crate::error::{RosterError, RosterResult};

/// Multi-valued attribute listing the groups an account belongs to.
pub const MEMBERSHIP_ATTRIBUTE: &str = "memberOf";

/// Byte index of the first `needle` at char position 1 or later.
fn find_from_second_char(dn: &str, needle: char) -> Option<usize> {
    dn.char_indices()
        .skip(1)
        .find(|(_, c)| *c == needle)
        .map(|(idx, _)| idx)
}

/// Extract short group names from distinguished names, keeping order and
/// duplicates.
///
/// An entry without `=` ends the extraction: the names collected so far are
/// returned and later entries are ignored. An entry whose first `,` is
/// missing or precedes the `=` is a `MalformedDistinguishedName`.
pub fn extract_group_names<S: AsRef<str>>(dns: &[S]) -> RosterResult<Vec<String>> {
    let mut names = Vec::with_capacity(dns.len());

    for dn in dns {
        let dn = dn.as_ref();
        let Some(eq) = find_from_second_char(dn, '=') else {
            debug!(
                dn = %dn,
                collected = names.len(),
                "Stopping group extraction at entry without '='"
            );
            return Ok(names);
        };

        match find_from_second_char(dn, ',') {
            Some(comma) if comma > eq => names.push(dn[eq + 1..comma].to_string()),
            _ => {
                warn!(dn = %dn, "Malformed group distinguished name");
                let dn = dn.to_string();
                return Err(RosterError::MalformedDistinguishedName { dn });
            }
        }
    }

    Ok(names)
}

/// Group names of a record's `memberOf` attribute.
///
/// Non-text values are skipped; an absent attribute yields no groups.
pub fn groups_of(bag: &AttributeBag) -> RosterResult<Vec<String>> {
    let dns: Vec<&str> = bag
        .get(MEMBERSHIP_ATTRIBUTE)
        .unwrap_or(&[])
        .iter()
        .filter_map(|value| value.as_string())
        .collect();
    extract_group_names(&dns)
}
