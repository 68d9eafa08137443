//! Account status evaluation
//!
//! An account is active when it has an identity, carries a
//! `userAccountControl` value without the ACCOUNTDISABLE bit, and does not
//! live under an archived or terminated container.

use crate::attribute::AttributeBag;

/// Attribute holding the account's unique identifier.
pub const IDENTITY_ATTRIBUTE: &str = "objectGUID";

/// Attribute holding the account control bit flags.
pub const CONTROL_ATTRIBUTE: &str = "userAccountControl";

/// Attribute holding the account's full hierarchical location.
pub const PATH_ATTRIBUTE: &str = "distinguishedName";

/// Container path fragments that mark an account as retired.
///
/// The first entry is implied by the other two; all three are still checked
/// independently.
pub const RETIRED_CONTAINERS: [&str; 3] = ["OU=Archived,OU=Terms", "OU=Archived", "OU=Terms"];

/// Parsed `userAccountControl` bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccountControl {
    pub value: u32,
}

impl UserAccountControl {
    pub const SCRIPT: u32 = 0x0001;
    pub const ACCOUNTDISABLE: u32 = 0x0002;
    pub const HOMEDIR_REQUIRED: u32 = 0x0008;
    pub const LOCKOUT: u32 = 0x0010;
    pub const PASSWD_NOTREQD: u32 = 0x0020;
    pub const PASSWD_CANT_CHANGE: u32 = 0x0040;
    pub const ENCRYPTED_TEXT_PWD_ALLOWED: u32 = 0x0080;
    pub const NORMAL_ACCOUNT: u32 = 0x0200;
    pub const INTERDOMAIN_TRUST_ACCOUNT: u32 = 0x0800;
    pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x1000;
    pub const SERVER_TRUST_ACCOUNT: u32 = 0x2000;
    pub const DONT_EXPIRE_PASSWORD: u32 = 0x1_0000;
    pub const SMARTCARD_REQUIRED: u32 = 0x4_0000;
    pub const TRUSTED_FOR_DELEGATION: u32 = 0x8_0000;
    pub const NOT_DELEGATED: u32 = 0x10_0000;
    pub const PASSWORD_EXPIRED: u32 = 0x80_0000;

    const NAMED_FLAGS: [(u32, &'static str); 16] = [
        (Self::SCRIPT, "SCRIPT"),
        (Self::ACCOUNTDISABLE, "ACCOUNTDISABLE"),
        (Self::HOMEDIR_REQUIRED, "HOMEDIR_REQUIRED"),
        (Self::LOCKOUT, "LOCKOUT"),
        (Self::PASSWD_NOTREQD, "PASSWD_NOTREQD"),
        (Self::PASSWD_CANT_CHANGE, "PASSWD_CANT_CHANGE"),
        (
            Self::ENCRYPTED_TEXT_PWD_ALLOWED,
            "ENCRYPTED_TEXT_PWD_ALLOWED",
        ),
        (Self::NORMAL_ACCOUNT, "NORMAL_ACCOUNT"),
        (Self::INTERDOMAIN_TRUST_ACCOUNT, "INTERDOMAIN_TRUST_ACCOUNT"),
        (Self::WORKSTATION_TRUST_ACCOUNT, "WORKSTATION_TRUST_ACCOUNT"),
        (Self::SERVER_TRUST_ACCOUNT, "SERVER_TRUST_ACCOUNT"),
        (Self::DONT_EXPIRE_PASSWORD, "DONT_EXPIRE_PASSWORD"),
        (Self::SMARTCARD_REQUIRED, "SMARTCARD_REQUIRED"),
        (Self::TRUSTED_FOR_DELEGATION, "TRUSTED_FOR_DELEGATION"),
        (Self::NOT_DELEGATED, "NOT_DELEGATED"),
        (Self::PASSWORD_EXPIRED, "PASSWORD_EXPIRED"),
    ];

    pub fn from_value(value: u32) -> Self {
        Self { value }
    }

    /// Interpret a stored integer; negative values are the signed form of
    /// the same 32 bits. `None` when it fits neither.
    pub fn from_raw(raw: i64) -> Option<Self> {
        u32::try_from(raw)
            .ok()
            .or_else(|| i32::try_from(raw).ok().map(|v| v as u32))
            .map(Self::from_value)
    }

    /// Read the flags from a record; `None` if absent or not numeric.
    pub fn from_bag(bag: &AttributeBag) -> Option<Self> {
        let raw = bag.raw_value(CONTROL_ATTRIBUTE).ok()?.as_integer()?;
        Self::from_raw(raw)
    }

    pub fn has(&self, flag: u32) -> bool {
        self.value & flag != 0
    }

    pub fn is_disabled(&self) -> bool {
        self.has(Self::ACCOUNTDISABLE)
    }

    /// Locked out is not disabled.
    pub fn is_active(&self) -> bool {
        !self.is_disabled()
    }

    /// Names of the well-known flags that are set, lowest bit first.
    pub fn flag_names(&self) -> Vec<&'static str> {
        Self::NAMED_FLAGS
            .iter()
            .filter(|(bit, _)| self.has(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::fmt::Display for UserAccountControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.flag_names();
        if names.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} ({})", self.value, names.join(" | "))
        }
    }
}

/// Whether the record has a retrievable unique identifier.
pub fn has_identity(bag: &AttributeBag) -> bool {
    bag.get(IDENTITY_ATTRIBUTE)
        .and_then(|values| values.first())
        .is_some_and(|value| !value.to_string().is_empty())
}

/// Whether the container path places the account in a retired container.
pub fn is_retired_path(path: &str) -> bool {
    let mut retired = false;
    for fragment in RETIRED_CONTAINERS {
        if path.contains(fragment) {
            retired = true;
        }
    }
    retired
}

/// Derive the active/inactive status of an account.
///
/// Pure function of the bag: records without identity or without account
/// control flags are never active.
pub fn evaluate_status(bag: &AttributeBag) -> bool {
    if !has_identity(bag) {
        return false;
    }
    let Some(uac) = UserAccountControl::from_bag(bag) else {
        return false;
    };

    let mut active = uac.is_active();
    if active {
        if let Some(path) = bag.first_string(PATH_ATTRIBUTE) {
            if is_retired_path(path) {
                active = false;
            }
        }
    }
    active
}
