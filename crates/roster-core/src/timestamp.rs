//! Timestamp normalization
//!
//! Active Directory stores account timestamps in two unrelated encodings:
//!
//! - `whenCreated` / `whenChanged` are GeneralizedTime calendar values.
//! - `lastLogon` / `lastLogoff` / `accountExpires` are 64-bit counts of
//!   100-nanosecond ticks since 1601-01-01 UTC, delivered as a high/low pair
//!   of 32-bit integers.
//!
//! Both are normalized to `DateTime<Utc>`.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use tracing::warn;

use crate::attribute::{AttributeBag, RawValue};
use crate::error::{RosterError, RosterResult};

/// Format used when rendering normalized instants.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Ticks per second in the split-integer encoding.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Seconds between 1601-01-01T00:00:00Z and the Unix epoch.
pub const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Last calendar year the source platform can represent.
const MAX_YEAR: i32 = 9999;

/// How a timestamp attribute is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    /// Calendar timestamp, usable as-is.
    CalendarValue,
    /// 64-bit tick count split into high/low 32-bit halves.
    SplitInteger64,
}

impl EncodingKind {
    fn describe(self) -> &'static str {
        match self {
            EncodingKind::CalendarValue => "calendar timestamp",
            EncodingKind::SplitInteger64 => "split 64-bit integer",
        }
    }
}

/// The fixed set of timestamp attributes on an account, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSource {
    WhenCreated,
    WhenChanged,
    LastLogon,
    LastLogoff,
    AccountExpires,
}

impl TimeSource {
    /// Every timestamp attribute, in table order.
    pub const ALL: [TimeSource; 5] = [
        TimeSource::WhenCreated,
        TimeSource::WhenChanged,
        TimeSource::LastLogon,
        TimeSource::LastLogoff,
        TimeSource::AccountExpires,
    ];

    /// LDAP attribute name.
    pub fn attribute(self) -> &'static str {
        match self {
            TimeSource::WhenCreated => "whenCreated",
            TimeSource::WhenChanged => "whenChanged",
            TimeSource::LastLogon => "lastLogon",
            TimeSource::LastLogoff => "lastLogoff",
            TimeSource::AccountExpires => "accountExpires",
        }
    }

    /// Wire encoding of this attribute.
    pub fn encoding(self) -> EncodingKind {
        match self {
            TimeSource::WhenCreated | TimeSource::WhenChanged => EncodingKind::CalendarValue,
            TimeSource::LastLogon | TimeSource::LastLogoff | TimeSource::AccountExpires => {
                EncodingKind::SplitInteger64
            }
        }
    }

    /// Look up a table entry by attribute name (case-insensitive).
    pub fn from_attribute(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.attribute().eq_ignore_ascii_case(name))
    }

    /// Whether a decode fault on this attribute is swallowed instead of raised.
    ///
    /// Only the last table entry is tolerant. The asymmetry is kept for output
    /// compatibility: a never-expiring `accountExpires` holds a sentinel that
    /// cannot be converted and must render as "not set".
    pub fn is_fault_tolerant(self) -> bool {
        self == TimeSource::AccountExpires
    }
}

impl std::fmt::Display for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Rebuild a 64-bit value from its halves.
///
/// `low` is reinterpreted as unsigned first so its sign bit cannot smear
/// into the high word.
pub fn join_halves(high: i32, low: i32) -> i64 {
    ((high as i64) << 32) | (low as u32 as i64)
}

/// Convert a tick count (100 ns since 1601-01-01 UTC) to an instant.
///
/// Returns `None` for negative counts and for instants past year 9999,
/// which covers the `i64::MAX` "never" sentinel.
pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks < 0 {
        return None;
    }
    let secs = ticks / TICKS_PER_SECOND - EPOCH_OFFSET_SECS;
    let nanos = ((ticks % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).filter(|dt| dt.year() <= MAX_YEAR)
}

/// Parse an LDAP GeneralizedTime value such as `20240115120000.0Z`.
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    ["%Y%m%d%H%M%S%.fZ", "%Y%m%d%H%M%SZ"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Normalize one timestamp attribute of a record.
///
/// Returns `Ok(None)` when the attribute is absent and a `DecodeFault` when
/// it is present in the wrong shape or out of range.
pub fn normalize(bag: &AttributeBag, source: TimeSource) -> RosterResult<Option<DateTime<Utc>>> {
    let name = source.attribute();
    let Some(value) = bag.get(name).and_then(|values| values.first()) else {
        return Ok(None);
    };
    let expected = source.encoding().describe();

    match (source.encoding(), value) {
        (EncodingKind::CalendarValue, RawValue::Timestamp(ts)) => Ok(Some(*ts)),
        (EncodingKind::SplitInteger64, RawValue::LargeInteger { high, low }) => {
            let ticks = join_halves(*high, *low);
            ticks_to_datetime(ticks).map(Some).ok_or_else(|| {
                RosterError::decode_fault(
                    name,
                    expected,
                    format!("tick count {ticks} is outside the representable range"),
                )
            })
        }
        (_, other) => Err(RosterError::decode_fault(
            name,
            expected,
            format!("found {}", other.kind()),
        )),
    }
}

/// Normalize a timestamp for reporting.
///
/// Decode faults are logged, then raised, except on the fault-tolerant last
/// table entry where they read as "not set".
pub fn resolve(bag: &AttributeBag, source: TimeSource) -> RosterResult<Option<DateTime<Utc>>> {
    match normalize(bag, source) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(attribute = %source, error = %err, "Failed to decode timestamp attribute");
            if source.is_fault_tolerant() {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

/// Render an instant the way the reporters print it.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_table_order_and_encodings() {
        let names: Vec<&str> = TimeSource::ALL.iter().map(|s| s.attribute()).collect();
        assert_eq!(
            names,
            vec![
                "whenCreated",
                "whenChanged",
                "lastLogon",
                "lastLogoff",
                "accountExpires"
            ]
        );
        assert_eq!(
            TimeSource::WhenCreated.encoding(),
            EncodingKind::CalendarValue
        );
        assert_eq!(
            TimeSource::WhenChanged.encoding(),
            EncodingKind::CalendarValue
        );
        assert_eq!(
            TimeSource::LastLogon.encoding(),
            EncodingKind::SplitInteger64
        );
        assert_eq!(
            TimeSource::LastLogoff.encoding(),
            EncodingKind::SplitInteger64
        );
        assert_eq!(
            TimeSource::AccountExpires.encoding(),
            EncodingKind::SplitInteger64
        );
    }

    #[test]
    fn test_only_last_entry_is_fault_tolerant() {
        let tolerant: Vec<TimeSource> = TimeSource::ALL
            .into_iter()
            .filter(|s| s.is_fault_tolerant())
            .collect();
        assert_eq!(tolerant, vec![TimeSource::AccountExpires]);
    }

    #[test]
    fn test_from_attribute() {
        assert_eq!(
            TimeSource::from_attribute("LASTLOGON"),
            Some(TimeSource::LastLogon)
        );
        assert_eq!(TimeSource::from_attribute("pwdLastSet"), None);
    }

    #[test]
    fn test_join_halves_low_sign_bit() {
        // 0xDEADBEEF has its top bit set; as i32 it is negative.
        let low = 0xDEAD_BEEFu32 as i32;
        assert!(low < 0);
        assert_eq!(join_halves(0x01D0, low), (0x01D0i64 << 32) | 0xDEAD_BEEF);
        assert_eq!(join_halves(0, -1), 0xFFFF_FFFF);
        assert_eq!(join_halves(-1, -1), -1);
    }

    #[test]
    fn test_join_halves_full_low_range() {
        for low in [0u32, 1, 0x7FFF_FFFF, 0x8000_0000, 0xFFFF_FFFE, 0xFFFF_FFFF] {
            for high in [0i32, 1, 30_267_983, i32::MAX] {
                let expected = ((high as i64) << 32) | low as i64;
                assert_eq!(join_halves(high, low as i32), expected);
            }
        }
    }

    #[test]
    fn test_ticks_fixture() {
        let dt = ticks_to_datetime(130_000_000_000_000_000).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2012, 12, 14, 23, 6, 40).unwrap());
    }

    #[test]
    fn test_ticks_epoch() {
        let dt = ticks_to_datetime(0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap());
        let unix = ticks_to_datetime(EPOCH_OFFSET_SECS * TICKS_PER_SECOND).unwrap();
        assert_eq!(unix.timestamp(), 0);
    }

    #[test]
    fn test_ticks_out_of_range() {
        assert!(ticks_to_datetime(i64::MAX).is_none());
        assert!(ticks_to_datetime(-1).is_none());
    }

    #[test]
    fn test_parse_generalized_time() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(parse_generalized_time("20240115120000.0Z"), Some(expected));
        assert_eq!(parse_generalized_time("20240115120000Z"), Some(expected));
        assert_eq!(parse_generalized_time("yesterday"), None);
    }

    #[test]
    fn test_normalize_absent() {
        let bag = AttributeBag::new();
        for source in TimeSource::ALL {
            assert_eq!(normalize(&bag, source).unwrap(), None);
        }
    }

    #[test]
    fn test_normalize_calendar_value_as_is() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let bag = AttributeBag::new().with("whenCreated", created);
        assert_eq!(
            normalize(&bag, TimeSource::WhenCreated).unwrap(),
            Some(created)
        );
    }

    #[test]
    fn test_normalize_split_pair_fixture() {
        let bag = AttributeBag::new().with(
            "lastLogon",
            RawValue::LargeInteger {
                high: 30_267_983,
                low: -1_395_851_264,
            },
        );
        let dt = normalize(&bag, TimeSource::LastLogon).unwrap().unwrap();
        assert_eq!(format_instant(&dt), "2012-12-14 23:06:40 UTC");
    }

    #[test]
    fn test_normalize_wrong_shape() {
        let bag = AttributeBag::new()
            .with("whenChanged", "20240620153045.0Z")
            .with("lastLogoff", 42i64);

        let err = normalize(&bag, TimeSource::WhenChanged).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_FAULT");
        let err = normalize(&bag, TimeSource::LastLogoff).unwrap_err();
        assert!(err.to_string().contains("lastLogoff"));
    }

    #[test]
    fn test_resolve_raises_for_non_tolerant_fields() {
        let bag = AttributeBag::new().with("lastLogon", "garbage");
        assert!(resolve(&bag, TimeSource::LastLogon).is_err());
    }

    #[test]
    fn test_resolve_swallows_account_expires_fault() {
        let bag = AttributeBag::new().with("accountExpires", RawValue::large_integer(i64::MAX));
        assert!(normalize(&bag, TimeSource::AccountExpires).is_err());
        assert_eq!(resolve(&bag, TimeSource::AccountExpires).unwrap(), None);
    }

    #[test]
    fn test_normalize_is_stable_across_calls() {
        let bag = AttributeBag::new().with(
            "lastLogon",
            RawValue::large_integer(133_500_000_000_000_000),
        );
        let first = normalize(&bag, TimeSource::LastLogon).unwrap();
        let second = normalize(&bag, TimeSource::LastLogon).unwrap();
        assert_eq!(first, second);
    }
}
