//! Attribute bags
//!
//! Raw, per-record attribute storage as handed over by the directory client.
//! Names are case-insensitive and every present attribute carries at least one
//! value, in the order the directory returned them.

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::{RosterError, RosterResult};

/// A single raw attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Text value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Calendar timestamp (GeneralizedTime on the wire).
    Timestamp(DateTime<Utc>),
    /// 64-bit integer transmitted as two 32-bit halves.
    LargeInteger { high: i32, low: i32 },
    /// Opaque binary data.
    Binary(Vec<u8>),
}

impl RawValue {
    /// Build a split pair from a full 64-bit value.
    pub fn large_integer(value: i64) -> Self {
        RawValue::LargeInteger {
            high: (value >> 32) as i32,
            low: value as i32,
        }
    }

    /// Get as a string if this is a text value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer, accepting numeric text.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawValue::Integer(i) => Some(*i),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short name of the variant, used in decode fault messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::String(_) => "string",
            RawValue::Integer(_) => "integer",
            RawValue::Timestamp(_) => "calendar timestamp",
            RawValue::LargeInteger { .. } => "split 64-bit integer",
            RawValue::Binary(_) => "binary",
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::String(s) => f.write_str(s),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Timestamp(ts) => write!(f, "{}", ts.format(crate::timestamp::DISPLAY_FORMAT)),
            RawValue::LargeInteger { high, low } => {
                write!(f, "{}", crate::timestamp::join_halves(*high, *low))
            }
            RawValue::Binary(bytes) => {
                f.write_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(ts: DateTime<Utc>) -> Self {
        RawValue::Timestamp(ts)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(bytes: Vec<u8>) -> Self {
        RawValue::Binary(bytes)
    }
}

/// The attributes of one directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBag {
    entries: Vec<(String, Vec<RawValue>)>,
}

impl AttributeBag {
    /// Create a new empty bag.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Replace an attribute with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.set_values(name, vec![value.into()]);
    }

    /// Replace an attribute with several values.
    ///
    /// An empty `values` removes the attribute, since a present attribute
    /// always has at least one value.
    pub fn set_values(&mut self, name: impl Into<String>, values: Vec<RawValue>) {
        let name = name.into();
        match (self.position(&name), values.is_empty()) {
            (Some(idx), true) => {
                self.entries.remove(idx);
            }
            (Some(idx), false) => self.entries[idx].1 = values,
            (None, true) => {}
            (None, false) => self.entries.push((name, values)),
        }
    }

    /// Append a value to an attribute, creating it if necessary.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Check if an attribute exists.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of an attribute, if present.
    pub fn get(&self, name: &str) -> Option<&[RawValue]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// The first value of an attribute.
    pub fn raw_value(&self, name: &str) -> RosterResult<&RawValue> {
        self.get(name)
            .and_then(|values| values.first())
            .ok_or_else(|| RosterError::AttributeAbsent {
                attribute: name.to_string(),
            })
    }

    /// Number of values of an attribute, 0 if absent.
    pub fn value_count(&self, name: &str) -> usize {
        self.get(name).map_or(0, |values| values.len())
    }

    /// The value at `index` of an attribute.
    pub fn value_at(&self, name: &str, index: usize) -> RosterResult<&RawValue> {
        let values = self.get(name).unwrap_or(&[]);
        values.get(index).ok_or_else(|| RosterError::IndexOutOfRange {
            attribute: name.to_string(),
            index,
            count: values.len(),
        })
    }

    /// The first value of an attribute if it is text.
    pub fn first_string(&self, name: &str) -> Option<&str> {
        self.raw_value(name).ok().and_then(RawValue::as_string)
    }

    /// Attribute names in directory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over attributes in directory order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawValue])> {
        self.entries
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
