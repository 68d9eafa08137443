//! Roster error types
//!
//! Error definitions with connectivity classification so the enumeration path
//! can tell a dead server apart from a bad record.

use thiserror::Error;

/// Error that can occur while reading or decoding directory accounts.
#[derive(Debug, Error)]
pub enum RosterError {
    // Connectivity errors
    /// Failed to connect or bind to the directory server.
    #[error("directory server unreachable ({server}): {message}")]
    ServerUnreachable {
        server: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server rejected or aborted a search.
    #[error("search failed for {filter}: {message}")]
    SearchFailed {
        filter: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Attribute access errors
    /// Attribute is not present on the record.
    #[error("attribute '{attribute}' is not present")]
    AttributeAbsent { attribute: String },

    /// Value index past the end of a multi-valued attribute.
    #[error("index {index} out of range for attribute '{attribute}' with {count} value(s)")]
    IndexOutOfRange {
        attribute: String,
        index: usize,
        count: usize,
    },

    // Decoding errors
    /// Attribute is present but not in the expected encoding.
    #[error("cannot decode attribute '{attribute}' as {expected}: {message}")]
    DecodeFault {
        attribute: String,
        expected: &'static str,
        message: String,
    },

    /// A memberOf entry has no ',' terminating its first RDN value.
    #[error("malformed distinguished name: {dn}")]
    MalformedDistinguishedName { dn: String },

    // Configuration errors
    /// Connection configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl RosterError {
    /// Check if this error means the directory itself could not be reached.
    ///
    /// The enumeration path reports these once and ends cleanly; every other
    /// error is a fault of the operation.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RosterError::ServerUnreachable { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            RosterError::ServerUnreachable { .. } => "SERVER_UNREACHABLE",
            RosterError::SearchFailed { .. } => "SEARCH_FAILED",
            RosterError::AttributeAbsent { .. } => "ATTRIBUTE_ABSENT",
            RosterError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            RosterError::DecodeFault { .. } => "DECODE_FAULT",
            RosterError::MalformedDistinguishedName { .. } => "MALFORMED_DN",
            RosterError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    // Convenience constructors

    /// Create a server unreachable error.
    pub fn server_unreachable(server: impl Into<String>, message: impl Into<String>) -> Self {
        RosterError::ServerUnreachable {
            server: server.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a server unreachable error with source.
    pub fn server_unreachable_with_source(
        server: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RosterError::ServerUnreachable {
            server: server.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a search failed error.
    pub fn search_failed(filter: impl Into<String>, message: impl Into<String>) -> Self {
        RosterError::SearchFailed {
            filter: filter.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a search failed error with source.
    pub fn search_failed_with_source(
        filter: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RosterError::SearchFailed {
            filter: filter.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a decode fault.
    pub fn decode_fault(
        attribute: impl Into<String>,
        expected: &'static str,
        message: impl Into<String>,
    ) -> Self {
        RosterError::DecodeFault {
            attribute: attribute.into(),
            expected,
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        RosterError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_errors() {
        let err = RosterError::server_unreachable("dc01.example.com", "connection refused");
        assert!(err.is_connectivity());
        assert_eq!(err.error_code(), "SERVER_UNREACHABLE");
    }

    #[test]
    fn test_non_connectivity_errors() {
        let errors = vec![
            RosterError::search_failed("(objectClass=user)", "rc=32"),
            RosterError::AttributeAbsent {
                attribute: "mail".to_string(),
            },
            RosterError::decode_fault("lastLogon", "split 64-bit integer", "got string"),
            RosterError::MalformedDistinguishedName {
                dn: "CN=Broken".to_string(),
            },
            RosterError::invalid_configuration("empty host"),
        ];

        for err in errors {
            assert!(
                !err.is_connectivity(),
                "Expected {} to not be a connectivity error",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_error_display() {
        let err = RosterError::IndexOutOfRange {
            attribute: "memberOf".to_string(),
            index: 3,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "index 3 out of range for attribute 'memberOf' with 2 value(s)"
        );

        let err = RosterError::MalformedDistinguishedName {
            dn: "CN=Everyone".to_string(),
        };
        assert_eq!(err.to_string(), "malformed distinguished name: CN=Everyone");
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RosterError::server_unreachable_with_source("dc01", "connect failed", source_err);

        if let RosterError::ServerUnreachable { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected ServerUnreachable variant");
        }
    }
}
