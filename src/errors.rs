//! Error types for adapter synthesis and forwarding

use std::fmt;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors raised while synthesizing adapter types or forwarding calls
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProxyError {
    /// Synthesis was requested for something that is not an interface
    #[error("{name} is a {kind}, not an interface")]
    InvalidInterfaceType { name: String, kind: String },

    /// A member cannot be forwarded (events, or members the marshaler declined)
    #[error("{interface}.{member} is not supported: {reason}")]
    UnsupportedMember {
        interface: String,
        member: String,
        reason: String,
    },

    /// Argument or return conversion failed at call time
    #[error("marshaling failed for {member}: {reason}")]
    MarshalingFailed { member: String, reason: String },

    /// Wrong number of arguments supplied to a forwarded member
    #[error("{member} expects {expected} arguments, got {got}")]
    ArityMismatch {
        member: String,
        expected: usize,
        got: usize,
    },

    /// The foreign value behind a weak handle was reclaimed
    #[error("foreign value handle has expired")]
    HandleExpired,

    /// A synthesized type name is already registered in the adapter module
    #[error("type {0} is already defined in the adapter module")]
    DuplicateTypeName(String),

    /// The bind phase ran again on a type whose dispatch table is already set
    #[error("type {0} already has a bound dispatch table")]
    AlreadyBound(String),

    /// Dispatch table was used before the bind phase completed
    #[error("type {0} has no bound dispatch table")]
    NotBound(String),

    /// No member with that name exists on the adapter's interface
    #[error("{interface} has no member {member}")]
    MemberNotFound { interface: String, member: String },

    /// An unqualified member name is declared by more than one interface
    #[error("{member} is ambiguous between {}", candidates.join(", "))]
    AmbiguousMember {
        member: String,
        candidates: Vec<String>,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    pub fn unsupported(
        interface: impl Into<String>,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedMember {
            interface: interface.into(),
            member: member.into(),
            reason: reason.into(),
        }
    }

    pub fn marshaling(member: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MarshalingFailed {
            member: member.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error is confined to a single call and leaves the adapter usable
    pub fn is_call_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMember { .. }
                | Self::MarshalingFailed { .. }
                | Self::ArityMismatch { .. }
                | Self::MemberNotFound { .. }
                | Self::AmbiguousMember { .. }
        )
    }
}

/// Failure reported by a marshaler's dispatch delegate
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarshalError {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("foreign call failed: {0}")]
    Foreign(String),
}

impl From<String> for MarshalError {
    fn from(s: String) -> Self {
        MarshalError::Foreign(s)
    }
}

impl From<&str> for MarshalError {
    fn from(s: &str) -> Self {
        MarshalError::Foreign(s.to_string())
    }
}
