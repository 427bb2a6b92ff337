//! Error taxonomy for the log and its external collaborators.

use std::fmt;

/// Errors surfaced by [`crate::log::Log`] and the traversal/comparator helpers it builds on.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A required collaborator (identity, access controller, store) was not configured.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// The content-addressed block store failed a `put` or `get`.
    #[error("block store failure: {0}")]
    StoreFailure(String),

    /// Signing or verifying an entry's signature failed.
    #[error("signature failure: {0}")]
    SignatureFailure(String),

    /// The access controller refused to admit an entry.
    #[error("append denied by access controller: {0}")]
    AccessDenied(String),

    /// An entry was malformed (wrong log id, empty required field, etc).
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// A traversal was asked to start from an empty or inconsistent root set.
    #[error("invalid traversal input: {0}")]
    TraversalInvalid(String),

    /// The comparator, even after the deterministic fallback chain, could not
    /// distinguish two distinct entries. Should be unreachable for content-addressed
    /// entries; kept as a defensive guard.
    #[error("ambiguous order between distinct entries {0} and {1}")]
    AmbiguousOrder(String, String),
}

impl LogError {
    pub fn store<E: fmt::Display>(e: E) -> LogError {
        LogError::StoreFailure(e.to_string())
    }

    pub fn signature<E: fmt::Display>(e: E) -> LogError {
        LogError::SignatureFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LogError>;

/// Errors returned by [`crate::access_controller::AccessController`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("identity {0} is not permitted to append")]
    Denied(String),
}

impl From<AccessError> for LogError {
    fn from(e: AccessError) -> LogError {
        LogError::AccessDenied(e.to_string())
    }
}
