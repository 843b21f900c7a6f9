//! Error types for instance resolution
//!
//! Two layers: [`ComputeError`] is what the remote lookup collaborators
//! return, [`InstanceError`] is what callers of the resolution surface see.

use thiserror::Error;

/// Error returned by compute/network collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComputeError {
    /// The remote API has no such resource
    #[error("{resource} {id:?} not found")]
    NotFound { resource: String, id: String },

    /// The request failed (network, auth, rate limit, server error)
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured deadline
    #[error("{resource} {request} request timed out")]
    Timeout { resource: String, request: String },

    /// The remote API answered with something we could not interpret
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ComputeError {
    /// Shorthand for a not-found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        ComputeError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Check if this is a "not found" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, ComputeError::NotFound { .. })
    }
}

/// Error type for instance resolution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstanceError {
    /// No cloud instance backs the node
    #[error("instance not found")]
    InstanceNotFound,

    /// More than one cloud instance carries the node's name
    #[error("multiple instances found for node {name:?} ({count} matches)")]
    Ambiguous { name: String, count: usize },

    /// The provider id was issued for another region
    #[error("provider id {provider_id:?} didn't match supported region {region:?}")]
    RegionMismatch { provider_id: String, region: String },

    /// The provider id does not parse
    #[error(
        "provider id {provider_id:?} didn't match expected format \"openstack://region/InstanceID\""
    )]
    MalformedProviderId { provider_id: String },

    /// Any other remote failure
    #[error(transparent)]
    Transient(#[from] ComputeError),
}

/// Closed set of error categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    RegionMismatch,
    MalformedIdentity,
    Transient,
}

impl InstanceError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstanceError::InstanceNotFound => ErrorKind::NotFound,
            InstanceError::Ambiguous { .. } => ErrorKind::Ambiguous,
            InstanceError::RegionMismatch { .. } => ErrorKind::RegionMismatch,
            InstanceError::MalformedProviderId { .. } => ErrorKind::MalformedIdentity,
            InstanceError::Transient(_) => ErrorKind::Transient,
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not-found"),
            ErrorKind::Ambiguous => write!(f, "ambiguous"),
            ErrorKind::RegionMismatch => write!(f, "region-mismatch"),
            ErrorKind::MalformedIdentity => write!(f, "malformed-identity"),
            ErrorKind::Transient => write!(f, "transient"),
        }
    }
}

/// Result type for instance resolution
pub type Result<T> = std::result::Result<T, InstanceError>;
