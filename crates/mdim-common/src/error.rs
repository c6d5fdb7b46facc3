//! Error types for multidimensional array access.

use thiserror::Error;

/// Result type alias using MdimError.
pub type MdimResult<T> = Result<T, MdimError>;

/// Errors raised while building or reading arrays, dimensions and groups.
///
/// Errors coming from a parent array are returned unchanged by every derived
/// view, so the variant a caller sees is the one raised at the leaf.
#[derive(Debug, Error)]
pub enum MdimError {
    // === Construction / validation ===
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    // === Limits ===
    #[error("{0}")]
    Capacity(String),

    #[error("{0}")]
    NotSupported(String),

    #[error("Out of memory: {0}")]
    Resource(String),

    // === Data access ===
    #[error("Failed to read data: {0}")]
    Read(String),
}

impl MdimError {
    /// Create an InvalidArgument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a Capacity error.
    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    /// Create a NotSupported error.
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create a Read error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// True for errors caused by the shape, type or name of an input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::NotFound(_))
    }
}

impl From<std::collections::TryReserveError> for MdimError {
    fn from(err: std::collections::TryReserveError) -> Self {
        MdimError::Resource(err.to_string())
    }
}

impl From<serde_json::Error> for MdimError {
    fn from(err: serde_json::Error) -> Self {
        MdimError::InvalidArgument(format!("JSON error: {}", err))
    }
}
