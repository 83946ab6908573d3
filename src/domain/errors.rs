use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt knowledge base: {0}")]
    CorruptKnowledgeBase(String),

    #[error("Incompatible index version: found {found}, supported {supported}")]
    IncompatibleIndexVersion { found: u32, supported: u32 },

    #[error("No retrieval candidates: {0}")]
    RetrievalEmpty(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Backend timed out: {0}")]
    BackendTimeout(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable discriminant of [`DomainError`], used in diagnostics and API bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    DimensionMismatch,
    CorruptKnowledgeBase,
    IncompatibleIndexVersion,
    RetrievalEmpty,
    ValidationFailed,
    BackendTimeout,
    BackendUnavailable,
    Config,
    Internal,
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptKnowledgeBase(msg.into())
    }

    pub fn retrieval_empty(msg: impl Into<String>) -> Self {
        Self::RetrievalEmpty(msg.into())
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn backend_timeout(msg: impl Into<String>) -> Self {
        Self::BackendTimeout(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::CorruptKnowledgeBase(_) => ErrorKind::CorruptKnowledgeBase,
            Self::IncompatibleIndexVersion { .. } => ErrorKind::IncompatibleIndexVersion,
            Self::RetrievalEmpty(_) => ErrorKind::RetrievalEmpty,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::BackendTimeout(_) => ErrorKind::BackendTimeout,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Load-time errors that must abort startup, and the internal faults that share their fate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::CorruptKnowledgeBase(_)
                | Self::IncompatibleIndexVersion { .. }
                | Self::Config(_)
                | Self::Internal(_)
        )
    }

    /// Errors a pipeline stage absorbs into a degraded response.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RetrievalEmpty(_)
                | Self::ValidationFailed(_)
                | Self::BackendTimeout(_)
                | Self::BackendUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
