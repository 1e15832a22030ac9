//! Error types for the Matjip search pipeline.
//!
//! Every failure bubbles to the caller. Variants fall into three groups:
//! not-found (4xx-equivalent), backend-unavailable (transient) and
//! malformed-state (fatal for the request).

use thiserror::Error;

use crate::model::{RestaurantId, ReviewId, UserId};

/// Result type alias for Matjip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Matjip operations.
///
/// Error codes follow the pattern `MATJIP-XXX`.
#[derive(Error, Debug)]
pub enum Error {
    /// Restaurant not found (MATJIP-001).
    #[error("[MATJIP-001] Restaurant '{0}' not found")]
    RestaurantNotFound(RestaurantId),

    /// Review not found (MATJIP-002).
    #[error("[MATJIP-002] Review '{0}' not found")]
    ReviewNotFound(ReviewId),

    /// Review mutation by someone other than its author (MATJIP-003).
    #[error("[MATJIP-003] User '{user_id}' is not the author of review '{review_id}'")]
    NotReviewAuthor {
        /// Review being mutated.
        review_id: ReviewId,
        /// User attempting the mutation.
        user_id: UserId,
    },

    /// Search index, relational store or cache failed (MATJIP-004).
    #[error("[MATJIP-004] {backend} unavailable: {message}")]
    BackendUnavailable {
        /// Backend name (`elasticsearch`, `postgres`, `cache`).
        backend: &'static str,
        /// Underlying failure.
        message: String,
    },

    /// Stored or returned data that cannot be interpreted (MATJIP-005).
    #[error("[MATJIP-005] Malformed state: {0}")]
    MalformedState(String),

    /// Caller-supplied argument out of range (MATJIP-006).
    #[error("[MATJIP-006] Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (MATJIP-007).
    #[error("[MATJIP-007] Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code (e.g., "MATJIP-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RestaurantNotFound(_) => "MATJIP-001",
            Self::ReviewNotFound(_) => "MATJIP-002",
            Self::NotReviewAuthor { .. } => "MATJIP-003",
            Self::BackendUnavailable { .. } => "MATJIP-004",
            Self::MalformedState(_) => "MATJIP-005",
            Self::InvalidArgument(_) => "MATJIP-006",
            Self::Config(_) => "MATJIP-007",
        }
    }

    /// Returns true if the failure is transient.
    ///
    /// Nothing in this crate retries; the flag is for the transport layer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Returns true for errors that map to a not-found response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RestaurantNotFound(_) | Self::ReviewNotFound(_))
    }

    pub(crate) fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            message: message.into(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::MalformedState("expected row is missing".to_string()),
            other => Self::backend("postgres", other.to_string()),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
