use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Worksuite crates.
pub type AppResult<T> = Result<T, AppError>;

/// Why the access gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForbiddenReason {
    /// The caller holds no scope at all for the requested app.
    #[serde(rename = "FORBIDDEN_APP")]
    App,
    /// The caller can use the app but lacks the required scope.
    #[serde(rename = "FORBIDDEN_SCOPE")]
    Scope,
}

impl ForbiddenReason {
    /// Returns the stable machine-readable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::App => "FORBIDDEN_APP",
            Self::Scope => "FORBIDDEN_SCOPE",
        }
    }
}

impl Display for ForbiddenReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.code())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist in the caller's tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by the access gate.
    #[error("forbidden ({reason}): {message}")]
    Forbidden {
        /// Machine-readable denial reason.
        reason: ForbiddenReason,
        /// Human-readable detail.
        message: String,
    },

    /// The backing store failed; the enclosing transaction was rolled back.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden { reason, .. } => reason.code(),
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a forbidden error with the given reason.
    #[must_use]
    pub fn forbidden(reason: ForbiddenReason, message: impl Into<String>) -> Self {
        Self::Forbidden {
            reason,
            message: message.into(),
        }
    }
}
