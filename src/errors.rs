//! Unified error types for medtrace.
//!
//! Every core operation returns [`Result`]. The action layer turns an [`Error`]
//! into a failed `ActionResult` using [`Error::kind`] as the machine-readable tag.

use serde::Serialize;
use thiserror::Error;

/// All errors raised by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// The datastore failed or is unreachable
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before any write
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name, e.g. `"Batch"`
        entity: &'static str,
        /// The identifier that was looked up
        id: String,
    },

    /// A dispatch or sale asked for more than the holder has on hand
    #[error(
        "Insufficient stock for batch {batch_id} at holder {holder_id}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        /// Batch being withdrawn from
        batch_id: i64,
        /// Holder whose stock was checked
        holder_id: i64,
        /// Stock on hand
        available: i64,
        /// Quantity requested
        requested: i64,
    },

    /// The caller is not allowed to perform the operation
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the caller was rejected
        message: String,
    },

    /// A status change outside the allowed state machine
    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        /// Entity name, e.g. `"Order"`
        entity: &'static str,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Stock of a recalled batch cannot be ordered, shipped or sold
    #[error("Batch {batch_number} has been recalled")]
    BatchRecalled {
        /// Batch number of the recalled batch
        batch_number: String,
    },

    /// A batch may carry at most one active recall
    #[error("Batch {batch_id} already has an active recall")]
    RecallAlreadyActive {
        /// Batch with the existing recall
        batch_id: i64,
    },
}

/// Machine-readable error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced entity missing
    NotFound,
    /// Stock check failed
    InsufficientStock,
    /// Caller lacks permission
    Unauthorized,
    /// Bad input or forbidden state change
    Validation,
    /// Database, filesystem or configuration failure
    Infrastructure,
}

impl Error {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Validation { .. }
            | Self::InvalidTransition { .. }
            | Self::BatchRecalled { .. }
            | Self::RecallAlreadyActive { .. } => ErrorKind::Validation,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Infrastructure,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::not_found("Batch", 7).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::InsufficientStock {
                batch_id: 1,
                holder_id: 2,
                available: 7,
                requested: 8,
            }
            .kind(),
            ErrorKind::InsufficientStock
        );
        assert_eq!(
            Error::unauthorized("not the receiver").kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            Error::RecallAlreadyActive { batch_id: 1 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("down".to_string())).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = Error::InsufficientStock {
            batch_id: 3,
            holder_id: 9,
            available: 7,
            requested: 8,
        };
        let message = err.to_string();
        assert!(message.starts_with("Insufficient stock"));
        assert!(message.contains("7 available"));
        assert!(message.contains("8 requested"));
    }
}
