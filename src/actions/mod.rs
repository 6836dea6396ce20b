//! Action boundary - the operations a front end calls.
//!
//! Each action runs one core operation and folds its outcome into an
//! [`ActionResult`]. Callers branch on `success` and `error_kind`; the
//! `message` and `error` strings are meant for people.

pub mod batch;
pub mod distribution;
pub mod recall;
pub mod sales;
pub mod trace;

use crate::errors::{Error, ErrorKind, Result};
use serde::Serialize;
use tracing::{error, warn};

/// Shown instead of the underlying message for infrastructure failures
const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on our side, please try again";

/// Uniform outcome of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T> {
    /// Whether the operation went through
    pub success: bool,
    /// Confirmation text on success
    pub message: Option<String>,
    /// Human-readable failure reason
    pub error: Option<String>,
    /// Failure category
    pub error_kind: Option<ErrorKind>,
    /// Payload on success
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    /// A successful outcome carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            error_kind: None,
            data: Some(data),
        }
    }

    /// A failed outcome. Infrastructure errors are logged in full and reported
    /// with a generic message; everything else is passed through.
    pub fn fail(err: &Error) -> Self {
        let kind = err.kind();
        let message = if kind == ErrorKind::Infrastructure {
            error!("Action failed: {}", err);
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            warn!("Action rejected: {}", err);
            err.to_string()
        };

        Self {
            success: false,
            message: None,
            error: Some(message),
            error_kind: Some(kind),
            data: None,
        }
    }

    /// Folds a core result, describing a success with `describe`.
    pub fn from_result(result: Result<T>, describe: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(data) => {
                let message = describe(&data);
                Self::ok(message, data)
            }
            Err(err) => Self::fail(&err),
        }
    }
}
