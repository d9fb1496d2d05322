//! The module contains the errors the engine can return.
//!
//! Every variant collapses onto one of four [`ErrorKind`]s, which is what
//! callers branch on:
//!
//! - [`Validation`] the request is malformed, nothing was read or written.
//! - [`NotFound`] a referenced wallet or transaction does not exist.
//! - [`InsufficientBalance`] an expense would drive a wallet below zero.
//! - [`Upstream`] the document store or the receipt uploader failed.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`NotFound`]: LedgerError::NotFound
//!  [`InsufficientBalance`]: LedgerError::InsufficientBalance
//!  [`Upstream`]: LedgerError::Upstream
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("{0}")]
    Upstream(String),
    /// A conditional write lost against a concurrent writer.
    #[error("\"{0}\" was modified concurrently")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`LedgerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientBalance,
    Upstream,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
            Self::Upstream(_)
            | Self::Conflict(_)
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Io(_) => ErrorKind::Upstream,
        }
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::Upstream(a), Self::Upstream(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_upstream() {
        let err = LedgerError::Database(DbErr::Custom("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(
            LedgerError::Conflict("w1".to_string()).kind(),
            ErrorKind::Upstream
        );
    }

    #[test]
    fn message_is_passed_through() {
        let err = LedgerError::Upstream("Failed to upload receipt".to_string());
        assert_eq!(err.to_string(), "Failed to upload receipt");
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
