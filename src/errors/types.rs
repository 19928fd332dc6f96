//! Error type definitions for the sales loader
//!
//! Row-level errors (`ValidationError`, `PersistenceError`, `RowError`) are
//! recorded and skipped by the batch loader. Batch-level errors
//! (`SourceReadError`, `TruncationError`) end a refresh and surface through
//! `RefreshError`.

use std::time::Duration;
use thiserror::Error;

use crate::models::{PersistenceStage, SalesField};

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// A single source row failed type or format constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {row}: invalid {field}: {cause}")]
pub struct ValidationError {
    pub row: usize,
    pub field: SalesField,
    pub cause: String,
}

/// One stage of a row's unit of work failed; the row was rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {row}: {stage} failed: {cause}")]
pub struct PersistenceError {
    pub row: usize,
    pub stage: PersistenceStage,
    pub cause: String,
}

/// Why a row was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Row {row}: write did not finish within {after:?}")]
    TimedOut { row: usize, after: Duration },
}

/// The source file could not be opened or fully read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to read source {path}: {cause}")]
pub struct SourceReadError {
    pub path: String,
    pub cause: String,
}

/// A step of the truncate unit of work failed; nothing was truncated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Truncation failed at {step}: {cause}")]
pub struct TruncationError {
    pub step: String,
    pub cause: String,
}

/// Errors that end a refresh cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error(transparent)]
    Truncation(#[from] TruncationError),

    #[error(transparent)]
    SourceRead(#[from] SourceReadError),

    #[error("Refresh did not finish within {0:?}")]
    TimedOut(Duration),
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl ValidationError {
    pub fn new<C: Into<String>>(row: usize, field: SalesField, cause: C) -> Self {
        Self {
            row,
            field,
            cause: cause.into(),
        }
    }
}

impl PersistenceError {
    pub fn new<C: ToString>(row: usize, stage: PersistenceStage, cause: C) -> Self {
        Self {
            row,
            stage,
            cause: cause.to_string(),
        }
    }
}

impl RowError {
    /// Source row index the error belongs to
    pub fn row(&self) -> usize {
        match self {
            Self::Validation(e) => e.row,
            Self::Persistence(e) => e.row,
            Self::TimedOut { row, .. } => *row,
        }
    }
}

impl SourceReadError {
    pub fn new<P: Into<String>, C: ToString>(path: P, cause: C) -> Self {
        Self {
            path: path.into(),
            cause: cause.to_string(),
        }
    }
}

impl TruncationError {
    pub fn new<S: Into<String>, C: ToString>(step: S, cause: C) -> Self {
        Self {
            step: step.into(),
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_messages_name_row_and_field() {
        let err: RowError =
            ValidationError::new(4, SalesField::QuantitySold, "invalid digit found in string")
                .into();
        assert_eq!(err.row(), 4);
        assert_eq!(
            err.to_string(),
            "Row 4: invalid quantity_sold: invalid digit found in string"
        );

        let err: RowError =
            PersistenceError::new(9, PersistenceStage::OrderItem, "constraint failed").into();
        assert_eq!(err.row(), 9);
        assert_eq!(
            err.to_string(),
            "Row 9: insert order_item failed: constraint failed"
        );
    }

    #[test]
    fn test_refresh_error_is_transparent() {
        let err: RefreshError = TruncationError::new("products", "locked").into();
        assert_eq!(err.to_string(), "Truncation failed at products: locked");

        let err: RefreshError = SourceReadError::new("sales.csv", "No such file").into();
        assert_eq!(err.to_string(), "Failed to read source sales.csv: No such file");
    }
}
