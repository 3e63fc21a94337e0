//! # AppError
//!
//! Centralized error handling for the sort-product-views ecosystem.
//! The ranking itself never fails; these cover configuration and the
//! adapters around it.

use thiserror::Error;

/// The primary error type for all spv-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Validation failure (e.g., unknown view period, page 0)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Infrastructure failure (e.g., catalog database unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for sort-product-views logic.
pub type Result<T> = std::result::Result<T, AppError>;
