//! Centralized error handling for the sales loader
//!
//! # Error Categories
//!
//! - **Row errors**: validation and persistence failures of a single source
//!   row. The row is skipped and the batch carries on.
//! - **Refresh errors**: source read and truncation failures. These end the
//!   refresh that hit them.
//! - **Application errors**: everything surfaced through the HTTP layer.
//!
//! # Usage
//!
//! ```rust
//! use sales_loader::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("start_date is required"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for refresh Results
pub type RefreshResult<T> = Result<T, RefreshError>;
