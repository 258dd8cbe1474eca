//! Convenience result type alias for Dockhand.

use crate::error::AppError;

/// A specialized `Result` type for Dockhand operations.
pub type AppResult<T> = Result<T, AppError>;
