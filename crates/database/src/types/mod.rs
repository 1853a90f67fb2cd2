//! Shared result and error types for the database layer.

pub mod errors;

pub use errors::{ChatError, DatabaseError, UserError};

/// Result type for database setup operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Result type for user directory operations
pub type UserResult<T> = Result<T, UserError>;

/// Result type for conversation store operations
pub type ChatResult<T> = Result<T, ChatError>;
