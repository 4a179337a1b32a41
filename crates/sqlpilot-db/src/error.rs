//! Error types for database access.

use thiserror::Error;

/// Errors raised by the database client.
#[derive(Debug, Error)]
pub enum DbError {
    /// No backend driver matched the requested name.
    #[error("no database driver found matching '{0}'")]
    DriverNotFound(String),

    /// Credentials auth was selected but username or password is missing.
    #[error("username and password are required unless trusted auth is enabled")]
    CredentialsMissing,

    /// An input value failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation that needs a live connection was called without one.
    #[error("not connected to a database")]
    NotConnected,

    /// Opening the connection failed.
    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    /// Executing a query failed. Write statements are rolled back before
    /// this is returned.
    #[error("query execution failed: {0}")]
    QueryExecution(#[source] sqlx::Error),

    /// A result row could not be decoded into the expected shape.
    #[error("unable to decode result row: {0}")]
    Decode(#[source] serde_json::Error),
}
