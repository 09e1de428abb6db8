//! Errors raised while mutating the route table.
//!
//! Dispatch never produces one of these: errors returned by handlers are
//! passed back to the caller untouched as a [`BoxError`].

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A type-erased error returned by handlers and propagated out of dispatch.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by route registration and removal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The route pattern could not be compiled.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern as given.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The method name is not a valid HTTP method token.
    #[error("invalid method name `{method}`")]
    InvalidMethod {
        /// The method name as given.
        method: String,
    },
}
