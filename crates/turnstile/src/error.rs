//! Error types for permission evaluation
//!
//! This module defines the error surface of the crate using `thiserror`.
//! Every fallible operation returns `Result<T, PermissionError>`.
//!
//! # Error Variants
//!
//! - [`PermissionError::Unauthorized`]: the caller is not authenticated
//! - [`PermissionError::Forbidden`]: the caller is authenticated but denied
//! - [`PermissionError::CheckFailed`]: a check itself failed (database down,
//!   network error, ...), distinct from an orderly denial
//! - [`PermissionError::UnknownPermission`]: a registry lookup by name missed
//!
//! The [`Denial`] type carries a caller-supplied override for
//! [`authorize_or`](crate::Permission::authorize_or): a message, a ready
//! error, or a lazy factory invoked only when the denial actually happens.
//!
//! # Example
//!
//! ```rust
//! use turnstile::PermissionError;
//!
//! fn to_status(err: &PermissionError) -> u16 {
//!     if err.is_unauthorized() {
//!         401
//!     } else if err.is_forbidden() {
//!         403
//!     } else {
//!         500
//!     }
//! }
//!
//! assert_eq!(to_status(&PermissionError::unauthorized()), 401);
//! assert_eq!(to_status(&PermissionError::forbidden()), 403);
//! ```

use std::fmt;

use thiserror::Error;

/// The error type for all permission operations
///
/// Denials come in two kinds so callers can map them onto transport
/// semantics (401 vs 403) without string matching: [`Unauthorized`] for
/// missing authentication and [`Forbidden`] for insufficient rights.
/// A failing check is not a denial; it surfaces as [`CheckFailed`] and
/// propagates through every operator unchanged.
///
/// [`Unauthorized`]: PermissionError::Unauthorized
/// [`Forbidden`]: PermissionError::Forbidden
/// [`CheckFailed`]: PermissionError::CheckFailed
#[derive(Error, Debug)]
pub enum PermissionError {
    /// The caller is not authenticated
    ///
    /// Construct with [`unauthorized`](Self::unauthorized) for the default
    /// message or [`unauthorized_with`](Self::unauthorized_with) for a
    /// custom one.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but lacks the required permission
    ///
    /// This is what [`authorize`](crate::Permission::authorize) returns on
    /// an orderly denial, with the permission's name in the message.
    #[error("{0}")]
    Forbidden(String),

    /// A check failed to produce a verdict
    ///
    /// Wraps whatever the check's own code returned: a lost database
    /// connection, a deserialization error, a bug. The inner error is
    /// available via `source()`.
    #[error("permission check failed: {0}")]
    CheckFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A permission name was not found in a [`PermissionSet`](crate::set::PermissionSet)
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
}

impl PermissionError {
    /// An [`Unauthorized`](Self::Unauthorized) error with the default
    /// message (`"Authentication required"`)
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    /// An [`Unauthorized`](Self::Unauthorized) error with a custom message
    pub fn unauthorized_with(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// A [`Forbidden`](Self::Forbidden) error with the default message
    /// (`"Access forbidden"`)
    pub fn forbidden() -> Self {
        Self::Forbidden("Access forbidden".to_string())
    }

    /// A [`Forbidden`](Self::Forbidden) error with a custom message
    pub fn forbidden_with(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// A [`CheckFailed`](Self::CheckFailed) error wrapping an upstream failure
    ///
    /// Accepts anything convertible into a boxed error, including plain
    /// strings:
    ///
    /// ```rust
    /// use turnstile::PermissionError;
    ///
    /// let err = PermissionError::check_failed("user store unreachable");
    /// assert!(err.to_string().contains("user store unreachable"));
    /// ```
    pub fn check_failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::CheckFailed(err.into())
    }

    /// Whether this error is an authentication failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this error is an orderly permission denial
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

/// A caller-supplied override for what a denial turns into
///
/// [`authorize_or`](crate::Permission::authorize_or) takes `impl Into<Denial>`,
/// so all three forms read naturally at the call site:
///
/// ```rust
/// use turnstile::{Denial, PermissionError};
///
/// // a message: becomes a Forbidden error with that message
/// let d: Denial = "you cannot edit this post".into();
/// assert!(d.resolve().is_forbidden());
///
/// // a ready error: returned as-is
/// let d: Denial = PermissionError::unauthorized().into();
/// assert!(d.resolve().is_unauthorized());
///
/// // a lazy factory: invoked only when the denial happens
/// let d = Denial::with(|| PermissionError::forbidden_with("editors only"));
/// assert_eq!(d.resolve().to_string(), "editors only");
/// ```
pub struct Denial(DenialKind);

enum DenialKind {
    Message(String),
    Error(PermissionError),
    Factory(Box<dyn FnOnce() -> PermissionError + Send>),
}

impl Denial {
    /// A denial backed by a lazy error factory
    ///
    /// The factory runs only when the permission actually denies, so an
    /// expensive error (say, one that formats a large context) costs
    /// nothing on the granted path.
    pub fn with(factory: impl FnOnce() -> PermissionError + Send + 'static) -> Self {
        Self(DenialKind::Factory(Box::new(factory)))
    }

    /// Turn this denial into the error to return
    pub fn resolve(self) -> PermissionError {
        match self.0 {
            DenialKind::Message(message) => PermissionError::Forbidden(message),
            DenialKind::Error(err) => err,
            DenialKind::Factory(factory) => factory(),
        }
    }
}

impl From<&str> for Denial {
    fn from(message: &str) -> Self {
        Self(DenialKind::Message(message.to_string()))
    }
}

impl From<String> for Denial {
    fn from(message: String) -> Self {
        Self(DenialKind::Message(message))
    }
}

impl From<PermissionError> for Denial {
    fn from(err: PermissionError) -> Self {
        Self(DenialKind::Error(err))
    }
}

impl fmt::Debug for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            DenialKind::Message(message) => f.debug_tuple("Denial").field(message).finish(),
            DenialKind::Error(err) => f.debug_tuple("Denial").field(err).finish(),
            DenialKind::Factory(_) => f.write_str("Denial(<factory>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_default_message() {
        let err = PermissionError::unauthorized();
        assert_eq!(err.to_string(), "Authentication required");
        assert!(err.is_unauthorized());
        assert!(!err.is_forbidden());
    }

    #[test]
    fn test_unauthorized_custom_message() {
        let err = PermissionError::unauthorized_with("token expired");
        assert_eq!(err.to_string(), "token expired");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_forbidden_default_message() {
        let err = PermissionError::forbidden();
        assert_eq!(err.to_string(), "Access forbidden");
        assert!(err.is_forbidden());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_forbidden_custom_message() {
        let err = PermissionError::forbidden_with("admins only");
        assert_eq!(err.to_string(), "admins only");
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_check_failed_from_string() {
        let err = PermissionError::check_failed("database unreachable");
        assert_eq!(
            err.to_string(),
            "permission check failed: database unreachable"
        );
        assert!(!err.is_forbidden());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_check_failed_preserves_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = PermissionError::check_failed(io_err);

        let source = std::error::Error::source(&err).expect("source should be set");
        assert!(source.to_string().contains("refused"));
    }

    #[test]
    fn test_unknown_permission_message() {
        let err = PermissionError::UnknownPermission("canEdit".to_string());
        assert_eq!(err.to_string(), "unknown permission: canEdit");
    }

    #[test]
    fn test_denial_from_str_is_forbidden() {
        let denial: Denial = "no access to drafts".into();
        let err = denial.resolve();
        assert!(err.is_forbidden());
        assert_eq!(err.to_string(), "no access to drafts");
    }

    #[test]
    fn test_denial_from_string() {
        let denial: Denial = String::from("nope").into();
        assert_eq!(denial.resolve().to_string(), "nope");
    }

    #[test]
    fn test_denial_from_error_passes_through() {
        let denial: Denial = PermissionError::unauthorized().into();
        let err = denial.resolve();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Authentication required");
    }

    #[test]
    fn test_denial_factory_runs_on_resolve() {
        let denial = Denial::with(|| PermissionError::forbidden_with("built lazily"));
        assert_eq!(denial.resolve().to_string(), "built lazily");
    }

    #[test]
    fn test_denial_debug_formats() {
        let denial: Denial = "msg".into();
        assert!(format!("{denial:?}").contains("msg"));

        let denial = Denial::with(PermissionError::forbidden);
        assert_eq!(format!("{denial:?}"), "Denial(<factory>)");
    }
}
