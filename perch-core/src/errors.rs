//! # Switch errors
//!
//! One taxonomy for the whole switch path. Core goals:
//! - validation failures are distinguishable from infrastructure failures
//! - every variant knows its HTTP status and its client-safe message
//! - internals (profile integrity, store detail) never leak to the browser

use thiserror::Error;

/// Result type for switch operations
pub type SwitchResult<T> = Result<T, SwitchError>;

/// Everything that can go wrong while switching tenant context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// No valid caller identity. Surfaced to the caller; upstream redirects
    /// to login.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The caller's profile row is missing. A data-integrity problem, not a
    /// permission decision; clients see a generic denial.
    #[error("Profile not found for user")]
    ProfileNotFound,

    /// The caller lacks permission for the target tenant.
    #[error("Access denied")]
    AccessDenied,

    /// The target tenant does not exist.
    #[error("Business not found")]
    TenantNotFound,

    /// The target tenant exists but is not enabled for the dashboard.
    #[error("Business is not available")]
    TenantDisabled,

    /// The per-user lock could not be acquired within the bounded wait,
    /// either through contention or a session-store outage.
    #[error("Switch already in progress, please retry")]
    LockTimeout,

    /// The session store is unreachable. Fails closed.
    #[error("Session store unavailable")]
    Unavailable(String),

    /// Anything unexpected. Logged with detail server-side, generic to
    /// clients.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwitchError {
    /// HTTP status code for the transport seam.
    pub fn status_code(&self) -> u16 {
        match self {
            SwitchError::Unauthenticated => 401,
            SwitchError::ProfileNotFound => 403,
            SwitchError::AccessDenied => 403,
            SwitchError::TenantNotFound => 404,
            SwitchError::TenantDisabled => 404,
            SwitchError::LockTimeout => 409,
            SwitchError::Unavailable(_) => 503,
            SwitchError::Internal(_) => 500,
        }
    }

    /// Message safe to return to the browser.
    ///
    /// `ProfileNotFound` surfaces as a generic denial and `Internal` /
    /// `Unavailable` drop their detail strings.
    pub fn client_message(&self) -> &'static str {
        match self {
            SwitchError::Unauthenticated => "Not authenticated",
            SwitchError::ProfileNotFound => "Access denied",
            SwitchError::AccessDenied => "Access denied",
            SwitchError::TenantNotFound => "Business not found",
            SwitchError::TenantDisabled => "Business is not available",
            SwitchError::LockTimeout => "Switch already in progress, please retry",
            SwitchError::Unavailable(_) => "Service temporarily unavailable",
            SwitchError::Internal(_) => "Something went wrong",
        }
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwitchError::LockTimeout | SwitchError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_not_found_is_sanitized() {
        let err = SwitchError::ProfileNotFound;
        assert_eq!(err.client_message(), "Access denied");
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn internal_detail_never_reaches_clients() {
        let err = SwitchError::Internal("redis://10.0.0.3 refused".into());
        assert_eq!(err.client_message(), "Something went wrong");
    }

    #[test]
    fn only_contention_and_outage_are_retryable() {
        assert!(SwitchError::LockTimeout.is_retryable());
        assert!(SwitchError::Unavailable("down".into()).is_retryable());
        assert!(!SwitchError::AccessDenied.is_retryable());
        assert!(!SwitchError::TenantDisabled.is_retryable());
    }
}
