use perch_core::SwitchError;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure errors for session store operations
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The backing store is unreachable. Callers must treat this as
    /// fail-closed: no lock, no unsynchronized access.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// The bounded wait for the per-user lock expired.
    #[error("Lock wait timed out")]
    LockTimeout,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<StoreError> for SwitchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout => SwitchError::LockTimeout,
            StoreError::Unavailable(detail) => SwitchError::Unavailable(detail),
            StoreError::Serialization(detail) | StoreError::Internal(detail) => {
                SwitchError::Internal(detail)
            }
        }
    }
}
