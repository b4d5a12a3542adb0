use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner token for a held per-user lock.
///
/// Release is owner-checked: only the holder that acquired the lock can
/// release it, so a slow holder whose lock expired cannot clobber the next
/// holder's lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(pub String);

impl LockToken {
    /// Generate a new unique lock token
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LockToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LockToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for LockToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}
