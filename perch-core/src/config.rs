//! # Perch configuration
//!
//! A typed configuration struct with sensible defaults. Perch core is
//! intentionally environment-agnostic: applications may layer configuration
//! however they like, and `apply_env` offers one recommended convention
//! (`PERCH__LOCK__WAIT_MS=3000` style double-underscore keys) without
//! locking anyone into a file format.

use std::time::Duration;

/// Tunables for the switch path.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    /// Bounded wait for the per-user lock before giving up with LockTimeout
    pub lock_wait_timeout: Duration,
    /// TTL stamped on a held lock; backstop for a crashed holder
    pub lock_ttl: Duration,
    /// Poll interval while waiting for a contended lock
    pub lock_retry_interval: Duration,
    /// TTL for the stored session context; None means store default
    pub session_ttl: Option<Duration>,
    /// Capacity of the audit dispatch channel
    pub audit_capacity: usize,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            lock_wait_timeout: Duration::from_secs(3),
            lock_ttl: Duration::from_secs(10),
            lock_retry_interval: Duration::from_millis(50),
            session_ttl: Some(Duration::from_secs(24 * 60 * 60)),
            audit_capacity: 256,
        }
    }
}

impl SwitchConfig {
    /// Overlay values from `PERCH__`-prefixed environment variables.
    ///
    /// Recognized keys:
    /// - `PERCH__LOCK__WAIT_MS`
    /// - `PERCH__LOCK__TTL_MS`
    /// - `PERCH__LOCK__RETRY_MS`
    /// - `PERCH__SESSION__TTL_SECS` (0 disables the session TTL)
    /// - `PERCH__AUDIT__CAPACITY`
    ///
    /// Unparseable values are ignored and the default stands.
    pub fn apply_env(mut self) -> Self {
        if let Some(ms) = env_u64("PERCH__LOCK__WAIT_MS") {
            self.lock_wait_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PERCH__LOCK__TTL_MS") {
            self.lock_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PERCH__LOCK__RETRY_MS") {
            self.lock_retry_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("PERCH__SESSION__TTL_SECS") {
            self.session_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(cap) = env_u64("PERCH__AUDIT__CAPACITY") {
            self.audit_capacity = cap as usize;
        }
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}
