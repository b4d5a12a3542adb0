pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;

use perch_core::{SessionContext, TenantId, UserId};

use crate::{LockToken, StoreError, StoreResult};

/// Backend trait for session state and the per-user lock primitive.
///
/// Implementations must guarantee, for a single user id, that at most one
/// acquired lock exists at a time across every process sharing the backend.
/// `try_acquire_lock` is a single non-blocking attempt; bounded waiting is
/// layered on top by [`with_session_lock`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the user's current session context, if any.
    async fn get_active_tenant(&self, user: &UserId) -> StoreResult<Option<SessionContext>>;

    /// Overwrite the user's active tenant. Only ever called while holding
    /// the user's lock; the store does not re-check that invariant.
    async fn set_active_tenant(
        &self,
        user: &UserId,
        tenant: &TenantId,
        ttl: Option<Duration>,
    ) -> StoreResult<SessionContext>;

    /// Drop the user's session context (logout/reset path).
    async fn clear_active_tenant(&self, user: &UserId) -> StoreResult<()>;

    /// One attempt to take the user's lock. Returns `None` when another
    /// holder currently owns it. The lock self-expires after `ttl` as a
    /// backstop for a crashed holder.
    async fn try_acquire_lock(&self, user: &UserId, ttl: Duration)
        -> StoreResult<Option<LockToken>>;

    /// Release the lock iff `token` still owns it. A stale token (expired
    /// and re-acquired by someone else) is a no-op returning `false`.
    async fn release_lock(&self, user: &UserId, token: &LockToken) -> StoreResult<bool>;
}

/// Acquire the per-user lock with a bounded wait.
///
/// Polls `try_acquire_lock` every `retry_interval` until `wait_timeout`
/// elapses, then fails with [`StoreError::LockTimeout`]. A store outage
/// propagates immediately: no lock means no critical section.
pub async fn acquire_lock_bounded<S>(
    store: &S,
    user: &UserId,
    ttl: Duration,
    wait_timeout: Duration,
    retry_interval: Duration,
) -> StoreResult<LockToken>
where
    S: SessionStore + ?Sized,
{
    let deadline = Instant::now() + wait_timeout;
    loop {
        if let Some(token) = store.try_acquire_lock(user, ttl).await? {
            return Ok(token);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(StoreError::LockTimeout);
        }
        tokio::time::sleep(retry_interval.min(deadline - now)).await;
    }
}

/// Run `critical` while holding the user's lock.
///
/// The lock is released on every exit path, success or error; a failed
/// release is logged and swallowed because the TTL reclaims the lock and
/// the critical section's outcome is already decided. If the task panics
/// mid-section the TTL is the recovery path.
pub async fn with_session_lock<S, F, Fut, T, E>(
    store: &S,
    user: &UserId,
    ttl: Duration,
    wait_timeout: Duration,
    retry_interval: Duration,
    critical: F,
) -> Result<T, E>
where
    S: SessionStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<StoreError>,
{
    let token = acquire_lock_bounded(store, user, ttl, wait_timeout, retry_interval)
        .await
        .map_err(E::from)?;

    let result = critical().await;

    if let Err(err) = store.release_lock(user, &token).await {
        warn!(user = %user, error = %err, "lock release failed; ttl will reclaim it");
    }

    result
}
