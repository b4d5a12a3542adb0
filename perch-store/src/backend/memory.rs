use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use perch_core::{SessionContext, TenantId, UserId};

use crate::backend::SessionStore;
use crate::{LockToken, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct LockEntry {
    token: LockToken,
    expires_at: DateTime<Utc>,
}

/// In-memory backend for testing and development.
///
/// Same owner-token and TTL-expiry semantics as the Redis backend, but
/// process-local: it serializes holders within one process only. Session
/// TTLs are not enforced here; entries live until overwritten or cleared.
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<UserId, SessionContext>>>,
    locks: Arc<RwLock<HashMap<UserId, LockEntry>>>,

    /// Failure injection: after `fail_skip` more operations succeed, the
    /// next `fail_remaining` operations report the store as unavailable.
    fail_skip: Arc<AtomicUsize>,
    fail_remaining: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(RwLock::new(HashMap::new())),
            fail_skip: Arc::new(AtomicUsize::new(0)),
            fail_remaining: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Test hook: make the next `n` operations fail with `Unavailable`.
    pub fn fail_next_ops(&self, n: usize) {
        self.fail_after_ops(0, n);
    }

    /// Test hook: let `skip` operations succeed, then fail the next `n`.
    pub fn fail_after_ops(&self, skip: usize, n: usize) {
        self.fail_skip.store(skip, Ordering::SeqCst);
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Test hook: force the user's held lock to expire immediately.
    pub fn force_lock_expiry(&self, user: &UserId) {
        if let Some(entry) = self.locks.write().get_mut(user) {
            entry.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    /// Test hook: whether a live (unexpired) lock is currently held.
    pub fn lock_held(&self, user: &UserId) -> bool {
        self.locks
            .read()
            .get(user)
            .map(|entry| entry.expires_at > Utc::now())
            .unwrap_or(false)
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let skip = self.fail_skip.load(Ordering::SeqCst);
        if skip > 0 {
            self.fail_skip.store(skip - 1, Ordering::SeqCst);
            return Ok(());
        }
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get_active_tenant(&self, user: &UserId) -> StoreResult<Option<SessionContext>> {
        self.check_injected_failure()?;
        Ok(self.sessions.read().get(user).cloned())
    }

    async fn set_active_tenant(
        &self,
        user: &UserId,
        tenant: &TenantId,
        _ttl: Option<Duration>,
    ) -> StoreResult<SessionContext> {
        self.check_injected_failure()?;
        let ctx = SessionContext::new(tenant.clone());
        self.sessions.write().insert(user.clone(), ctx.clone());
        Ok(ctx)
    }

    async fn clear_active_tenant(&self, user: &UserId) -> StoreResult<()> {
        self.check_injected_failure()?;
        self.sessions.write().remove(user);
        Ok(())
    }

    async fn try_acquire_lock(
        &self,
        user: &UserId,
        ttl: Duration,
    ) -> StoreResult<Option<LockToken>> {
        self.check_injected_failure()?;
        let now = Utc::now();
        let mut locks = self.locks.write();

        if let Some(entry) = locks.get(user) {
            if entry.expires_at > now {
                return Ok(None);
            }
            // Expired holder: the slot is free to take over.
        }

        let token = LockToken::new();
        locks.insert(
            user.clone(),
            LockEntry {
                token: token.clone(),
                expires_at: now
                    + chrono::Duration::from_std(ttl)
                        .map_err(|e| StoreError::Internal(e.to_string()))?,
            },
        );
        Ok(Some(token))
    }

    async fn release_lock(&self, user: &UserId, token: &LockToken) -> StoreResult<bool> {
        self.check_injected_failure()?;
        let mut locks = self.locks.write();
        match locks.get(user) {
            Some(entry) if entry.token == *token => {
                locks.remove(user);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
