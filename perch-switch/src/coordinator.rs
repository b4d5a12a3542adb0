use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use perch_access::AccessValidator;
use perch_core::{SessionContext, SwitchConfig, SwitchError, SwitchResult, TenantId, TenantRecord, UserId};
use perch_store::backend::with_session_lock;
use perch_store::SessionStore;

use crate::audit::{AuditDispatcher, AuditEvent, AuditSink};
use crate::invalidate::{CacheInvalidator, NoopInvalidator};

/// Caller identity established upstream of the coordinator.
///
/// The coordinator never authenticates; a request with no identity is
/// rejected as `Unauthenticated` before this type is ever constructed.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub session_id: Option<String>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
            source_ip: None,
            user_agent: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Timing diagnostics for one switch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchTiming {
    pub lock_wait_ms: u64,
    pub critical_section_ms: u64,
    pub total_ms: u64,
}

/// A committed switch: the new tenant's public record plus timings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchOutcome {
    pub tenant: TenantRecord,
    pub timing: SwitchTiming,
}

/// Serializes tenant context switches per user.
///
/// Algorithm, per attempt:
/// 1. validate access (fail fast, no state change)
/// 2. acquire the per-user lock with a bounded wait
/// 3. re-validate the tenant inside the lock (closes the check-then-act
///    window against a tenant being disabled between 1 and 2)
/// 4. write the session context
/// 5. release the lock on every exit path
/// 6. audit + cache invalidation, best-effort
pub struct SwitchCoordinator<S: SessionStore> {
    store: Arc<S>,
    validator: Arc<AccessValidator>,
    audit: AuditDispatcher,
    invalidator: Arc<dyn CacheInvalidator>,
    config: SwitchConfig,
}

impl<S: SessionStore + 'static> SwitchCoordinator<S> {
    /// Create a coordinator with default configuration.
    pub fn new(store: Arc<S>, validator: Arc<AccessValidator>, sink: Arc<dyn AuditSink>) -> Self {
        Self::with_config(store, validator, sink, SwitchConfig::default())
    }

    /// Create a coordinator with custom configuration.
    pub fn with_config(
        store: Arc<S>,
        validator: Arc<AccessValidator>,
        sink: Arc<dyn AuditSink>,
        config: SwitchConfig,
    ) -> Self {
        Self {
            store,
            validator,
            audit: AuditDispatcher::spawn(sink, config.audit_capacity),
            invalidator: Arc::new(NoopInvalidator),
            config,
        }
    }

    /// Wire in a cache invalidation hook.
    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    /// Attempt to make `target` the caller's active tenant.
    #[instrument(skip(self, caller), fields(user = %caller.user_id, tenant = %target))]
    pub async fn switch(
        &self,
        caller: &CallerIdentity,
        target: &TenantId,
    ) -> SwitchResult<SwitchOutcome> {
        let started = Instant::now();

        // Fail fast before any mutation.
        self.validator.validate(&caller.user_id, target).await?;

        let lock_started = Instant::now();
        let store = self.store.as_ref();
        let validator = &self.validator;
        let user = &caller.user_id;
        let session_ttl = self.config.session_ttl;

        let (tenant, acquired_at) = with_session_lock(
            store,
            user,
            self.config.lock_ttl,
            self.config.lock_wait_timeout,
            self.config.lock_retry_interval,
            || async move {
                let acquired_at = Instant::now();

                // The tenant may have been disabled while we waited.
                let tenant = validator.check_tenant_enabled(target).await?;

                store.set_active_tenant(user, target, session_ttl).await?;
                Ok::<_, SwitchError>((tenant, acquired_at))
            },
        )
        .await?;

        let finished = Instant::now();
        let timing = SwitchTiming {
            lock_wait_ms: acquired_at.duration_since(lock_started).as_millis() as u64,
            critical_section_ms: finished.duration_since(acquired_at).as_millis() as u64,
            total_ms: finished.duration_since(started).as_millis() as u64,
        };

        // From here on the switch has committed; nothing below may undo it.
        self.audit.emit(AuditEvent {
            session_id: caller.session_id.clone(),
            user_id: caller.user_id.clone(),
            tenant_id: target.clone(),
            source_ip: caller.source_ip.clone(),
            user_agent: caller.user_agent.clone(),
            at: Utc::now(),
        });

        if let Err(err) = self
            .invalidator
            .invalidate(&format!("/tenant/{}", target))
            .await
        {
            warn!(error = %err, "cache invalidation failed after committed switch");
        }

        info!(
            lock_wait_ms = timing.lock_wait_ms,
            total_ms = timing.total_ms,
            "tenant switch committed"
        );

        Ok(SwitchOutcome { tenant, timing })
    }

    /// Read the caller's current session context, if any.
    pub async fn active_context(&self, user: &UserId) -> SwitchResult<Option<SessionContext>> {
        Ok(self.store.get_active_tenant(user).await?)
    }

    /// Drop the caller's session context (logout/reset path).
    pub async fn clear_context(&self, user: &UserId) -> SwitchResult<()> {
        Ok(self.store.clear_active_tenant(user).await?)
    }

    /// Close the audit channel and wait for the backlog to drain.
    pub async fn shutdown(self) {
        self.audit.shutdown().await;
    }
}
