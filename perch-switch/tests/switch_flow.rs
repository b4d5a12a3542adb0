use std::sync::Arc;
use std::time::Duration;

use perch_access::{AccessValidator, MemoryDirectory};
use perch_core::{Profile, Role, SwitchConfig, SwitchError, TenantId, TenantRecord, UserId};
use perch_store::{MemoryStore, SessionStore};
use perch_switch::{
    CallerIdentity, MemoryAuditSink, RecordingInvalidator, SwitchCoordinator,
};

struct Harness {
    dir: Arc<MemoryDirectory>,
    store: Arc<MemoryStore>,
    sink: Arc<MemoryAuditSink>,
    invalidator: Arc<RecordingInvalidator>,
    coordinator: SwitchCoordinator<MemoryStore>,
}

fn test_config() -> SwitchConfig {
    SwitchConfig {
        lock_wait_timeout: Duration::from_millis(500),
        lock_ttl: Duration::from_secs(5),
        lock_retry_interval: Duration::from_millis(10),
        session_ttl: None,
        audit_capacity: 16,
    }
}

/// Test factory: u1 is standard and assigned to tenant 7 only; admin is
/// privileged with zero assignments; tenant 13 is disabled.
fn harness() -> Harness {
    let dir = Arc::new(MemoryDirectory::new());
    dir.insert_profile(Profile::new("u1", Role::Standard));
    dir.insert_profile(Profile::new("admin", Role::Privileged));
    dir.insert_tenant(TenantRecord::new("7", "Acme Roofing").with_locality("Denver", "CO"));
    dir.insert_tenant(TenantRecord::new("9", "Summit Exteriors"));
    dir.insert_tenant(TenantRecord::new("13", "Shut Down LLC").disabled());
    dir.assign("u1", "7");

    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemoryAuditSink::new());
    let invalidator = Arc::new(RecordingInvalidator::new());
    let validator = Arc::new(AccessValidator::new(dir.clone(), dir.clone()));

    let coordinator =
        SwitchCoordinator::with_config(store.clone(), validator, sink.clone(), test_config())
            .with_invalidator(invalidator.clone());

    Harness {
        dir,
        store,
        sink,
        invalidator,
        coordinator,
    }
}

fn u1() -> CallerIdentity {
    CallerIdentity::new("u1")
        .with_session_id("sess-u1")
        .with_source_ip("203.0.113.9")
        .with_user_agent("integration-test")
}

fn admin() -> CallerIdentity {
    CallerIdentity::new("admin")
}

/// The canonical scenario: assigned switch succeeds, unassigned switch is
/// denied, and the denial leaves the session untouched.
#[tokio::test]
async fn test_assigned_then_denied_keeps_session() {
    let h = harness();

    let outcome = h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();
    assert_eq!(outcome.tenant.id, TenantId::from("7"));
    assert_eq!(outcome.tenant.name, "Acme Roofing");
    assert_eq!(outcome.tenant.city.as_deref(), Some("Denver"));

    let denied = h.coordinator.switch(&u1(), &TenantId::from("9")).await;
    assert_eq!(denied, Err(SwitchError::AccessDenied));
    assert_eq!(denied.unwrap_err().client_message(), "Access denied");

    let session = h.store.get_active_tenant(&UserId::from("u1")).await.unwrap().unwrap();
    assert_eq!(session.active_tenant_id, TenantId::from("7"));
}

/// Privileged callers need no assignment rows.
#[tokio::test]
async fn test_privileged_bypass() {
    let h = harness();

    for target in ["7", "9"] {
        let outcome = h
            .coordinator
            .switch(&admin(), &TenantId::from(target))
            .await
            .unwrap();
        assert_eq!(outcome.tenant.id, TenantId::from(target));
    }
}

/// A disabled tenant is rejected for both roles, with no session write.
#[tokio::test]
async fn test_disabled_tenant_rejected() {
    let h = harness();
    h.dir.assign("u1", "13");

    for caller in [admin(), u1()] {
        let result = h.coordinator.switch(&caller, &TenantId::from("13")).await;
        assert_eq!(result, Err(SwitchError::TenantDisabled));
    }
    assert!(h
        .store
        .get_active_tenant(&UserId::from("admin"))
        .await
        .unwrap()
        .is_none());
}

/// N concurrent attempts for one user serialize: every attempt commits or
/// fails cleanly, and the final session value is exactly one attempt's
/// target, uncorrupted.
#[test_log::test(tokio::test)]
async fn test_concurrent_switches_serialize() {
    let h = harness();
    let coordinator = Arc::new(h.coordinator);
    let targets = ["7", "9", "7", "9", "7", "9"];

    let mut handles = Vec::new();
    for target in targets {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            coordinator.switch(&admin(), &TenantId::from(target)).await
        }));
    }

    for handle in handles {
        // Generous wait + short critical sections: nothing should time out.
        handle.await.unwrap().unwrap();
    }

    let session = h
        .store
        .get_active_tenant(&UserId::from("admin"))
        .await
        .unwrap()
        .unwrap();
    assert!(
        targets.contains(&session.active_tenant_id.as_str()),
        "final session {:?} must be one attempt's target",
        session.active_tenant_id
    );
    assert!(!h.store.lock_held(&UserId::from("admin")));
}

/// If the critical section fails partway through, the lock is released and
/// a subsequent attempt does not hang.
#[tokio::test]
async fn test_lock_released_after_critical_section_failure() {
    let h = harness();

    // Let the lock acquire succeed, then fail the context write.
    h.store.fail_after_ops(1, 1);
    let result = h.coordinator.switch(&u1(), &TenantId::from("7")).await;
    assert!(matches!(result, Err(SwitchError::Unavailable(_))));
    assert!(!h.store.lock_held(&UserId::from("u1")));

    // Retry goes straight through, well inside the lock wait bound.
    let outcome = h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();
    assert_eq!(outcome.tenant.id, TenantId::from("7"));
}

/// A held lock that never releases makes the attempt fail with a
/// retryable LockTimeout instead of queueing.
#[tokio::test]
async fn test_contended_lock_times_out() {
    let h = harness();
    h.store
        .try_acquire_lock(&UserId::from("u1"), Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();

    let result = h.coordinator.switch(&u1(), &TenantId::from("7")).await;

    assert_eq!(result, Err(SwitchError::LockTimeout));
    assert!(result.unwrap_err().is_retryable());
}

/// A tenant disabled between first validation and lock acquisition is
/// caught by the in-lock re-validation.
#[tokio::test]
async fn test_revalidation_catches_disable_race() {
    let h = harness();
    let user = UserId::from("admin");

    // Hold the lock so the switch has to wait.
    let token = h
        .store
        .try_acquire_lock(&user, Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();

    let coordinator = Arc::new(h.coordinator);
    let racing = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.switch(&admin(), &TenantId::from("9")).await })
    };

    // First validation has passed by now; disable the tenant, then let the
    // waiter in.
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.dir.set_tenant_enabled(&TenantId::from("9"), false);
    h.store.release_lock(&user, &token).await.unwrap();

    let result = racing.await.unwrap();
    assert_eq!(result, Err(SwitchError::TenantDisabled));
    assert!(h.store.get_active_tenant(&user).await.unwrap().is_none());
}

/// A failing audit sink never flips a successful switch into a failure.
#[tokio::test]
async fn test_audit_failure_does_not_fail_switch() {
    let h = harness();
    h.sink.set_failing(true);

    let outcome = h.coordinator.switch(&u1(), &TenantId::from("7")).await;

    assert!(outcome.is_ok());
    let session = h.store.get_active_tenant(&UserId::from("u1")).await.unwrap().unwrap();
    assert_eq!(session.active_tenant_id, TenantId::from("7"));
}

/// A successful switch records exactly one audit event carrying the
/// caller's network context.
#[tokio::test]
async fn test_audit_event_recorded() {
    let h = harness();

    h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();
    // Drain the dispatch channel.
    h.coordinator.shutdown().await;

    let events = h.sink.recorded();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.user_id, UserId::from("u1"));
    assert_eq!(event.tenant_id, TenantId::from("7"));
    assert_eq!(event.session_id.as_deref(), Some("sess-u1"));
    assert_eq!(event.source_ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(event.user_agent.as_deref(), Some("integration-test"));
}

/// Denied attempts leave no audit trail and no invalidation.
#[tokio::test]
async fn test_denied_attempt_has_no_side_effects() {
    let h = harness();

    let _ = h.coordinator.switch(&u1(), &TenantId::from("9")).await;
    h.coordinator.shutdown().await;

    assert!(h.sink.recorded().is_empty());
    assert!(h.invalidator.invalidated().is_empty());
}

/// Cache invalidation targets the new tenant's routes.
#[tokio::test]
async fn test_cache_invalidation_scoped_to_tenant() {
    let h = harness();

    h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();

    assert_eq!(h.invalidator.invalidated(), vec!["/tenant/7".to_string()]);
}

/// Read and clear passthroughs.
#[tokio::test]
async fn test_active_context_and_clear() {
    let h = harness();
    let user = UserId::from("u1");

    assert!(h.coordinator.active_context(&user).await.unwrap().is_none());

    h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();
    let ctx = h.coordinator.active_context(&user).await.unwrap().unwrap();
    assert_eq!(ctx.active_tenant_id, TenantId::from("7"));

    h.coordinator.clear_context(&user).await.unwrap();
    assert!(h.coordinator.active_context(&user).await.unwrap().is_none());
}

/// Timing diagnostics are present and internally consistent.
#[tokio::test]
async fn test_timing_diagnostics() {
    let h = harness();

    let outcome = h.coordinator.switch(&u1(), &TenantId::from("7")).await.unwrap();

    assert!(outcome.timing.total_ms >= outcome.timing.critical_section_ms);
    assert!(outcome.timing.total_ms < 500);
}
