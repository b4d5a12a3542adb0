//! Fire-and-forget audit trail.
//!
//! Callers hand events to a bounded channel and move on; a background
//! drain task delivers them to the configured sink. The "must not affect
//! the main result" contract is structural: `emit` cannot block and cannot
//! fail the switch, whatever the sink does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use perch_core::{TenantId, UserId};

/// One switch, recorded: who moved to which tenant, from where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub session_id: Option<String>,
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub at: DateTime<Utc>,
}

/// Destination for audit events. Delivery failures stay inside the drain
/// task; callers never see them.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()>;
}

/// Non-blocking dispatch in front of an [`AuditSink`].
pub struct AuditDispatcher {
    tx: mpsc::Sender<AuditEvent>,
    drain: JoinHandle<()>,
}

impl AuditDispatcher {
    /// Spawn the drain task. `capacity` bounds the in-flight backlog; a
    /// full channel drops the newest event rather than blocking a switch.
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEvent>(capacity.max(1));
        let drain = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = sink.record(event).await {
                    warn!(error = %err, "audit sink failed; event dropped");
                }
            }
        });
        Self { tx, drain }
    }

    /// Hand off an event without waiting.
    pub fn emit(&self, event: AuditEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("audit channel full or closed; event dropped");
        }
    }

    /// Close the channel and wait for the backlog to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.drain.await;
    }
}

/// Sink that writes a structured log line per event.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        info!(
            target: "perch::audit",
            user = %event.user_id,
            tenant = %event.tenant_id,
            session = event.session_id.as_deref().unwrap_or("-"),
            source_ip = event.source_ip.as_deref().unwrap_or("-"),
            user_agent = event.user_agent.as_deref().unwrap_or("-"),
            at = %event.at,
            "tenant switch"
        );
        Ok(())
    }
}

/// Collecting sink for tests, with a failure toggle.
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `record` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("audit sink unreachable");
        }
        self.events.lock().push(event);
        Ok(())
    }
}
