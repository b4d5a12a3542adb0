//! Best-effort cache invalidation hook.
//!
//! After a successful switch the UI routes scoped to the new tenant are
//! stale. Invalidation is observability-adjacent plumbing: a failure is
//! logged by the coordinator and never turns a successful switch into an
//! error.

use async_trait::async_trait;
use parking_lot::Mutex;

/// Invalidate cached routes matching a path pattern.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, path_pattern: &str) -> anyhow::Result<()>;
}

/// Does nothing. The default when no cache layer is wired in.
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(&self, _path_pattern: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records invalidated patterns for tests.
pub struct RecordingInvalidator {
    patterns: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self {
            patterns: Mutex::new(Vec::new()),
        }
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.patterns.lock().clone()
    }
}

impl Default for RecordingInvalidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingInvalidator {
    async fn invalidate(&self, path_pattern: &str) -> anyhow::Result<()> {
        self.patterns.lock().push(path_pattern.to_string());
        Ok(())
    }
}
