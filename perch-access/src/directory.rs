//! Collaborator seams for the relational store.
//!
//! Profile, tenant, and assignment data are read-only from the switch
//! path's perspective; nothing here writes to the system of record.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use perch_core::{Profile, SwitchResult, TenantId, TenantRecord, UserId};

/// Read access to user profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// `None` means the profile row is missing, which the validator treats
    /// as a data-integrity problem, not a permission decision.
    async fn find_profile(&self, user: &UserId) -> SwitchResult<Option<Profile>>;
}

/// Read access to tenants and user-tenant assignments.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_tenant(&self, tenant: &TenantId) -> SwitchResult<Option<TenantRecord>>;

    /// Tenants explicitly assigned to a standard-role user. Privileged
    /// users never consult this.
    async fn assigned_tenants(&self, user: &UserId) -> SwitchResult<Vec<TenantId>>;
}

/// In-memory directory for testing and development.
///
/// Implements both directory traits over plain maps.
pub struct MemoryDirectory {
    profiles: Arc<RwLock<HashMap<UserId, Profile>>>,
    tenants: Arc<RwLock<HashMap<TenantId, TenantRecord>>>,
    assignments: Arc<RwLock<HashMap<UserId, HashSet<TenantId>>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            tenants: Arc::new(RwLock::new(HashMap::new())),
            assignments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile);
    }

    pub fn insert_tenant(&self, tenant: TenantRecord) {
        self.tenants.write().insert(tenant.id.clone(), tenant);
    }

    /// Record an assignment row for (user, tenant).
    pub fn assign(&self, user: impl Into<UserId>, tenant: impl Into<TenantId>) {
        self.assignments
            .write()
            .entry(user.into())
            .or_default()
            .insert(tenant.into());
    }

    /// Test hook: flip a tenant's enabled flag in place.
    pub fn set_tenant_enabled(&self, tenant: &TenantId, enabled: bool) {
        if let Some(record) = self.tenants.write().get_mut(tenant) {
            record.enabled = enabled;
        }
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileDirectory for MemoryDirectory {
    async fn find_profile(&self, user: &UserId) -> SwitchResult<Option<Profile>> {
        Ok(self.profiles.read().get(user).cloned())
    }
}

#[async_trait]
impl TenantDirectory for MemoryDirectory {
    async fn find_tenant(&self, tenant: &TenantId) -> SwitchResult<Option<TenantRecord>> {
        Ok(self.tenants.read().get(tenant).cloned())
    }

    async fn assigned_tenants(&self, user: &UserId) -> SwitchResult<Vec<TenantId>> {
        Ok(self
            .assignments
            .read()
            .get(user)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
