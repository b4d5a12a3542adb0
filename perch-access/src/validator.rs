//! Access validation.
//!
//! Strict allow-list, default-deny: a privileged caller may switch to any
//! enabled tenant; a standard caller only to enabled tenants it holds an
//! assignment row for. No other path grants access.

use std::sync::Arc;

use tracing::debug;

use perch_core::{Role, SwitchError, SwitchResult, TenantId, TenantRecord, UserId};

use crate::directory::{ProfileDirectory, TenantDirectory};

/// A positive access decision: the caller's role plus the tenant's public
/// record.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessGrant {
    pub role: Role,
    pub tenant: TenantRecord,
}

/// Decides whether a caller may activate a tenant.
pub struct AccessValidator {
    profiles: Arc<dyn ProfileDirectory>,
    tenants: Arc<dyn TenantDirectory>,
}

impl AccessValidator {
    pub fn new(profiles: Arc<dyn ProfileDirectory>, tenants: Arc<dyn TenantDirectory>) -> Self {
        Self { profiles, tenants }
    }

    /// Full validation for a switch attempt.
    ///
    /// Error mapping:
    /// - missing profile -> `ProfileNotFound` (integrity, not permission)
    /// - standard caller without an assignment -> `AccessDenied`, always,
    ///   regardless of the tenant's state (an unassigned caller learns
    ///   nothing about the tenant, not even whether it exists)
    /// - missing tenant -> `TenantNotFound`
    /// - disabled tenant -> `TenantDisabled` (both roles)
    pub async fn validate(&self, user: &UserId, target: &TenantId) -> SwitchResult<AccessGrant> {
        let profile = self
            .profiles
            .find_profile(user)
            .await?
            .ok_or(SwitchError::ProfileNotFound)?;

        match profile.role {
            Role::Privileged => {
                let tenant = self.check_tenant_enabled(target).await?;
                debug!(user = %user, tenant = %target, "privileged access granted");
                Ok(AccessGrant {
                    role: Role::Privileged,
                    tenant,
                })
            }
            Role::Standard => {
                let assigned = self.tenants.assigned_tenants(user).await?;
                if !assigned.contains(target) {
                    return Err(SwitchError::AccessDenied);
                }
                let tenant = self.check_tenant_enabled(target).await?;
                debug!(user = %user, tenant = %target, "assigned access granted");
                Ok(AccessGrant {
                    role: Role::Standard,
                    tenant,
                })
            }
        }
    }

    /// Re-check that the tenant still exists and is enabled.
    ///
    /// The coordinator calls this again inside the lock to close the
    /// check-then-act window between first validation and the context
    /// write.
    pub async fn check_tenant_enabled(&self, target: &TenantId) -> SwitchResult<TenantRecord> {
        let tenant = self
            .tenants
            .find_tenant(target)
            .await?
            .ok_or(SwitchError::TenantNotFound)?;
        if !tenant.enabled {
            return Err(SwitchError::TenantDisabled);
        }
        Ok(tenant)
    }
}
