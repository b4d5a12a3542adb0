//! Core multi-tenant types for Perch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stable identifier for an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A tenant ("business") identifier.
/// Later this can be a UUID, slug, or composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Coarse role classification for a principal.
///
/// `Privileged` bypasses per-tenant assignment checks; `Standard` only ever
/// sees tenants it is explicitly assigned to. Every call site matches
/// exhaustively so adding a role is a compile error until handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Privileged,
    #[default]
    Standard,
}

impl Role {
    /// Normalize a role read from an external profile store.
    ///
    /// Profiles with a missing role are treated as `Standard` everywhere.
    pub fn normalize(role: Option<Role>) -> Role {
        role.unwrap_or_default()
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Privileged)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Privileged => write!(f, "privileged"),
            Role::Standard => write!(f, "standard"),
        }
    }
}

/// Public record of a tenant, safe to hand back to the browser.
///
/// This is the value a successful switch returns. It deliberately carries
/// only display fields; internal tenant state stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: TenantId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub enabled: bool,
}

impl TenantRecord {
    /// Convenience constructor for an enabled tenant with display name only.
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
            city: None,
            state: None,
            enabled: true,
        }
    }

    pub fn with_locality(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A principal's profile as read from the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub role: Role,
}

impl Profile {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// Ephemeral per-user record of the currently active tenant.
///
/// Lives only in the session store, never in the system of record.
/// At most one active tenant per user at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub active_tenant_id: TenantId,
    pub updated_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(active_tenant_id: TenantId) -> Self {
        Self {
            active_tenant_id,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_normalize_defaults_to_standard() {
        assert_eq!(Role::normalize(None), Role::Standard);
        assert_eq!(Role::normalize(Some(Role::Privileged)), Role::Privileged);
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Privileged).unwrap(),
            "\"privileged\""
        );
        let parsed: Role = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(parsed, Role::Standard);
    }

    #[test]
    fn session_context_round_trips() {
        let ctx = SessionContext::new(TenantId::from("7"));
        let json = serde_json::to_string(&ctx).unwrap();
        let back: SessionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn tenant_record_skips_empty_display_fields() {
        let json = serde_json::to_value(TenantRecord::new("7", "Acme Roofing")).unwrap();
        assert!(json.get("avatar_url").is_none());
        assert!(json.get("city").is_none());
        assert_eq!(json["enabled"], true);
    }
}
