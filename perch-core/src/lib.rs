//! perch-core: shared domain types for the Perch switching toolkit.
//!
//! Perch coordinates which tenant an authenticated user is currently
//! "looking at" in a multi-tenant application. This crate carries the
//! vocabulary every other Perch crate speaks: identifiers, the role
//! classification, the tenant public record, the session context value,
//! the switch error taxonomy, and typed configuration.

pub mod config;
pub mod errors;
pub mod tenant;

pub use config::SwitchConfig;
pub use errors::{SwitchError, SwitchResult};
pub use tenant::{Profile, Role, SessionContext, TenantId, TenantRecord, UserId};
