//! perch-access: default-deny tenant authorization.
//!
//! Answers one question: may this caller make that tenant its active
//! context? The relational and auth backends stay behind the
//! [`ProfileDirectory`] and [`TenantDirectory`] traits, consumed as black
//! boxes, so the validator is testable against in-memory fixtures and
//! swappable against any store.

pub mod directory;
pub mod validator;

pub use directory::{MemoryDirectory, ProfileDirectory, TenantDirectory};
pub use validator::{AccessGrant, AccessValidator};
