//! # perch-store: session state with a real mutual-exclusion primitive
//!
//! Holds, per authenticated user, which tenant is currently active, and
//! serializes concurrent switch attempts for the same user with an
//! owner-token lock.
//!
//! The one property that makes the Redis backend meaningfully different
//! from an in-process mutex: for a single user id, at most one critical
//! section runs at a time **system-wide**, across every server instance.
//! Lock waits are bounded (no queue), and a store outage fails closed
//! rather than silently allowing unsynchronized access.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use perch_core::{TenantId, UserId};
//! use perch_store::{backend::memory::MemoryStore, with_session_lock, SessionStore, StoreError};
//!
//! # async fn demo() -> Result<(), StoreError> {
//! let store = MemoryStore::new();
//! let user = UserId::from("u1");
//!
//! let ctx = with_session_lock(
//!     &store,
//!     &user,
//!     Duration::from_secs(10),      // lock ttl
//!     Duration::from_secs(3),       // bounded wait
//!     Duration::from_millis(50),    // retry interval
//!     || async {
//!         store.set_active_tenant(&user, &TenantId::from("7"), None).await
//!     },
//! )
//! .await?;
//! assert_eq!(ctx.active_tenant_id, TenantId::from("7"));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod lock;

pub use backend::{with_session_lock, SessionStore};
pub use error::{StoreError, StoreResult};
pub use lock::LockToken;

#[cfg(feature = "redis")]
pub use backend::redis::RedisStore;

pub use backend::memory::MemoryStore;
