//! perch-axum: Axum adapter for Perch.
//!
//! Exposes the switch coordinator as a `POST /session/switch` route with
//! the `{success, data?, error?, timing?}` envelope the browser consumes.
//! Authentication happens upstream; this crate only reads the identity an
//! auth middleware placed in the request extensions.

pub mod rest;
pub mod state;
mod error;

pub use error::PerchAxumError;
pub use rest::{router, switch_tenant, AuthedUser, SwitchRequest, SwitchResponse};
pub use state::PerchState;
