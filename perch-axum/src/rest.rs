use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::HeaderMap,
    routing, Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::warn;

use perch_core::{SwitchError, TenantId, TenantRecord, UserId};
use perch_store::SessionStore;
use perch_switch::{CallerIdentity, SwitchTiming};

use crate::{PerchAxumError, PerchState};

/// Identity an upstream auth middleware placed in the request extensions.
/// A request without one never reaches the coordinator.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: UserId,
    pub session_id: Option<String>,
}

/// Request body: the target tenant.
#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub tenant_id: String,
}

/// The envelope the browser consumes.
#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TenantRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<SwitchTiming>,
}

fn map_json_rejection(rejection: JsonRejection) -> PerchAxumError {
    warn!(error = %rejection, "rejected switch request body");
    PerchAxumError::BadRequest("Failed to parse the request body as JSON".to_string())
}

/// Network context for audit, proxy-aware: first hop of x-forwarded-for.
fn source_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.to_string())
}

/// `POST` handler: make the requested tenant the caller's active context.
pub async fn switch_tenant<S: SessionStore + 'static>(
    State(state): State<PerchState<S>>,
    headers: HeaderMap,
    auth: Option<Extension<AuthedUser>>,
    data: Result<Json<SwitchRequest>, JsonRejection>,
) -> Result<Json<SwitchResponse>, PerchAxumError> {
    let Some(Extension(auth)) = auth else {
        return Err(SwitchError::Unauthenticated.into());
    };
    let Json(request) = data.map_err(map_json_rejection)?;

    let mut caller = CallerIdentity::new(auth.user_id);
    caller.session_id = auth.session_id;
    caller.source_ip = source_ip(&headers);
    caller.user_agent = user_agent(&headers);

    let outcome = state
        .coordinator
        .switch(&caller, &TenantId::from(request.tenant_id))
        .await?;

    Ok(Json(SwitchResponse {
        success: true,
        data: Some(outcome.tenant),
        error: None,
        timing: Some(outcome.timing),
    }))
}

/// Build the switch router on top of a configured state.
pub fn router<S: SessionStore + 'static>(state: PerchState<S>) -> Router<()> {
    Router::new()
        .route("/session/switch", routing::post(switch_tenant::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
