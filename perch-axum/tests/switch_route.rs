use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use perch_access::{AccessValidator, MemoryDirectory};
use perch_axum::{router, AuthedUser, PerchState};
use perch_core::{Profile, Role, TenantRecord, UserId};
use perch_store::MemoryStore;
use perch_switch::{MemoryAuditSink, SwitchCoordinator};

fn app(authed: Option<AuthedUser>) -> Router {
    let dir = Arc::new(MemoryDirectory::new());
    dir.insert_profile(Profile::new("u1", Role::Standard));
    dir.insert_tenant(TenantRecord::new("7", "Acme Roofing"));
    dir.insert_tenant(TenantRecord::new("9", "Summit Exteriors"));
    dir.insert_tenant(TenantRecord::new("13", "Shut Down LLC").disabled());
    dir.assign("u1", "7");
    dir.assign("u1", "13");

    let validator = Arc::new(AccessValidator::new(dir.clone(), dir));
    let coordinator = SwitchCoordinator::new(
        Arc::new(MemoryStore::new()),
        validator,
        Arc::new(MemoryAuditSink::new()),
    );

    let routes = router(PerchState::new(coordinator));
    match authed {
        Some(user) => routes.layer(Extension(user)),
        None => routes,
    }
}

fn u1() -> AuthedUser {
    AuthedUser {
        user_id: UserId::from("u1"),
        session_id: Some("sess-u1".to_string()),
    }
}

fn switch_request(tenant_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/session/switch")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
        .header("user-agent", "route-test")
        .body(Body::from(format!(r#"{{"tenant_id":"{}"}}"#, tenant_id)))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn switch_succeeds_with_envelope() {
    let response = app(Some(u1())).oneshot(switch_request("7")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "7");
    assert_eq!(body["data"]["name"], "Acme Roofing");
    assert!(body["timing"]["total_ms"].is_u64());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn denied_switch_maps_to_403() {
    let response = app(Some(u1())).oneshot(switch_request("9")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Access denied");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn disabled_tenant_maps_to_404() {
    let response = app(Some(u1())).oneshot(switch_request("13")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Business is not available");
}

#[tokio::test]
async fn missing_identity_maps_to_401() {
    let response = app(None).oneshot(switch_request("7")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn malformed_body_maps_to_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/session/switch")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(Some(u1())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}
