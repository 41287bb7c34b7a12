mod helpers;

use axum::http::StatusCode;
use axum::Router;
use helpers::{get, post_json, seed_role, start_session, TestDb};
use rolegate::authz::{Authorizer, DbStore, IdentityProvider, SessionIdentity};
use serde_json::json;
use std::sync::Arc;

struct TestApp {
    db: TestDb,
    authz: Authorizer,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDb::new().await;
        let authz = Authorizer::with_store(DbStore::new(db.connection().clone()));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(SessionIdentity::new(db.connection().clone()));
        let router = rolegate::web::app_router(authz.clone(), identity);
        Self { db, authz, router }
    }

    /// Role "editor" = {edit, publish}, user "u1" assigned to it
    async fn with_editor() -> Self {
        let app = Self::new().await;
        seed_role(&app.authz, "editor", &["edit", "publish"]).await;
        seed_role(&app.authz, "viewer", &["view"]).await;
        app.authz
            .set_user_role("u1", Some("editor"))
            .await
            .expect("assign role");
        app
    }
}

#[tokio::test]
async fn test_list_roles_is_public() {
    let app = TestApp::with_editor().await;

    let (status, body) = get(&app.router, "/v1/roles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": "editor", "permissions": ["edit", "publish"]},
            {"id": "viewer", "permissions": ["view"]},
        ])
    );
}

#[tokio::test]
async fn test_get_single_role() {
    let app = TestApp::with_editor().await;

    let (status, body) = get(&app.router, "/v1/roles/viewer", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "viewer", "permissions": ["view"]}));

    let (status, body) = get(&app.router, "/v1/roles/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_my_role_anonymous_is_empty() {
    let app = TestApp::with_editor().await;

    let (status, body) = get(&app.router, "/v1/me/role", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    // Unknown session id reads as anonymous too
    let (status, body) = get(&app.router, "/v1/me/role", Some("rolegate_session=nope")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_my_role_returns_role_and_assignment() {
    let app = TestApp::with_editor().await;
    let cookie = start_session(app.db.connection(), "u1").await;

    let (status, body) = get(&app.router, "/v1/me/role", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "role": {"id": "editor", "permissions": ["edit", "publish"]},
            "assignment": {"user_id": "u1", "role_id": "editor"},
        })
    );
}

#[tokio::test]
async fn test_my_role_with_deleted_role() {
    let app = TestApp::with_editor().await;
    app.authz.delete_role("editor").await.unwrap();
    let cookie = start_session(app.db.connection(), "u1").await;

    let (_, body) = get(&app.router, "/v1/me/role", Some(&cookie)).await;
    assert_eq!(
        body,
        json!({"assignment": {"user_id": "u1", "role_id": "editor"}})
    );
}

#[tokio::test]
async fn test_me_can_uses_session_identity() {
    let app = TestApp::with_editor().await;
    let cookie = start_session(app.db.connection(), "u1").await;

    let (status, body) = post_json(
        &app.router,
        "/v1/me/can",
        json!({"permissions": ["edit", "publish"]}),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"allowed": true}));

    let (_, body) = post_json(
        &app.router,
        "/v1/me/can",
        json!({"permissions": "delete"}),
        Some(&cookie),
    )
    .await;
    assert_eq!(body, json!({"allowed": false}));
}

#[tokio::test]
async fn test_me_can_anonymous() {
    let app = TestApp::with_editor().await;

    let (_, body) =
        post_json(&app.router, "/v1/me/can", json!({"permissions": "edit"}), None).await;
    assert_eq!(body, json!({"allowed": false}));

    // Nothing requested, nothing to deny
    let (_, body) =
        post_json(&app.router, "/v1/me/can", json!({"permissions": []}), None).await;
    assert_eq!(body, json!({"allowed": true}));
}

#[tokio::test]
async fn test_me_can_rejects_malformed_permissions() {
    let app = TestApp::with_editor().await;

    for permissions in [json!(42), json!({"a": 1}), json!(["edit", false]), json!(null)] {
        let (status, body) = post_json(
            &app.router,
            "/v1/me/can",
            json!({"permissions": permissions.clone()}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{permissions}");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid permissions"));
    }
}

#[tokio::test]
async fn test_check_by_user_and_role() {
    let app = TestApp::with_editor().await;

    let cases = [
        (json!({"user_id": "u1", "permissions": ["edit", "publish"]}), true),
        (json!({"user_id": "u1", "permissions": ["edit", "delete"]}), false),
        (json!({"user_id": "", "permissions": "edit"}), false),
        (json!({"permissions": "edit"}), false),
        (json!({"permissions": []}), true),
        (json!({"role_id": "viewer", "permissions": "view"}), true),
        (json!({"role_id": "viewer", "permissions": ["view", "edit"]}), false),
        (json!({"role_id": "ghost", "permissions": "view"}), false),
        (json!({"role_id": "ghost", "permissions": []}), true),
    ];

    for (request, expected) in cases {
        let (status, body) = post_json(&app.router, "/v1/check", request.clone(), None).await;
        assert_eq!(status, StatusCode::OK, "{request}");
        assert_eq!(body, json!({"allowed": expected}), "{request}");
    }
}

#[tokio::test]
async fn test_check_rejects_ambiguous_subject() {
    let app = TestApp::with_editor().await;

    let (status, _) = post_json(
        &app.router,
        "/v1/check",
        json!({"user_id": "u1", "role_id": "editor", "permissions": "edit"}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_uses_error_shape() {
    let app = TestApp::with_editor().await;

    for (uri, body) in [
        ("/v1/check", json!({"user_id": 42, "permissions": "edit"})),
        ("/v1/check", json!(42)),
        ("/v1/me/can", json!("edit")),
    ] {
        let (status, body) = post_json(&app.router, uri, body, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}: {body}");
    }
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
}
