//! Notification REST handler tests
//!
//! Handlers are called with their extractors built by hand, the same values
//! the router would hand them after `auth_middleware`.

use crate::common::TestApp;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use portal_realtime::backend::middleware::{authenticate, AuthUser, AuthenticatedUser};
use portal_realtime::backend::notifications::handlers::{
    clear_notifications, delete_notification, dispatch_notification, list_notifications,
    mark_notification_read, DispatchBody, ListQuery,
};
use portal_realtime::shared::{Locale, Role};
use serde_json::json;
use uuid::Uuid;

fn caller(key: &str, role: Role) -> AuthUser {
    AuthUser(AuthenticatedUser {
        identity_key: key.to_string(),
        display_name: key.to_string(),
        role,
        locale: Locale::En,
    })
}

fn dispatch_body(audience: &str) -> Json<DispatchBody> {
    Json(
        serde_json::from_value(json!({
            "audience": audience,
            "type": "payment",
            "event": "received",
            "identity": { "user_id": "u1", "display_name": "Anna" },
            "payload": { "amount": "4.990 kr." }
        }))
        .unwrap(),
    )
}

#[tokio::test]
async fn test_authenticate_requires_valid_bearer() {
    let app = TestApp::new().await;

    let missing = authenticate(&app.state, &HeaderMap::new()).unwrap_err();
    assert_eq!(missing, StatusCode::UNAUTHORIZED);

    let mut forged = HeaderMap::new();
    forged.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"));
    assert_eq!(authenticate(&app.state, &forged).unwrap_err(), StatusCode::UNAUTHORIZED);

    let token = app
        .state
        .handshake
        .keys()
        .create_token("ops", Some("Operator"), Role::Admin)
        .unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("is-IS,is;q=0.9"));

    let user = authenticate(&app.state, &headers).unwrap();
    assert_eq!(user.identity_key, "ops");
    assert!(user.is_admin());
    assert_eq!(user.locale, Locale::Is);
}

#[tokio::test]
async fn test_dispatch_route_is_admin_only() {
    let app = TestApp::new().await;
    let dispatcher = app.state.dispatcher.clone();

    let refused = dispatch_notification(State(dispatcher), caller("u1", Role::User), dispatch_body("user"))
        .await
        .unwrap_err();
    assert_eq!(refused.into_response().status(), StatusCode::FORBIDDEN);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_dispatch_both_then_list_per_inbox() {
    let app = TestApp::new().await;
    let dispatcher = app.state.dispatcher.clone();

    let (status, Json(created)) = dispatch_notification(
        State(dispatcher.clone()),
        caller("ops", Role::Admin),
        dispatch_body("both"),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.notification_ids.len(), 2);

    let Json(user_list) = list_notifications(
        State(dispatcher.clone()),
        caller("u1", Role::User),
        Query(ListQuery {
            locale: Some("is".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(user_list.total, 1);
    assert_eq!(user_list.items[0].notification_id, created.notification_ids[1]);

    let Json(admin_list) = list_notifications(
        State(dispatcher),
        caller("ops", Role::Admin),
        Query(ListQuery { locale: None }),
    )
    .await
    .unwrap();
    assert_eq!(admin_list.total, 1);
    assert!(admin_list.items[0].for_admin);
}

#[tokio::test]
async fn test_read_delete_and_clear() {
    let app = TestApp::new().await;
    let dispatcher = app.state.dispatcher.clone();
    let (_, Json(created)) = dispatch_notification(
        State(dispatcher.clone()),
        caller("ops", Role::Admin),
        dispatch_body("user"),
    )
    .await
    .unwrap();
    let id = created.notification_ids[0];

    let Json(first) = mark_notification_read(State(dispatcher.clone()), caller("u1", Role::User), Path(id))
        .await
        .unwrap();
    assert!(first.updated);
    let Json(second) = mark_notification_read(State(dispatcher.clone()), caller("u1", Role::User), Path(id))
        .await
        .unwrap();
    assert!(!second.updated);

    let missing = delete_notification(State(dispatcher.clone()), caller("u1", Role::User), Path(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

    let status = delete_notification(State(dispatcher.clone()), caller("u1", Role::User), Path(id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(cleared) = clear_notifications(State(dispatcher), caller("u1", Role::User))
        .await
        .unwrap();
    assert_eq!(cleared.changed, 0);
}

mod router {
    use crate::common::TestApp;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use portal_realtime::backend::routes::create_router;
    use portal_realtime::shared::{NotificationList, Role};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn bearer(app: &TestApp, key: &str, role: Role) -> String {
        let token = app
            .state
            .handshake
            .keys()
            .create_token(key, None, role)
            .unwrap();
        format!("Bearer {}", token)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let app = TestApp::new().await;
        let response = create_router(app.state.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let app = TestApp::new().await;
        let response = create_router(app.state.clone())
            .oneshot(Request::get("/api/notifications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dispatch_then_list_over_http() {
        let app = TestApp::new().await;
        let router = create_router(app.state.clone());

        let dispatch = Request::post("/api/notifications/dispatch")
            .header(header::AUTHORIZATION, bearer(&app, "ops", Role::Admin))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "audience": "user",
                    "type": "subscription",
                    "event": "activated",
                    "identity": { "user_id": "u1", "display_name": "Anna" },
                    "payload": { "plan": "Pro" }
                })
                .to_string(),
            ))
            .unwrap();
        let response = router.clone().oneshot(dispatch).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let list = Request::get("/api/notifications?locale=is")
            .header(header::AUTHORIZATION, bearer(&app, "u1", Role::User))
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(list).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let list: NotificationList = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.unread_count, 1);
        assert!(!list.items[0].for_admin);
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_404() {
        let app = TestApp::new().await;
        let response = create_router(app.state.clone())
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
