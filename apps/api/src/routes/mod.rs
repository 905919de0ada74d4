pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resume::handlers as resume;
use crate::state::AppState;
use crate::versioning::handlers as versions;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Threads
        .route(
            "/api/v1/threads",
            post(resume::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/threads/:id", get(resume::handle_get_thread))
        .route("/api/v1/threads/:id/render", get(resume::handle_render))
        .route(
            "/api/v1/threads/:id/changes",
            post(resume::handle_check_changes),
        )
        // Version history
        .route(
            "/api/v1/threads/:id/versions",
            get(versions::handle_list_versions).post(versions::handle_save_version),
        )
        .route(
            "/api/v1/threads/:id/versions/:version_id",
            get(versions::handle_get_version),
        )
        .route(
            "/api/v1/threads/:id/versions/:version_id/revert",
            post(versions::handle_revert),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::models::resume::VersionSummary;

    fn test_app() -> Router {
        build_router(AppState::for_tests(Config::for_tests()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_save_preview_revert_over_http() {
        let app = test_app();
        let thread = Uuid::new_v4();
        let versions_uri = format!("/api/v1/threads/{thread}/versions");

        let (status, body) = send(
            &app,
            Method::POST,
            &versions_uri,
            Some(json!({"state": {"contactInfo": {"data": {"name": "Jane"}}}, "title": "init"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "saved");
        let v1: VersionSummary = serde_json::from_value(body["version"].clone()).unwrap();

        let (status, _) = send(
            &app,
            Method::POST,
            &versions_uri,
            Some(json!({
                "state": {"contactInfo": {"data": {"name": "Jane", "email": "j@x.com"}}},
                "title": "add email"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Same state again is skipped
        let (status, body) = send(
            &app,
            Method::POST,
            &versions_uri,
            Some(json!({
                "state": {"contactInfo": {"data": {"name": "Jane", "email": "j@x.com"}}},
                "title": "again"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "skipped");
        assert!(body["version"].is_null());

        let (status, body) =
            send(&app, Method::GET, &format!("{versions_uri}/{}", v1.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], json!({"contactInfo": {"data": {"name": "Jane"}}}));

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{versions_uri}/{}/revert", v1.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "saved");
        assert_eq!(body["version"]["seq"], 3);
        assert_eq!(body["version"]["title"], "Reverted to version 1");

        // Already at version 1: nothing written
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{versions_uri}/{}/revert", v1.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "skipped");
        assert!(body["version"].is_null());

        let (_, history) = send(&app, Method::GET, &versions_uri, None).await;
        assert_eq!(history.as_array().map(Vec::len), Some(3));

        let (_, current) =
            send(&app, Method::GET, &format!("/api/v1/threads/{thread}"), None).await;
        assert_eq!(
            current["state"],
            json!({"contactInfo": {"data": {"name": "Jane"}}})
        );
    }

    #[tokio::test]
    async fn test_change_check_reports_pending_diff() {
        let app = test_app();
        let thread = Uuid::new_v4();
        send(
            &app,
            Method::POST,
            &format!("/api/v1/threads/{thread}/versions"),
            Some(json!({"state": {"summary": {"data": "a"}}, "title": "init"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/threads/{thread}/changes"),
            Some(json!({"draft": {"summary": {"data": "b"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_unsaved_changes"], true);
        assert_eq!(
            body["diff"]["changes"]["summary"]["changes"]["data"],
            json!({"op": "set", "value": "b"})
        );
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = test_app();
        let thread = Uuid::new_v4();

        let (status, body) =
            send(&app, Method::GET, &format!("/api/v1/threads/{thread}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/v1/threads/{thread}/versions/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/threads/{thread}/versions"),
            Some(json!({"state": [1, 2, 3], "title": "bad"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_render_returns_markdown() {
        let app = test_app();
        let thread = Uuid::new_v4();
        send(
            &app,
            Method::POST,
            &format!("/api/v1/threads/{thread}/versions"),
            Some(json!({"state": {"contactInfo": {"data": {"name": "Jane"}}}, "title": "init"})),
        )
        .await;

        let request = Request::builder()
            .uri(format!("/api/v1/threads/{thread}/render"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/markdown; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("# Jane\n"));
    }
}
