use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use super::{body_json, router, send, test_state};
use crate::ports::MockProcessSupervisor;

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_published_section_appears_in_snapshot() {
    let state = test_state(MockProcessSupervisor::new());
    let app = router(state.clone());

    let response = send(app, put_json("/api/state/farm", json!({"lands": 18}))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "section": "farm"})
    );
    assert_eq!(state.state_board.get("farm"), Some(json!({"lands": 18})));
}

#[tokio::test]
async fn test_user_section_must_match_identity() {
    let state = test_state(MockProcessSupervisor::new());
    let app = router(state.clone());

    let rejected = send(app.clone(), put_json("/api/state/user", json!("nobody"))).await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.state_board.get("user"), None);

    let accepted = send(
        app,
        put_json(
            "/api/state/user",
            json!({"gid": 1, "name": "farmer", "level": 10, "gold": 100, "exp": 5}),
        ),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_section_is_404() {
    let app = router(test_state(MockProcessSupervisor::new()));

    let response = send(app, put_json("/api/state/warehouse", json!({}))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["path"], "/api/state/warehouse");
}

#[tokio::test]
async fn test_delete_marks_section_unavailable() {
    let state = test_state(MockProcessSupervisor::new());
    state.state_board.publish("task", json!([1, 2]));
    let app = router(state.clone());

    let response = send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/state/task")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.state_board.get("task"), None);
}

#[tokio::test]
async fn test_get_on_state_path_is_405() {
    let app = router(test_state(MockProcessSupervisor::new()));

    let response = send(
        app,
        Request::builder()
            .uri("/api/state/farm")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
