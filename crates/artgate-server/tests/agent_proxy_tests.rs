//! Route tests for the stateful agent proxy

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use artgate_server::auth::Claims;
use artgate_server::client::{AgentSession, TurnState, collect_agent_turn};
use common::{TestApp, body_bytes, body_json, post_json};

const APP_ID: &str = "app-7";
const COMPLETION_PATH: &str = "/apps/app-7/api/v1/completion";

const TURN_ONE: &str = concat!(
    "{\"content\":\"he\",\"sessionId\":\"s1\",\"finishReason\":false}\n",
    "{\"content\":\"llo\",\"sessionId\":\"s1\",\"finishReason\":true}\n",
);

const TURN_TWO: &str = concat!(
    "{\"content\":\"again\",\"sessionId\":\"s1\",\"finishReason\":false}\n",
    "{\"content\":\"!\",\"sessionId\":\"s1\",\"finishReason\":true}\n",
);

fn ndjson(body: &'static str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes(), "text/event-stream")
}

#[tokio::test]
async fn test_turn_is_relayed_and_decodes_on_the_caller_side() {
    let upstream = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(COMPLETION_PATH))
        .and(matchers::header("authorization", "agent-key"))
        .and(matchers::header("accept", "text/event-stream"))
        .and(matchers::body_partial_json(json!({
            "question": "a",
            "incrementalOutput": true,
            "promptParams": {}
        })))
        .respond_with(ndjson(TURN_ONE))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&app.bearer()),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let turn = collect_agent_turn(response.into_body().into_data_stream())
        .await
        .unwrap();
    assert_eq!(turn.state(), TurnState::Terminated);
    assert_eq!(turn.content(), "hello");
    assert_eq!(turn.session_id(), Some("s1"));
}

#[tokio::test]
async fn test_body_is_relayed_byte_identical() {
    let upstream = MockServer::start().await;
    Mock::given(matchers::path(COMPLETION_PATH))
        .respond_with(ndjson(TURN_ONE))
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&app.bearer()),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();
    assert_eq!(&body_bytes(response).await[..], TURN_ONE.as_bytes());
}

#[tokio::test]
async fn test_session_id_is_threaded_by_the_caller() {
    let upstream = MockServer::start().await;

    // Resumed turn: more specific, mounted first
    Mock::given(matchers::path(COMPLETION_PATH))
        .and(matchers::body_partial_json(json!({"sessionId": "s1", "question": "b"})))
        .respond_with(ndjson(TURN_TWO))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(matchers::path(COMPLETION_PATH))
        .and(matchers::body_partial_json(json!({"question": "a"})))
        .respond_with(ndjson(TURN_ONE))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;
    let mut session = AgentSession::new();

    for (question, expected) in [("a", "hello"), ("b", "again!")] {
        // First turn sends "", which means "start a new conversation"
        let body = json!({"question": question, "sessionId": session.current()});

        let response = app
            .router()
            .oneshot(post_json("/api/agent/chat", Some(&app.bearer()), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let turn = collect_agent_turn(response.into_body().into_data_stream())
            .await
            .unwrap();
        assert_eq!(turn.content(), expected);
        session.observe(&turn);
    }
    assert_eq!(session.current(), "s1");

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["sessionId"], "");
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["sessionId"], "s1");
}

#[tokio::test]
async fn test_missing_agent_config_is_400() {
    let app = TestApp::new().await;

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&app.bearer()),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "configure the agent first");
}

#[tokio::test]
async fn test_undecryptable_key_is_500_without_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent_blob(&upstream.uri(), APP_ID, "%%% not base64 %%%")
        .await;

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&app.bearer()),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "stored API key could not be decrypted"
    );
}

#[tokio::test]
async fn test_empty_question_is_400() {
    let upstream = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    for body in [json!({"question": ""}), json!({"sessionId": "s1"})] {
        let response = app
            .router()
            .oneshot(post_json("/api/agent/chat", Some(&app.bearer()), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

async fn untouchable_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_unauthenticated_is_401() {
    let upstream = untouchable_upstream().await;
    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let response = app
        .router()
        .oneshot(post_json("/api/agent/chat", None, &json!({"question": "a"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let upstream = untouchable_upstream().await;
    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let now = chrono::Utc::now().timestamp();
    let expired = app
        .state
        .resolver
        .tokens()
        .issue_with_claims(&Claims {
            user_id: common::USER_ID.to_string(),
            iat: now - 7200,
            exp: now - 3600,
        })
        .unwrap();

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&format!("Bearer {expired}")),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_is_401() {
    let upstream = untouchable_upstream().await;
    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let raw = app.token();
    let headers = [
        "Bearer".to_string(),
        "Bearer ".to_string(),
        "Basic dXNlcjpwYXNz".to_string(),
        "Bearer not.a.jwt".to_string(),
        raw,
    ];

    for header in &headers {
        let response = app
            .router()
            .oneshot(post_json(
                "/api/agent/chat",
                Some(header),
                &json!({"question": "a"}),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "header {header:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_upstream_error_is_wrapped_with_status() {
    let upstream = MockServer::start().await;
    Mock::given(matchers::path(COMPLETION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("app disabled"))
        .mount(&upstream)
        .await;

    let app = TestApp::new().await;
    app.save_agent(&upstream.uri(), APP_ID, "agent-key").await;

    let response = app
        .router()
        .oneshot(post_json(
            "/api/agent/chat",
            Some(&app.bearer()),
            &json!({"question": "a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "agent call failed: app disabled"
    );
}
