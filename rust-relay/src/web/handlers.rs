//! Intake and health endpoint handlers.
//!
//! The intake handler only validates and appends; delivery happens later in
//! the drain scheduler, and its outcome is never reported back to the caller.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{IntakeError, QueueError};
use crate::queue::{DrainState, FactQueue};
use crate::web::form::{check_content_type, validate_form};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: FactQueue,
}

impl AppState {
    pub fn new(config: Config, queue: FactQueue) -> Self {
        Self {
            config: Arc::new(config),
            queue,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_depth: usize,
    pub draining: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        queue_depth: state.queue.len(),
        draining: state.queue.drain_state() == DrainState::Draining,
    })
}

// =============================================================================
// Fact Intake
// =============================================================================

/// Intake response.
#[derive(Serialize)]
pub struct IntakeResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntakeResponse {
    fn rejected(status: &'static str, error: impl ToString) -> Self {
        Self {
            status,
            sequence: None,
            queue_depth: None,
            error: Some(error.to_string()),
        }
    }
}

fn intake_rejection(e: IntakeError) -> (StatusCode, Json<IntakeResponse>) {
    let code = match e {
        IntakeError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    (code, Json(IntakeResponse::rejected("malformed", e)))
}

/// Fact intake endpoint.
///
/// This endpoint:
/// 1. Checks the content type and the form encoding of the body
/// 2. Appends the raw body and its `Authorization` value to the queue
/// 3. Returns 202 Accepted
pub async fn submit_fact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if let Err(e) = check_content_type(content_type) {
        warn!(content_type = ?content_type, "intake_unsupported_content_type");
        return intake_rejection(e);
    }

    // Kept as raw bytes: the credential is opaque and need not be UTF-8.
    let auth_header = headers.get(AUTHORIZATION).cloned();

    let (payload, pairs) = match validate_form(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(body_length = body.len(), error = %e, "intake_malformed_body");
            return intake_rejection(e);
        }
    };

    let has_auth = auth_header.is_some();
    match state.queue.push(payload.to_string(), auth_header) {
        Ok(entry) => {
            let queue_depth = state.queue.len();
            info!(
                sequence = entry.sequence,
                pairs = pairs,
                has_auth = has_auth,
                queue_depth = queue_depth,
                "intake_enqueued"
            );
            (
                StatusCode::ACCEPTED,
                Json(IntakeResponse {
                    status: "enqueued",
                    sequence: Some(entry.sequence),
                    queue_depth: Some(queue_depth),
                    error: None,
                }),
            )
        }
        Err(e @ QueueError::Full(_)) => {
            warn!(error = %e, "intake_queue_full");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(IntakeResponse::rejected("queue_full", e)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::web::router;

    fn test_state(capacity: Option<usize>) -> AppState {
        let config = Config {
            destination_url: "http://localhost:9000/facts".to_string(),
            queue_check_period_secs: 5,
            max_errors_count: 3,
            request_timeout_ms: 1000,
            extra_success_statuses: vec![],
            queue_capacity: capacity,
            port: 0,
        };
        AppState::new(config, FactQueue::with_capacity(capacity))
    }

    fn fact_request(body: &'static str, auth: Option<&str>) -> Request<Body> {
        fact_request_raw(body, auth.map(|a| HeaderValue::from_str(a).unwrap()))
    }

    fn fact_request_raw(body: &'static str, auth: Option<HeaderValue>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/fact")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_enqueues_body_and_credential() {
        let state = test_state(None);
        let app = router(state.clone());

        let response = app
            .oneshot(fact_request("b=2&a=hello%20world", Some("Bearer abc")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "enqueued");
        assert_eq!(body["sequence"], 0);
        assert_eq!(body["queue_depth"], 1);

        let entry = state.queue.peek().unwrap();
        assert_eq!(entry.payload, "b=2&a=hello%20world");
        assert_eq!(entry.auth_header.unwrap(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_submit_without_credential() {
        let state = test_state(None);
        let response = router(state.clone())
            .oneshot(fact_request("a=1", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(state.queue.peek().unwrap().auth_header.is_none());
    }

    #[tokio::test]
    async fn test_submit_with_empty_credential_keeps_header() {
        let state = test_state(None);
        let response = router(state.clone())
            .oneshot(fact_request_raw("a=1", Some(HeaderValue::from_static(""))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let stored = state.queue.peek().unwrap().auth_header;
        assert_eq!(stored.as_ref().map(|v| v.as_bytes()), Some(&b""[..]));
    }

    #[tokio::test]
    async fn test_submit_with_non_utf8_credential_is_accepted() {
        let state = test_state(None);
        let credential = HeaderValue::from_bytes(b"Bearer \xe9").unwrap();
        let response = router(state.clone())
            .oneshot(fact_request_raw("a=1", Some(credential)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let entry = state.queue.peek().unwrap();
        assert_eq!(entry.payload, "a=1");
        assert_eq!(entry.auth_header.unwrap().as_bytes(), b"Bearer \xe9");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected_and_not_queued() {
        let state = test_state(None);
        let response = router(state.clone())
            .oneshot(fact_request("a=%zz", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "malformed");
        assert!(state.queue.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_rejected() {
        let state = test_state(None);
        let request = Request::builder()
            .method("POST")
            .uri("/fact")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"a\":1}"))
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(state.queue.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_refuses_submission() {
        let state = test_state(Some(1));
        let app = router(state.clone());

        let first = app.clone().oneshot(fact_request("a=1", None)).await.unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = app.oneshot(fact_request("b=2", None)).await.unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(second).await["status"], "queue_full");
        assert_eq!(state.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_queue_depth() {
        let state = test_state(None);
        state.queue.push("a=1".to_string(), None).unwrap();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["queue_depth"], 1);
        assert_eq!(body["draining"], false);
    }
}
