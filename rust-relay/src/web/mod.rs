//! Web server module for the intake endpoint.
//!
//! This module provides a thin web layer that:
//! - Receives form-encoded submissions on `POST /fact`
//! - Validates the body without rewriting it
//! - Appends it to the relay queue and returns 202 Accepted
//!
//! Delivery happens in the background drain scheduler.

pub mod form;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use form::{check_content_type, validate_form};
pub use handlers::{health, submit_fact, AppState, HealthResponse, IntakeResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fact", post(submit_fact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
