// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::templates::PageContext;
use crate::presentation::auth::current_user;
use crate::presentation::error::WebError;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;
use crate::presentation::views::render;

pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response, WebError> {
    let user = current_user(&state, &session).await?;
    render(&state, &session, user.as_ref(), "home", PageContext::new("Task manager"))
}

/// Liveness probe
pub async fn health() -> Response {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

pub async fn not_found() -> WebError {
    WebError::NotFound("no route".to_string())
}
