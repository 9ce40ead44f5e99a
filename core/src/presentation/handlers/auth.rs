// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, LoginForm};
use crate::infrastructure::templates::PageContext;
use crate::presentation::auth::current_user;
use crate::presentation::error::WebError;
use crate::presentation::form_data::FormData;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;
use crate::presentation::views::{errors_json, render};

pub const LOGGED_IN: &str = "You are logged in";
pub const LOGGED_OUT: &str = "You are logged out";

async fn login_page(
    state: &AppState,
    session: &Session,
    form: &LoginForm,
    errors: Option<&FormErrors>,
) -> Result<Response, WebError> {
    let user = current_user(state, session).await?;
    let context = PageContext::new("Log in")
        .with("form", json!({ "username": form.username }))
        .with("errors", errors_json(errors)?);
    render(state, session, user.as_ref(), "login", context)
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response, WebError> {
    login_page(&state, &session, &LoginForm::default(), None).await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body).login_form();
    match state.users.authenticate(&form).await {
        Ok(user) => {
            session.login(user.id);
            session.success(LOGGED_IN);
            info!(user_id = %user.id, "User logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(ServiceError::Validation(errors)) => login_page(&state, &session, &form, Some(&errors)).await,
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(Extension(session): Extension<Session>) -> Response {
    if let Some(user_id) = session.logout() {
        session.success(LOGGED_OUT);
        info!(user_id = %user_id, "User logged out");
    }
    Redirect::to("/").into_response()
}
