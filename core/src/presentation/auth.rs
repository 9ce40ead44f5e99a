// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Authentication guard
//!
//! `require_login` is installed with `route_layer` on every protected route.
//! Anonymous callers get the "not logged in" flash and a redirect to the
//! login page; the wrapped handler never runs. Authenticated callers reach
//! the handler with a [`CurrentUser`] extension.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use std::sync::Arc;
use tracing::warn;

use crate::application::error::ServiceError;
use crate::application::permissions::{Access, NOT_LOGGED_IN};
use crate::domain::user::User;
use crate::presentation::error::WebError;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;

pub const LOGIN_URL: &str = "/login/";

/// The authenticated user behind the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the session's user. A session pointing at a deleted account is
/// logged out and treated as anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, WebError> {
    let Some(user_id) = session.user_id() else {
        return Ok(None);
    };
    match state.users.get_user(user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(ServiceError::NotFound(_)) => {
            session.logout();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Redirect for an [`Access`] outcome other than `Granted`
pub fn deny(session: &Session, access: Access, forbidden_redirect: &str, forbidden_message: &str) -> Response {
    match access {
        Access::Unauthenticated => {
            session.error(NOT_LOGGED_IN);
            Redirect::to(LOGIN_URL).into_response()
        }
        _ => {
            session.error(forbidden_message);
            Redirect::to(forbidden_redirect).into_response()
        }
    }
}

pub async fn require_login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut request: Request,
    next: Next,
) -> Response {
    match current_user(&state, &session).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(None) => {
            warn!(path = %request.uri().path(), "Anonymous request to protected page");
            deny(&session, Access::Unauthenticated, LOGIN_URL, NOT_LOGGED_IN)
        }
        Err(e) => e.into_response(),
    }
}
