// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session Middleware
//!
//! Attaches a [`Session`] handle to every request and writes the session
//! cookie back when the client needs a new one.
//!
//! # Lifecycle
//!
//! 1. Read the session cookie; an unknown or expired id is ignored.
//! 2. Hand the request a `Session` (existing id, or a fresh unsaved one).
//! 3. After the handler runs, issue `Set-Cookie` when the id changed
//!    (login rotates it) and the store now holds state for it.
//! 4. Error responses marked with [`ErrorPage`] get their HTML body here,
//!    where the template engine is reachable.

use axum::extract::{Request, State};
use axum::http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::domain::config::SessionConfig;
use crate::domain::user::UserId;
use crate::infrastructure::session_store::{FlashMessage, SessionId, SessionStore, SESSION_TTL_DAYS};
use crate::infrastructure::templates::PageContext;
use crate::presentation::error::ErrorPage;
use crate::presentation::state::AppState;

/// Per-request view of the caller's session
#[derive(Clone)]
pub struct Session {
    store: Arc<SessionStore>,
    id: Arc<Mutex<SessionId>>,
}

impl Session {
    pub fn new(store: Arc<SessionStore>, id: SessionId) -> Self {
        Self {
            store,
            id: Arc::new(Mutex::new(id)),
        }
    }

    pub fn id(&self) -> SessionId {
        *self.id.lock()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.store.user_id(self.id())
    }

    /// Authenticate this session as `user_id` under a fresh id
    pub fn login(&self, user_id: UserId) {
        let mut id = self.id.lock();
        *id = self.store.login(*id, user_id);
    }

    pub fn logout(&self) -> Option<UserId> {
        self.store.logout(self.id())
    }

    pub fn flash(&self, message: FlashMessage) {
        self.store.push_flash(self.id(), message);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.flash(FlashMessage::success(text));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.flash(FlashMessage::error(text));
    }

    pub fn take_flashes(&self) -> Vec<FlashMessage> {
        self.store.take_flashes(self.id())
    }
}

/// Value of cookie `name` from the request's `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a session id
pub fn session_cookie(config: &SessionConfig, id: SessionId) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.cookie_name,
        id,
        SESSION_TTL_DAYS * 24 * 60 * 60
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub async fn session_layer(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    let config = &state.session_config;
    let incoming = read_cookie(request.headers(), &config.cookie_name)
        .and_then(|raw| SessionId::from_string(&raw).ok())
        .filter(|id| state.sessions.contains(*id));

    let session = Session::new(state.sessions.clone(), incoming.unwrap_or_default());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(page) = response.extensions().get::<ErrorPage>().cloned() {
        response = render_error_page(&state, &session, page).await;
    }

    let current = session.id();
    if Some(current) != incoming && state.sessions.contains(current) {
        match HeaderValue::from_str(&session_cookie(config, current)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid session cookie header: {}", e),
        }
    }

    response
}

async fn render_error_page(state: &AppState, session: &Session, page: ErrorPage) -> Response {
    let user = match session.user_id() {
        Some(id) => state.users.get_user(id).await.ok(),
        None => None,
    };
    let context = PageContext::new(page.title)
        .user(user.as_ref())
        .flashes(session.take_flashes())
        .with("message", page.message.into());

    match state.templates.render("error", &context) {
        Ok(html) => (page.status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {:#}", e);
            (page.status, page.status.canonical_reason().unwrap_or("Error")).into_response()
        }
    }
}
