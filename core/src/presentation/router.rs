// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::presentation::auth::require_login;
use crate::domain::label::Label;
use crate::domain::status::Status;
use crate::presentation::handlers::catalog::{self, CatalogPages};
use crate::presentation::handlers::{auth, home, tasks, users};
use crate::presentation::session::session_layer;
use crate::presentation::state::AppState;

/// Build the full application router.
///
/// Layer order, outermost first: request tracing, session, then the login
/// guard on the protected group only.
pub fn app(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/", get(home::index))
        .route("/health", get(home::health))
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route("/users/", get(users::index))
        .route("/users/create/", get(users::create_form).post(users::create));

    let protected = Router::new()
        .route("/users/{id}/", get(users::detail))
        .route("/users/{id}/update/", get(users::update_form).post(users::update))
        .route("/users/{id}/delete/", get(users::delete_confirm).post(users::delete))
        .merge(catalog_routes::<Status>())
        .merge(catalog_routes::<Label>())
        .route("/tasks/", get(tasks::index))
        .route("/tasks/create/", get(tasks::create_form).post(tasks::create))
        .route("/tasks/{id}/", get(tasks::detail))
        .route("/tasks/{id}/update/", get(tasks::update_form).post(tasks::update))
        .route("/tasks/{id}/delete/", get(tasks::delete_confirm).post(tasks::delete))
        .route_layer(from_fn_with_state(state.clone(), require_login));

    public
        .merge(protected)
        .fallback(home::not_found)
        .layer(from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// List, create, update and delete routes for one catalog kind
fn catalog_routes<E: CatalogPages>() -> Router<Arc<AppState>> {
    let base = format!("/{}", E::PLURAL);
    Router::new()
        .route(&format!("{}/", base), get(catalog::index::<E>))
        .route(
            &format!("{}/create/", base),
            get(catalog::create_form::<E>).post(catalog::create::<E>),
        )
        .route(
            &format!("{}/{{id}}/update/", base),
            get(catalog::update_form::<E>).post(catalog::update::<E>),
        )
        .route(
            &format!("{}/{{id}}/delete/", base),
            get(catalog::delete_confirm::<E>).post(catalog::delete::<E>),
        )
}
