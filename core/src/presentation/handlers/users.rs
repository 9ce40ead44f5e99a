// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! User pages
//!
//! The list and signup are public. Everything else sits behind the login
//! guard, and edit/delete additionally require the target to be the acting
//! user. Deleting your own account ends the session.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, UserForm};
use crate::application::permissions::{check_user_ownership, Access, NOT_OWNER};
use crate::domain::user::{User, UserId};
use crate::infrastructure::templates::PageContext;
use crate::presentation::auth::{current_user, deny, CurrentUser, LOGIN_URL};
use crate::presentation::error::WebError;
use crate::presentation::form_data::FormData;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;
use crate::presentation::views::{errors_json, path_id, render, to_json, user_view};

pub const LIST_URL: &str = "/users/";
pub const REGISTERED: &str = "User successfully registered";
pub const UPDATED: &str = "User successfully changed";
pub const DELETED: &str = "User successfully deleted";
pub const IN_USE: &str = "Cannot delete user because it is in use";

fn form_page(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
    target: Option<UserId>,
    form: &UserForm,
    errors: Option<&FormErrors>,
) -> Result<Response, WebError> {
    let (heading, action, submit) = match target {
        None => ("Sign up", "/users/create/".to_string(), "Register"),
        Some(id) => ("Edit user", format!("/users/{}/update/", id), "Save"),
    };
    let context = PageContext::new(heading)
        .with("form", to_json(form)?)
        .with("errors", errors_json(errors)?)
        .with("action", json!(action))
        .with("heading", json!(heading))
        .with("submit", json!(submit));
    render(state, session, user, "users/form", context)
}

/// Load the target account and check the acting user owns it.
///
/// `Err(response)` is the redirect to send when ownership fails.
async fn owned_target(
    state: &AppState,
    session: &Session,
    acting: &User,
    raw_id: &str,
) -> Result<Result<User, Response>, WebError> {
    let target = state.users.get_user(path_id(raw_id, UserId)?).await?;
    match check_user_ownership(Some(acting.id), target.id) {
        Access::Granted => Ok(Ok(target)),
        access => {
            warn!(acting = %acting.id, target = %target.id, "Attempt to modify another user");
            Ok(Err(deny(session, access, LIST_URL, NOT_OWNER)))
        }
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    RawQuery(query): RawQuery,
) -> Result<Response, WebError> {
    let user = current_user(&state, &session).await?;
    let page = state
        .users
        .list_users(FormData::from_query(query.as_deref()).page())
        .await?
        .map(|u| user_view(&u));
    let context = PageContext::new("Users").with("page", to_json(&page)?);
    render(&state, &session, user.as_ref(), "users/index", context)
}

pub async fn create_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response, WebError> {
    let user = current_user(&state, &session).await?;
    form_page(&state, &session, user.as_ref(), None, &UserForm::default(), None)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body).user_form();
    match state.users.register(form.clone()).await {
        Ok(_) => {
            session.success(REGISTERED);
            Ok(Redirect::to(LOGIN_URL).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            let user = current_user(&state, &session).await?;
            form_page(&state, &session, user.as_ref(), None, &form, Some(&errors))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let target = state.users.get_user(path_id(&raw_id, UserId)?).await?;
    let context = PageContext::new(target.full_name())
        .with("profile", user_view(&target))
        .with("is_self", json!(target.id == user.id));
    render(&state, &session, Some(&user), "users/detail", context)
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let target = match owned_target(&state, &session, &user, &raw_id).await? {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };
    let form = UserForm {
        username: target.username.clone(),
        first_name: target.first_name.clone(),
        last_name: target.last_name.clone(),
        ..UserForm::default()
    };
    form_page(&state, &session, Some(&user), Some(target.id), &form, None)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, WebError> {
    let target = match owned_target(&state, &session, &user, &raw_id).await? {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };
    let form = FormData::parse(&body).user_form();
    match state.users.update_user(target.id, form.clone()).await {
        Ok(_) => {
            session.success(UPDATED);
            Ok(Redirect::to(LIST_URL).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            form_page(&state, &session, Some(&user), Some(target.id), &form, Some(&errors))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let target = match owned_target(&state, &session, &user, &raw_id).await? {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };
    let context = PageContext::new("Delete user").with("profile", user_view(&target));
    render(&state, &session, Some(&user), "users/delete", context)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let target = match owned_target(&state, &session, &user, &raw_id).await? {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };
    match state.users.delete_user(target.id).await {
        Ok(()) => {
            session.logout();
            session.success(DELETED);
            info!(user_id = %target.id, "User deleted own account");
        }
        Err(ServiceError::Protected(_)) => session.error(IN_USE),
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(LIST_URL).into_response())
}
