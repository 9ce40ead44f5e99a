// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Status and label pages: list, create, rename and delete.
//!
//! The handlers are generic over [`CatalogPages`] and mounted once per kind:
//!
//! ```text
//! /statuses/...  ──> catalog::index::<Status>, catalog::create::<Status>, ...
//! /labels/...    ──> catalog::index::<Label>,  catalog::create::<Label>,  ...
//! ```

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, NameForm};
use crate::application::{CatalogEntry, CatalogService};
use crate::domain::label::{Label, LabelId};
use crate::domain::status::{Status, StatusId};
use crate::domain::user::User;
use crate::infrastructure::templates::PageContext;
use crate::presentation::auth::CurrentUser;
use crate::presentation::error::WebError;
use crate::presentation::form_data::FormData;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;
use crate::presentation::views::{entry_view, errors_json, path_id, render, to_json};

/// Routing and wording for one catalog kind
pub trait CatalogPages: CatalogEntry {
    /// URL segment, e.g. `statuses`
    const PLURAL: &'static str;
    const TITLE: &'static str;
    const CREATED: &'static str;
    const UPDATED: &'static str;
    const DELETED: &'static str;
    const IN_USE: &'static str;

    fn service(state: &AppState) -> &dyn CatalogService<Self>;
    fn id_from(raw: i64) -> Self::Id;

    fn list_url() -> String {
        format!("/{}/", Self::PLURAL)
    }

    fn kind() -> Value {
        json!({ "plural": Self::PLURAL, "noun": Self::NOUN, "title": Self::TITLE })
    }
}

impl CatalogPages for Status {
    const PLURAL: &'static str = "statuses";
    const TITLE: &'static str = "Statuses";
    const CREATED: &'static str = "Status successfully created";
    const UPDATED: &'static str = "Status successfully changed";
    const DELETED: &'static str = "Status successfully deleted";
    const IN_USE: &'static str = "Cannot delete status because it is in use";

    fn service(state: &AppState) -> &dyn CatalogService<Self> {
        state.statuses.as_ref()
    }

    fn id_from(raw: i64) -> StatusId {
        StatusId(raw)
    }
}

impl CatalogPages for Label {
    const PLURAL: &'static str = "labels";
    const TITLE: &'static str = "Labels";
    const CREATED: &'static str = "Label successfully created";
    const UPDATED: &'static str = "Label successfully changed";
    const DELETED: &'static str = "Label successfully deleted";
    const IN_USE: &'static str = "Cannot delete label because it is in use";

    fn service(state: &AppState) -> &dyn CatalogService<Self> {
        state.labels.as_ref()
    }

    fn id_from(raw: i64) -> LabelId {
        LabelId(raw)
    }
}

fn form_page<E: CatalogPages>(
    state: &AppState,
    session: &Session,
    user: &User,
    target: Option<E::Id>,
    form: &NameForm,
    errors: Option<&FormErrors>,
) -> Result<Response, WebError> {
    let (heading, action, submit) = match target {
        None => (format!("Create {}", E::NOUN), format!("/{}/create/", E::PLURAL), "Create"),
        Some(id) => (format!("Edit {}", E::NOUN), format!("/{}/{}/update/", E::PLURAL, id), "Save"),
    };
    let context = PageContext::new(heading.clone())
        .with("kind", E::kind())
        .with("form", to_json(form)?)
        .with("errors", errors_json(errors)?)
        .with("action", json!(action))
        .with("heading", json!(heading))
        .with("submit", json!(submit));
    render(state, session, Some(user), "catalog/form", context)
}

pub async fn index<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    RawQuery(query): RawQuery,
) -> Result<Response, WebError> {
    let page = E::service(&state)
        .list(FormData::from_query(query.as_deref()).page())
        .await?
        .map(|entry| entry_view(&entry));
    let context = PageContext::new(E::TITLE)
        .with("kind", E::kind())
        .with("page", to_json(&page)?);
    render(&state, &session, Some(&user), "catalog/index", context)
}

pub async fn create_form<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    form_page::<E>(&state, &session, &user, None, &NameForm::default(), None)
}

pub async fn create<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body).name_form();
    match E::service(&state).create(&form).await {
        Ok(_) => {
            session.success(E::CREATED);
            Ok(Redirect::to(&E::list_url()).into_response())
        }
        Err(ServiceError::Validation(errors)) => form_page::<E>(&state, &session, &user, None, &form, Some(&errors)),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_form<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let entry = E::service(&state).get(path_id(&raw_id, E::id_from)?).await?;
    let form = NameForm::new(entry.name());
    form_page::<E>(&state, &session, &user, Some(entry.id()), &form, None)
}

pub async fn update<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, WebError> {
    let id = path_id(&raw_id, E::id_from)?;
    let form = FormData::parse(&body).name_form();
    match E::service(&state).rename(id, &form).await {
        Ok(_) => {
            session.success(E::UPDATED);
            Ok(Redirect::to(&E::list_url()).into_response())
        }
        Err(ServiceError::Validation(errors)) => form_page::<E>(&state, &session, &user, Some(id), &form, Some(&errors)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let entry = E::service(&state).get(path_id(&raw_id, E::id_from)?).await?;
    let context = PageContext::new(format!("Delete {}", E::NOUN))
        .with("kind", E::kind())
        .with("entry", entry_view(&entry));
    render(&state, &session, Some(&user), "catalog/delete", context)
}

pub async fn delete<E: CatalogPages>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = path_id(&raw_id, E::id_from)?;
    match E::service(&state).delete(id).await {
        Ok(()) => session.success(E::DELETED),
        Err(ServiceError::Protected(_)) => session.error(E::IN_USE),
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&E::list_url()).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wording() {
        assert_eq!(Status::list_url(), "/statuses/");
        assert_eq!(Label::list_url(), "/labels/");
        assert_eq!(Label::kind()["noun"], json!("label"));
        assert_eq!(Status::id_from(3), StatusId(3));
    }
}
