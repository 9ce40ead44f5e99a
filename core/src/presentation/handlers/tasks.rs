// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task pages
//!
//! The list carries the filter form; status, executor and label names link
//! back to the list narrowed to that value. Only the author may delete a
//! task.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, TaskForm};
use crate::application::permissions::{check_task_deletion, Access, NOT_TASK_AUTHOR};
use crate::application::TaskDetails;
use crate::domain::filter::{is_checked, TaskFilter, TaskFilterParams};
use crate::domain::label::Label;
use crate::domain::pagination::PageRequest;
use crate::domain::status::Status;
use crate::domain::task::{Task, TaskId};
use crate::domain::user::User;
use crate::infrastructure::templates::PageContext;
use crate::presentation::auth::{deny, CurrentUser};
use crate::presentation::error::WebError;
use crate::presentation::form_data::FormData;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;
use crate::presentation::views::{errors_json, format_timestamp, options, path_id, render, to_json};

pub const LIST_URL: &str = "/tasks/";
pub const CREATED: &str = "Task successfully created";
pub const UPDATED: &str = "Task successfully changed";
pub const DELETED: &str = "Task successfully deleted";

// ============================================================================
// View models
// ============================================================================

fn person(user: &User) -> Value {
    json!({ "id": user.id, "full_name": user.full_name() })
}

fn task_view(details: &TaskDetails) -> Value {
    let TaskDetails { task, status, creator, executor, labels } = details;
    json!({
        "id": task.id,
        "name": task.name,
        "description": task.description,
        "status": { "id": status.id, "name": status.name },
        "creator": person(creator),
        "executor": executor.as_ref().map(person),
        "labels": labels
            .iter()
            .map(|label| json!({ "id": label.id, "name": label.name }))
            .collect::<Vec<_>>(),
        "created_at": format_timestamp(task.created_at),
    })
}

/// Filter parameters re-encoded for pagination links, ending in `&` when
/// non-empty so templates can append `page=N`.
pub fn query_prefix(params: &TaskFilterParams) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let fields = [
        ("status", &params.status),
        ("executor", &params.executor),
        ("label", &params.label),
        ("self_tasks", &params.self_tasks),
    ];
    let mut any = false;
    for (key, value) in fields {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            serializer.append_pair(key, value);
            any = true;
        }
    }
    let mut prefix = serializer.finish();
    if any {
        prefix.push('&');
    }
    prefix
}

fn selected(raw: &Option<String>) -> Vec<String> {
    raw.iter().map(|s| s.trim().to_string()).collect()
}

/// Choices for the status, executor and label selects
async fn choices(state: &AppState, status: &[String], executor: &[String], labels: &[String]) -> Result<Value, WebError> {
    let statuses = state.statuses.all().await?;
    let users = state.users.all_users().await?;
    let all_labels = state.labels.all().await?;
    Ok(json!({
        "statuses": options(&statuses, |s: &Status| s.id.0, |s: &Status| s.name.clone(), status),
        "executors": options(&users, |u: &User| u.id.0, User::full_name, executor),
        "labels": options(&all_labels, |l: &Label| l.id.0, |l: &Label| l.name.clone(), labels),
    }))
}

fn form_from_task(task: &Task) -> TaskForm {
    TaskForm {
        name: task.name.clone(),
        description: task.description.clone(),
        status: task.status_id.to_string(),
        executor: task.executor_id.map(|id| id.to_string()).unwrap_or_default(),
        labels: task.label_ids.iter().map(|id| id.to_string()).collect(),
    }
}

async fn form_page(
    state: &AppState,
    session: &Session,
    user: &User,
    target: Option<TaskId>,
    form: &TaskForm,
    errors: Option<&FormErrors>,
) -> Result<Response, WebError> {
    let (heading, action, submit) = match target {
        None => ("Create task", "/tasks/create/".to_string(), "Create"),
        Some(id) => ("Edit task", format!("/tasks/{}/update/", id), "Save"),
    };
    let choices = choices(
        state,
        std::slice::from_ref(&form.status),
        std::slice::from_ref(&form.executor),
        &form.labels,
    )
    .await?;
    let context = PageContext::new(heading)
        .with("form", to_json(form)?)
        .with("errors", errors_json(errors)?)
        .with("choices", choices)
        .with("action", json!(action))
        .with("heading", json!(heading))
        .with("submit", json!(submit));
    render(state, session, Some(user), "tasks/form", context)
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    RawQuery(query): RawQuery,
) -> Result<Response, WebError> {
    let params = FormData::from_query(query.as_deref()).filter_params();
    let filter = TaskFilter::resolve(&params, user.id);
    let page = state
        .tasks
        .list_tasks(&filter, PageRequest::from_query(params.page.as_deref()))
        .await?
        .map(|details| task_view(&details));

    let choices = choices(
        &state,
        &selected(&params.status),
        &selected(&params.executor),
        &selected(&params.label),
    )
    .await?;
    let context = PageContext::new("Tasks")
        .with("page", to_json(&page)?)
        .with("filter", choices)
        .with("self_tasks", json!(is_checked(params.self_tasks.as_deref())))
        .with("query_prefix", json!(query_prefix(&params)));
    render(&state, &session, Some(&user), "tasks/index", context)
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let details = state.tasks.task_details(path_id(&raw_id, TaskId)?).await?;
    let context = PageContext::new(details.task.name.clone())
        .with("task", task_view(&details))
        .with("is_author", json!(details.task.is_created_by(user.id)));
    render(&state, &session, Some(&user), "tasks/detail", context)
}

pub async fn create_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    form_page(&state, &session, &user, None, &TaskForm::default(), None).await
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body).task_form();
    match state.tasks.create_task(&form, user.id).await {
        Ok(_) => {
            session.success(CREATED);
            Ok(Redirect::to(LIST_URL).into_response())
        }
        Err(ServiceError::Validation(errors)) => form_page(&state, &session, &user, None, &form, Some(&errors)).await,
        Err(e) => Err(e.into()),
    }
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let task = state.tasks.get_task(path_id(&raw_id, TaskId)?).await?;
    form_page(&state, &session, &user, Some(task.id), &form_from_task(&task), None).await
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, WebError> {
    let id = path_id(&raw_id, TaskId)?;
    let form = FormData::parse(&body).task_form();
    match state.tasks.update_task(id, &form).await {
        Ok(_) => {
            session.success(UPDATED);
            Ok(Redirect::to(LIST_URL).into_response())
        }
        Err(ServiceError::Validation(errors)) => form_page(&state, &session, &user, Some(id), &form, Some(&errors)).await,
        Err(e) => Err(e.into()),
    }
}

/// Load the task and check the acting user wrote it
async fn authored_task(
    state: &AppState,
    session: &Session,
    acting: &User,
    raw_id: &str,
) -> Result<Result<Task, Response>, WebError> {
    let task = state.tasks.get_task(path_id(raw_id, TaskId)?).await?;
    match check_task_deletion(Some(acting.id), &task) {
        Access::Granted => Ok(Ok(task)),
        access => {
            warn!(acting = %acting.id, task_id = %task.id, "Attempt to delete another user's task");
            Ok(Err(deny(session, access, LIST_URL, NOT_TASK_AUTHOR)))
        }
    }
}

pub async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let task = match authored_task(&state, &session, &user, &raw_id).await? {
        Ok(task) => task,
        Err(redirect) => return Ok(redirect),
    };
    let context = PageContext::new("Delete task").with("task", json!({ "id": task.id, "name": task.name }));
    render(&state, &session, Some(&user), "tasks/delete", context)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let task = match authored_task(&state, &session, &user, &raw_id).await? {
        Ok(task) => task,
        Err(redirect) => return Ok(redirect),
    };
    state.tasks.delete_task(task.id).await?;
    session.success(DELETED);
    Ok(Redirect::to(LIST_URL).into_response())
}
