// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Helpers shared by the page handlers: rendering, view models and
//! parameter parsing.

use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::application::forms::FormErrors;
use crate::application::CatalogEntry;
use crate::domain::user::User;
use crate::infrastructure::templates::PageContext;
use crate::presentation::error::WebError;
use crate::presentation::session::Session;
use crate::presentation::state::AppState;

/// Render `template`, adding navigation and pending flashes
pub fn render(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
    template: &str,
    context: PageContext,
) -> Result<Response, WebError> {
    let context = context.user(user).flashes(session.take_flashes());
    let html = state.templates.render(template, &context)?;
    Ok(Html(html).into_response())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

pub fn to_json(value: &impl Serialize) -> Result<Value, WebError> {
    Ok(serde_json::to_value(value)?)
}

/// Parse a numeric path segment; anything else is a 404
pub fn path_id<T>(raw: &str, wrap: impl FnOnce(i64) -> T) -> Result<T, WebError> {
    raw.trim()
        .parse::<i64>()
        .map(wrap)
        .map_err(|_| WebError::NotFound(format!("invalid id '{}'", raw)))
}

pub fn errors_json(errors: Option<&FormErrors>) -> Result<Value, WebError> {
    match errors {
        Some(errors) => to_json(errors),
        None => Ok(json!({ "fields": {}, "non_field": [] })),
    }
}

pub fn user_view(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "full_name": user.full_name(),
        "created_at": format_timestamp(user.created_at),
    })
}

/// A status or label row
pub fn entry_view<E: CatalogEntry>(entry: &E) -> Value {
    json!({
        "id": entry.id(),
        "name": entry.name(),
        "created_at": format_timestamp(entry.created_at()),
    })
}

/// `<option>` entries for a select; `selected` holds the submitted ids as text
pub fn options<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    id: impl Fn(&T) -> i64,
    label: impl Fn(&T) -> String,
    selected: &[String],
) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| {
            let value = id(item).to_string();
            json!({
                "id": value,
                "name": label(item),
                "selected": selected.iter().any(|s| *s == value),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::{Status, StatusId};
    use chrono::TimeZone;

    #[test]
    fn test_path_id() {
        assert_eq!(path_id("12", StatusId).unwrap(), StatusId(12));
        assert!(matches!(path_id("abc", StatusId), Err(WebError::NotFound(_))));
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_timestamp(at), "09.03.2024 14:05");
    }

    #[test]
    fn test_options_mark_selected() {
        let statuses = vec![
            Status { id: StatusId(1), name: "new".into(), created_at: Utc::now() },
            Status { id: StatusId(2), name: "done".into(), created_at: Utc::now() },
        ];
        let opts = options(&statuses, |s: &Status| s.id.0, |s: &Status| s.name.clone(), &["2".to_string()]);
        assert_eq!(opts[0]["selected"], json!(false));
        assert_eq!(opts[1]["selected"], json!(true));
        assert_eq!(opts[1]["name"], json!("done"));
    }
}
