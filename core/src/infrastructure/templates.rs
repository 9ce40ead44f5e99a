// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Page Template Engine
//!
//! Server-side HTML rendering for every page of the web UI, using
//! Handlebars templates compiled into the binary.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a page context into an HTML document
//! - **Integration:** Presentation handlers → `TemplateEngine::render` → response body
//!
//! # Layout
//!
//! Every page template wraps its body in `{{#> layout}} ... {{/layout}}`
//! and list pages include `{{> pagination}}`.
//! The layout partial renders the navigation (which depends on
//! `current_user`), the flash messages, and then the page body.
//!
//! # Context
//!
//! - `{{title}}` - page title
//! - `{{current_user}}` - logged-in user (`id`, `username`, `full_name`), absent when anonymous
//! - `{{flashes}}` - one-shot messages (`level`, `text`)
//! - anything else set with [`PageContext::with`]

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::user::User;
use crate::infrastructure::session_store::FlashMessage;

// ============================================================================
// Page Context
// ============================================================================

/// Navigation view of the logged-in user
#[derive(Debug, Clone, Serialize)]
pub struct NavUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl From<&User> for NavUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.clone(),
            full_name: user.full_name(),
        }
    }
}

/// Data handed to a page template
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageContext {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user: Option<NavUser>,

    pub flashes: Vec<FlashMessage>,

    /// Page-specific fields
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl PageContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn user(mut self, user: Option<&User>) -> Self {
        self.current_user = user.map(NavUser::from);
        self
    }

    pub fn flashes(mut self, flashes: Vec<FlashMessage>) -> Self {
        self.flashes = flashes;
        self
    }

    /// Add a page-specific field
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Template Engine
// ============================================================================

/// Shared fragments; `layout` wraps every page, `pagination` renders `page` navigation
const PARTIALS: &[(&str, &str)] = &[
    ("layout", include_str!("../../templates/layout.hbs")),
    ("pagination", include_str!("../../templates/pagination.hbs")),
];

const PAGES: &[(&str, &str)] = &[
    ("home", include_str!("../../templates/home.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("error", include_str!("../../templates/error.hbs")),
    ("users/index", include_str!("../../templates/users/index.hbs")),
    ("users/form", include_str!("../../templates/users/form.hbs")),
    ("users/detail", include_str!("../../templates/users/detail.hbs")),
    ("users/delete", include_str!("../../templates/users/delete.hbs")),
    ("catalog/index", include_str!("../../templates/catalog/index.hbs")),
    ("catalog/form", include_str!("../../templates/catalog/form.hbs")),
    ("catalog/delete", include_str!("../../templates/catalog/delete.hbs")),
    ("tasks/index", include_str!("../../templates/tasks/index.hbs")),
    ("tasks/form", include_str!("../../templates/tasks/form.hbs")),
    ("tasks/detail", include_str!("../../templates/tasks/detail.hbs")),
    ("tasks/delete", include_str!("../../templates/tasks/delete.hbs")),
];

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Compile the layout and every page template
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Absent optional fields render as empty
        handlebars.set_strict_mode(false);

        for (name, source) in PARTIALS {
            handlebars
                .register_partial(name, *source)
                .with_context(|| format!("Failed to register partial '{}'", name))?;
        }

        for (name, source) in PAGES {
            handlebars
                .register_template_string(name, *source)
                .with_context(|| format!("Failed to register template '{}'", name))?;
        }

        Ok(Self { handlebars })
    }

    /// Render a named page
    pub fn render(&self, name: &str, context: &PageContext) -> Result<String> {
        self.handlebars
            .render(name, context)
            .with_context(|| format!("Failed to render template '{}'", name))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use crate::domain::user::UserId;

    fn user() -> User {
        User {
            id: UserId(7),
            username: "jdoe".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_all_pages_registered() {
        let engine = TemplateEngine::new().unwrap();
        for (name, _) in PAGES {
            assert!(engine.has_template(name), "missing {}", name);
        }
    }

    #[test]
    fn test_anonymous_navigation() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine.render("home", &PageContext::new("Task manager")).unwrap();
        assert!(html.contains("/login/"));
        assert!(!html.contains("/logout/"));
    }

    #[test]
    fn test_logged_in_navigation_and_flashes() {
        let engine = TemplateEngine::new().unwrap();
        let context = PageContext::new("Task manager")
            .user(Some(&user()))
            .flashes(vec![FlashMessage::success("You are logged in")]);
        let html = engine.render("home", &context).unwrap();
        assert!(html.contains("/logout/"));
        assert!(html.contains("/tasks/"));
        assert!(html.contains("You are logged in"));
    }

    #[test]
    fn test_values_are_html_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let context = PageContext::new("Statuses")
            .with("kind", json!({ "plural": "statuses", "noun": "status", "title": "Statuses" }))
            .with(
                "page",
                json!({ "items": [{ "id": 1, "name": "<script>", "created_at": "" }] }),
            );
        let html = engine.render("catalog/index", &context).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_catalog_rows_link_by_kind() {
        let engine = TemplateEngine::new().unwrap();
        let context = PageContext::new("Labels")
            .with("kind", json!({ "plural": "labels", "noun": "label", "title": "Labels" }))
            .with(
                "page",
                json!({ "items": [{ "id": 4, "name": "bug", "created_at": "" }] }),
            );
        let html = engine.render("catalog/index", &context).unwrap();
        assert!(html.contains("href=\"/tasks/?label=4\""));
        assert!(html.contains("href=\"/labels/4/update/\""));
        assert!(html.contains("href=\"/labels/create/\""));
    }

    #[test]
    fn test_pagination_links_keep_filter() {
        let engine = TemplateEngine::new().unwrap();
        let context = PageContext::new("Tasks")
            .user(Some(&user()))
            .with(
                "page",
                json!({
                    "items": [],
                    "number": 2,
                    "num_pages": 3,
                    "is_paginated": true,
                    "has_previous": true,
                    "has_next": true,
                    "previous_page": 1,
                    "next_page": 3,
                }),
            )
            .with("query_prefix", json!("status=4&"));
        let html = engine.render("tasks/index", &context).unwrap();
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains("?status=4&page=3"));
    }

    #[test]
    fn test_unknown_template_fails() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.render("missing", &PageContext::default()).is_err());
    }
}
