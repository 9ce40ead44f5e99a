// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task List Filtering
//!
//! Narrows the task list by status, executor, label and an "only my tasks"
//! flag. Every supplied criterion must hold (logical AND); absent criteria
//! impose no constraint.
//!
//! ```text
//! ?status=2&label=5&self_tasks=on
//!   └─ TaskFilterParams            raw strings from the query string
//!        └─ TaskFilter::resolve()  typed, blanks dropped, self_tasks → creator
//!             └─ TaskFilter::matches(&task) / SQL WHERE clause
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::label::LabelId;
use crate::domain::status::StatusId;
use crate::domain::task::Task;
use crate::domain::user::UserId;

/// Query-string form of the filter, exactly as submitted by the filter form.
///
/// Every field is optional and may be blank: the HTML form submits
/// `status=` for the "any" choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilterParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub self_tasks: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Typed filter criteria.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<StatusId>,
    pub executor: Option<UserId>,
    pub label: Option<LabelId>,
    /// Set when "only my tasks" is checked
    pub creator: Option<UserId>,
}

impl TaskFilter {
    /// Build the filter for `acting_user` from raw query parameters.
    ///
    /// Blank or unparsable ids are treated as absent rather than rejected.
    pub fn resolve(params: &TaskFilterParams, acting_user: UserId) -> Self {
        Self {
            status: parse_id(params.status.as_deref()).map(StatusId),
            executor: parse_id(params.executor.as_deref()).map(UserId),
            label: parse_id(params.label.as_deref()).map(LabelId),
            creator: if is_checked(params.self_tasks.as_deref()) {
                Some(acting_user)
            } else {
                None
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.executor.is_none()
            && self.label.is_none()
            && self.creator.is_none()
    }

    /// Whether `task` satisfies every supplied criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status_id != status {
                return false;
            }
        }
        if let Some(executor) = self.executor {
            if task.executor_id != Some(executor) {
                return false;
            }
        }
        if let Some(label) = self.label {
            if !task.has_label(label) {
                return false;
            }
        }
        if let Some(creator) = self.creator {
            if task.creator_id != creator {
                return false;
            }
        }
        true
    }
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}

/// Checkbox semantics: a submitted checkbox carries `on`.
pub fn is_checked(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}
