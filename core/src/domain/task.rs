// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::label::LabelId;
use crate::domain::status::StatusId;
use crate::domain::user::UserId;

/// Maximum length of a task name
pub const TASK_NAME_MAX_LENGTH: usize = 150;

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn from_string(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.trim().parse()?))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// A unit of work.
///
/// `creator_id` is fixed when the task is inserted; [`TaskChanges`] has no
/// field for it, so no update path can rewrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub status_id: StatusId,
    pub creator_id: UserId,
    pub executor_id: Option<UserId>,
    /// Attached labels, in ascending id order
    pub label_ids: Vec<LabelId>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.label_ids.contains(&label_id)
    }

    pub fn is_created_by(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
    }

    /// Whether `user_id` appears on this task as creator or executor.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.creator_id == user_id || self.executor_id == Some(user_id)
    }
}

/// A row of the task/label join relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLabel {
    pub task_id: TaskId,
    pub label_id: LabelId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub status_id: StatusId,
    pub creator_id: UserId,
    pub executor_id: Option<UserId>,
    pub label_ids: Vec<LabelId>,
}

/// Editable fields of an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub name: String,
    pub description: String,
    pub status_id: StatusId,
    pub executor_id: Option<UserId>,
    pub label_ids: Vec<LabelId>,
}

/// Sort label ids and drop repeats so join rows stay unique.
pub fn normalize_label_ids(mut ids: Vec<LabelId>) -> Vec<LabelId> {
    ids.sort();
    ids.dedup();
    ids
}
