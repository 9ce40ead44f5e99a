// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tasks
//!
//! Task creation, editing, filtering and deletion, plus assembly of the
//! read models the task pages display (status, creator, executor and label
//! names resolved alongside each task).
//!
//! # Rules
//!
//! - The creator is the acting user at creation and is never changed.
//! - Status, executor and labels must reference existing rows.
//! - Only the creator may delete; the check lives in
//!   `application::permissions::check_task_deletion`.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, TaskForm, ValidTaskForm, INVALID_CHOICE};
use crate::domain::filter::TaskFilter;
use crate::domain::label::{Label, LabelId};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{LabelRepository, StatusRepository, TaskRepository, UserRepository};
use crate::domain::status::{Status, StatusId};
use crate::domain::task::{NewTask, Task, TaskChanges, TaskId};
use crate::domain::user::{User, UserId};

pub const DUPLICATE_TASK: &str = "Task with this Name already exists.";

/// A task with its references resolved
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    pub task: Task,
    pub status: Status,
    pub creator: User,
    pub executor: Option<User>,
    pub labels: Vec<Label>,
}

#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list_tasks(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<TaskDetails>, ServiceError>;
    async fn get_task(&self, id: TaskId) -> Result<Task, ServiceError>;
    async fn task_details(&self, id: TaskId) -> Result<TaskDetails, ServiceError>;
    /// `creator` becomes the task's permanent author
    async fn create_task(&self, form: &TaskForm, creator: UserId) -> Result<Task, ServiceError>;
    async fn update_task(&self, id: TaskId, form: &TaskForm) -> Result<Task, ServiceError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ServiceError>;
}

pub struct StandardTaskService {
    tasks: Arc<dyn TaskRepository>,
    statuses: Arc<dyn StatusRepository>,
    labels: Arc<dyn LabelRepository>,
    users: Arc<dyn UserRepository>,
}

/// Lookup tables for resolving task references in bulk
struct References {
    statuses: HashMap<StatusId, Status>,
    users: HashMap<UserId, User>,
    labels: HashMap<LabelId, Label>,
}

impl References {
    fn resolve(&self, task: Task) -> Result<TaskDetails, ServiceError> {
        let status = self
            .statuses
            .get(&task.status_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("status {}", task.status_id)))?;
        let creator = self
            .users
            .get(&task.creator_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", task.creator_id)))?;
        let executor = task.executor_id.and_then(|id| self.users.get(&id).cloned());
        let mut labels: Vec<Label> = task
            .label_ids
            .iter()
            .filter_map(|id| self.labels.get(id).cloned())
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(TaskDetails { task, status, creator, executor, labels })
    }
}

impl StandardTaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        statuses: Arc<dyn StatusRepository>,
        labels: Arc<dyn LabelRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { tasks, statuses, labels, users }
    }

    async fn references(&self) -> Result<References, ServiceError> {
        Ok(References {
            statuses: self.statuses.list_all().await?.into_iter().map(|s| (s.id, s)).collect(),
            users: self.users.list_all().await?.into_iter().map(|u| (u.id, u)).collect(),
            labels: self.labels.list_all().await?.into_iter().map(|l| (l.id, l)).collect(),
        })
    }

    /// Syntactic validation, then existence and uniqueness checks against the store
    async fn validate(&self, form: &TaskForm, current: Option<TaskId>) -> Result<ValidTaskForm, ServiceError> {
        let valid = form.validate()?;
        let mut errors = FormErrors::new();

        if let Some(existing) = self.tasks.find_by_name(&valid.name).await? {
            if Some(existing.id) != current {
                errors.add("name", DUPLICATE_TASK);
            }
        }
        if self.statuses.find_by_id(valid.status_id).await?.is_none() {
            errors.add("status", INVALID_CHOICE);
        }
        if let Some(executor) = valid.executor_id {
            if self.users.find_by_id(executor).await?.is_none() {
                errors.add("executor", INVALID_CHOICE);
            }
        }
        for label in &valid.label_ids {
            if self.labels.find_by_id(*label).await?.is_none() {
                errors.add("labels", INVALID_CHOICE);
                break;
            }
        }

        errors.into_result()?;
        Ok(valid)
    }
}

#[async_trait]
impl TaskService for StandardTaskService {
    async fn list_tasks(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<TaskDetails>, ServiceError> {
        let tasks = self.tasks.list_page(filter, page).await?;
        let references = self.references().await?;
        tasks.try_map(|task| references.resolve(task))
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ServiceError> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("task {}", id)))
    }

    async fn task_details(&self, id: TaskId) -> Result<TaskDetails, ServiceError> {
        let task = self.get_task(id).await?;
        self.references().await?.resolve(task)
    }

    async fn create_task(&self, form: &TaskForm, creator: UserId) -> Result<Task, ServiceError> {
        let valid = self.validate(form, None).await?;
        let task = self
            .tasks
            .insert(NewTask {
                name: valid.name,
                description: valid.description,
                status_id: valid.status_id,
                creator_id: creator,
                executor_id: valid.executor_id,
                label_ids: valid.label_ids,
            })
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_TASK))?;
        info!(task_id = %task.id, creator_id = %creator, "Task created");
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, form: &TaskForm) -> Result<Task, ServiceError> {
        self.get_task(id).await?;
        let valid = self.validate(form, Some(id)).await?;
        let task = self
            .tasks
            .update(
                id,
                TaskChanges {
                    name: valid.name,
                    description: valid.description,
                    status_id: valid.status_id,
                    executor_id: valid.executor_id,
                    label_ids: valid.label_ids,
                },
            )
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_TASK))?;
        info!(task_id = %task.id, "Task updated");
        Ok(task)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ServiceError> {
        self.tasks.delete(id).await?;
        info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
