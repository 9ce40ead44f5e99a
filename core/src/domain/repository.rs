// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `UserRepository` | `User` | `InMemoryStore`, `PostgresUserRepository` |
//! | `StatusRepository` | `Status` | `InMemoryStore`, `PostgresStatusRepository` |
//! | `LabelRepository` | `Label` | `InMemoryStore`, `PostgresLabelRepository` |
//! | `TaskRepository` | `Task` | `InMemoryStore`, `PostgresTaskRepository` |
//!
//! ## Referential integrity
//!
//! Deleting a user, status or label that a task still references never
//! cascades: implementations must return [`RepositoryError::Protected`] and
//! leave the row in place. Deleting a task removes its label links only.

use async_trait::async_trait;

use crate::domain::filter::TaskFilter;
use crate::domain::label::{Label, LabelId};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::status::{Status, StatusId};
use crate::domain::task::{NewTask, Task, TaskChanges, TaskId};
use crate::domain::user::{NewUser, User, UserId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for User aggregates
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, assigning id and creation time
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Overwrite username, names and password hash
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// All users, newest first
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;

    async fn list_page(&self, page: PageRequest) -> Result<Page<User>, RepositoryError>;

    /// Delete a user; `Protected` while any task names them creator or executor
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
}

/// Repository interface for Status aggregates
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn insert(&self, name: &str) -> Result<Status, RepositoryError>;

    async fn update(&self, status: &Status) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: StatusId) -> Result<Option<Status>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Status>, RepositoryError>;

    /// All statuses ordered by name
    async fn list_all(&self) -> Result<Vec<Status>, RepositoryError>;

    async fn list_page(&self, page: PageRequest) -> Result<Page<Status>, RepositoryError>;

    /// Delete a status; `Protected` while any task uses it
    async fn delete(&self, id: StatusId) -> Result<(), RepositoryError>;
}

/// Repository interface for Label aggregates
#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn insert(&self, name: &str) -> Result<Label, RepositoryError>;

    async fn update(&self, label: &Label) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: LabelId) -> Result<Option<Label>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, RepositoryError>;

    /// All labels ordered by name
    async fn list_all(&self) -> Result<Vec<Label>, RepositoryError>;

    async fn list_page(&self, page: PageRequest) -> Result<Page<Label>, RepositoryError>;

    /// Delete a label; `Protected` while any task carries it
    async fn delete(&self, id: LabelId) -> Result<(), RepositoryError>;
}

/// Repository interface for Task aggregates
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task together with its label links
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError>;

    /// Apply editable fields and replace the label links. The creator is untouched.
    async fn update(&self, id: TaskId, changes: TaskChanges) -> Result<Task, RepositoryError>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Task>, RepositoryError>;

    /// Tasks matching `filter`, newest first
    async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<Task>, RepositoryError>;

    /// Delete a task and its label links
    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value for {field}")]
    Duplicate { field: String },

    /// The row is still referenced and cannot be deleted
    #[error("Entity is still referenced: {0}")]
    Protected(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Postgres SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => RepositoryError::Duplicate {
                    field: unique_field(db_err.constraint()),
                },
                Some(FOREIGN_KEY_VIOLATION) => RepositoryError::Protected(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                ),
                _ => RepositoryError::Database(db_err.to_string()),
            },
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

/// Map a unique constraint name such as `users_username_key` to the form
/// field it guards.
fn unique_field(constraint: Option<&str>) -> String {
    match constraint {
        Some(name) if name.contains("username") => "username".to_string(),
        _ => "name".to_string(),
    }
}
