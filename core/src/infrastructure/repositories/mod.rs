// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresUserRepository** - accounts
//! - **PostgresStatusRepository** - workflow states
//! - **PostgresLabelRepository** - labels
//! - **PostgresTaskRepository** - tasks and the `task_labels` join table
//!
//! ## In-Memory Repositories
//!
//! - **InMemoryStore** - one table set behind a single lock, implementing all
//!   four repository traits so that referential checks see a consistent view.
//!   Used for development and tests.

pub mod postgres_label;
pub mod postgres_status;
pub mod postgres_task;
pub mod postgres_user;

pub use postgres_label::PostgresLabelRepository;
pub use postgres_status::PostgresStatusRepository;
pub use postgres_task::PostgresTaskRepository;
pub use postgres_user::PostgresUserRepository;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::filter::TaskFilter;
use crate::domain::label::{Label, LabelId};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{
    LabelRepository, RepositoryError, StatusRepository, TaskRepository, UserRepository,
};
use crate::domain::status::{Status, StatusId};
use crate::domain::task::{normalize_label_ids, NewTask, Task, TaskChanges, TaskId, TaskLabel};
use crate::domain::user::{NewUser, User, UserId};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    statuses: BTreeMap<StatusId, Status>,
    labels: BTreeMap<LabelId, Label>,
    tasks: BTreeMap<TaskId, Task>,
    task_labels: BTreeMap<(TaskId, LabelId), TaskLabel>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_task_references(
        &self,
        status_id: StatusId,
        executor_id: Option<UserId>,
        label_ids: &[LabelId],
    ) -> Result<(), RepositoryError> {
        if !self.statuses.contains_key(&status_id) {
            return Err(RepositoryError::NotFound(format!("status {}", status_id)));
        }
        if let Some(executor) = executor_id {
            if !self.users.contains_key(&executor) {
                return Err(RepositoryError::NotFound(format!("user {}", executor)));
            }
        }
        if let Some(missing) = label_ids.iter().find(|id| !self.labels.contains_key(id)) {
            return Err(RepositoryError::NotFound(format!("label {}", missing)));
        }
        Ok(())
    }

    /// Replace the join rows of `task_id`, keeping `created_at` of links that survive.
    fn replace_links(&mut self, task_id: TaskId, label_ids: &[LabelId]) {
        let now = Utc::now();
        let previous: BTreeMap<LabelId, TaskLabel> = self
            .task_labels
            .iter()
            .filter(|((task, _), _)| *task == task_id)
            .map(|((_, label), link)| (*label, link.clone()))
            .collect();
        self.task_labels.retain(|(task, _), _| *task != task_id);
        for label_id in label_ids {
            let created_at = previous
                .get(label_id)
                .map(|link| link.created_at)
                .unwrap_or(now);
            self.task_labels.insert(
                (task_id, *label_id),
                TaskLabel {
                    task_id,
                    label_id: *label_id,
                    created_at,
                    updated_at: now,
                },
            );
        }
    }
}

/// In-memory backend for all four aggregates
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join rows of one task, ordered by label id
    pub async fn task_links(&self, task_id: TaskId) -> Vec<TaskLabel> {
        let tables = self.tables.read().await;
        tables
            .task_labels
            .values()
            .filter(|link| link.task_id == task_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate { field: "username".to_string() });
        }
        let id = UserId(tables.allocate_id());
        let user = User {
            id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepositoryError::Duplicate { field: "username".to_string() });
        }
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {}", user.id)))?;
        stored.username = user.username.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.password_hash = user.password_hash.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        // Newest first
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let users = UserRepository::list_all(self).await?;
        Ok(Page::from_vec(users, page))
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        if tables.tasks.values().any(|t| t.involves(id)) {
            return Err(RepositoryError::Protected(format!("user {}", id)));
        }
        tables.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StatusRepository for InMemoryStore {
    async fn insert(&self, name: &str) -> Result<Status, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.statuses.values().any(|s| s.name == name) {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        let id = StatusId(tables.allocate_id());
        let status = Status {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.statuses.insert(id, status.clone());
        Ok(status)
    }

    async fn update(&self, status: &Status) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .statuses
            .values()
            .any(|s| s.name == status.name && s.id != status.id)
        {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        let stored = tables
            .statuses
            .get_mut(&status.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("status {}", status.id)))?;
        stored.name = status.name.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: StatusId) -> Result<Option<Status>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.statuses.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Status>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.statuses.values().find(|s| s.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Status>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut statuses: Vec<Status> = tables.statuses.values().cloned().collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(statuses)
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Status>, RepositoryError> {
        let statuses = StatusRepository::list_all(self).await?;
        Ok(Page::from_vec(statuses, page))
    }

    async fn delete(&self, id: StatusId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.statuses.contains_key(&id) {
            return Err(RepositoryError::NotFound(format!("status {}", id)));
        }
        if tables.tasks.values().any(|t| t.status_id == id) {
            return Err(RepositoryError::Protected(format!("status {}", id)));
        }
        tables.statuses.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LabelRepository for InMemoryStore {
    async fn insert(&self, name: &str) -> Result<Label, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.labels.values().any(|l| l.name == name) {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        let id = LabelId(tables.allocate_id());
        let label = Label {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.labels.insert(id, label.clone());
        Ok(label)
    }

    async fn update(&self, label: &Label) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .labels
            .values()
            .any(|l| l.name == label.name && l.id != label.id)
        {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        let stored = tables
            .labels
            .get_mut(&label.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("label {}", label.id)))?;
        stored.name = label.name.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: LabelId) -> Result<Option<Label>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.labels.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.labels.values().find(|l| l.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Label>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut labels: Vec<Label> = tables.labels.values().cloned().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Label>, RepositoryError> {
        let labels = LabelRepository::list_all(self).await?;
        Ok(Page::from_vec(labels, page))
    }

    async fn delete(&self, id: LabelId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.labels.contains_key(&id) {
            return Err(RepositoryError::NotFound(format!("label {}", id)));
        }
        if tables.task_labels.keys().any(|(_, label)| *label == id) {
            return Err(RepositoryError::Protected(format!("label {}", id)));
        }
        tables.labels.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.tasks.values().any(|t| t.name == task.name) {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        if !tables.users.contains_key(&task.creator_id) {
            return Err(RepositoryError::NotFound(format!("user {}", task.creator_id)));
        }
        let label_ids = normalize_label_ids(task.label_ids);
        tables.check_task_references(task.status_id, task.executor_id, &label_ids)?;

        let id = TaskId(tables.allocate_id());
        let task = Task {
            id,
            name: task.name,
            description: task.description,
            status_id: task.status_id,
            creator_id: task.creator_id,
            executor_id: task.executor_id,
            label_ids,
            created_at: Utc::now(),
        };
        tables.replace_links(id, &task.label_ids);
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: TaskId, changes: TaskChanges) -> Result<Task, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Err(RepositoryError::NotFound(format!("task {}", id)));
        }
        if tables
            .tasks
            .values()
            .any(|t| t.name == changes.name && t.id != id)
        {
            return Err(RepositoryError::Duplicate { field: "name".to_string() });
        }
        let label_ids = normalize_label_ids(changes.label_ids);
        tables.check_task_references(changes.status_id, changes.executor_id, &label_ids)?;
        tables.replace_links(id, &label_ids);

        let stored = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))?;
        stored.name = changes.name;
        stored.description = changes.description;
        stored.status_id = changes.status_id;
        stored.executor_id = changes.executor_id;
        stored.label_ids = label_ids;
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Task>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().find(|t| t.name == name).cloned())
    }

    async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<Task>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        // Newest first
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Page::from_vec(tasks, page))
    }

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.tasks.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("task {}", id)));
        }
        tables.task_labels.retain(|(task, _), _| *task != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &InMemoryStore, username: &str) -> User {
        UserRepository::insert(
            store,
            NewUser {
                username: username.to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn new_task(name: &str, status: StatusId, creator: UserId, labels: Vec<LabelId>) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: String::new(),
            status_id: status,
            creator_id: creator,
            executor_id: None,
            label_ids: labels,
        }
    }

    #[tokio::test]
    async fn test_duplicate_status_name_rejected() {
        let store = InMemoryStore::new();
        StatusRepository::insert(&store, "new").await.unwrap();
        let err = StatusRepository::insert(&store, "new").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate { ref field } if field == "name"));
        assert_eq!(StatusRepository::list_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referenced_status_and_label_are_protected() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "owner").await;
        let used = StatusRepository::insert(&store, "used").await.unwrap();
        let unused = StatusRepository::insert(&store, "unused").await.unwrap();
        let label = LabelRepository::insert(&store, "bug").await.unwrap();
        TaskRepository::insert(&store, new_task("t1", used.id, user.id, vec![label.id]))
            .await
            .unwrap();

        let err = StatusRepository::delete(&store, used.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Protected(_)));
        assert!(StatusRepository::find_by_id(&store, used.id).await.unwrap().is_some());

        let err = LabelRepository::delete(&store, label.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Protected(_)));

        let err = UserRepository::delete(&store, user.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Protected(_)));

        StatusRepository::delete(&store, unused.id).await.unwrap();
        assert!(StatusRepository::find_by_id(&store, unused.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_task_releases_label() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "owner").await;
        let status = StatusRepository::insert(&store, "new").await.unwrap();
        let label = LabelRepository::insert(&store, "bug").await.unwrap();
        let task = TaskRepository::insert(&store, new_task("t1", status.id, user.id, vec![label.id]))
            .await
            .unwrap();

        TaskRepository::delete(&store, task.id).await.unwrap();
        assert!(store.task_links(task.id).await.is_empty());
        LabelRepository::delete(&store, label.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_task_update_keeps_creator_and_link_timestamps() {
        let store = InMemoryStore::new();
        let creator = seed_user(&store, "creator").await;
        let executor = seed_user(&store, "executor").await;
        let status = StatusRepository::insert(&store, "new").await.unwrap();
        let bug = LabelRepository::insert(&store, "bug").await.unwrap();
        let ui = LabelRepository::insert(&store, "ui").await.unwrap();
        let task = TaskRepository::insert(&store, new_task("t1", status.id, creator.id, vec![bug.id]))
            .await
            .unwrap();
        let original_link = store.task_links(task.id).await[0].clone();

        let updated = TaskRepository::update(
            &store,
            task.id,
            TaskChanges {
                name: "t1 renamed".to_string(),
                description: "details".to_string(),
                status_id: status.id,
                executor_id: Some(executor.id),
                label_ids: vec![ui.id, bug.id, bug.id],
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.creator_id, creator.id);
        assert_eq!(updated.label_ids, vec![bug.id, ui.id]);
        let links = store.task_links(task.id).await;
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].created_at, original_link.created_at);
    }

    #[tokio::test]
    async fn test_task_with_unknown_status_rejected() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "owner").await;
        let err = TaskRepository::insert(&store, new_task("t1", StatusId(999), user.id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_task_list_newest_first_and_filtered() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "owner").await;
        let a = StatusRepository::insert(&store, "a").await.unwrap();
        let b = StatusRepository::insert(&store, "b").await.unwrap();
        for (name, status) in [("first", a.id), ("second", b.id), ("third", a.id)] {
            TaskRepository::insert(&store, new_task(name, status, user.id, vec![]))
                .await
                .unwrap();
        }

        let all = TaskRepository::list_page(&store, &TaskFilter::default(), PageRequest::default())
            .await
            .unwrap();
        let names: Vec<&str> = all.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        let filter = TaskFilter { status: Some(a.id), ..TaskFilter::default() };
        let only_a = TaskRepository::list_page(&store, &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(only_a.total, 2);
        assert!(only_a.items.iter().all(|t| t.status_id == a.id));
    }
}
