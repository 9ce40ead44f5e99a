// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration, keeping the domain layer free of infrastructure types.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select in-memory or PostgreSQL adapters for all four aggregates

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repository::{
    LabelRepository, StatusRepository, StorageBackend, TaskRepository, UserRepository,
};
use crate::infrastructure::repositories::{
    InMemoryStore, PostgresLabelRepository, PostgresStatusRepository, PostgresTaskRepository,
    PostgresUserRepository,
};

/// One repository per aggregate, all backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub statuses: Arc<dyn StatusRepository>,
    pub labels: Arc<dyn LabelRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    /// All four traits served by one in-memory table set
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            statuses: store.clone(),
            labels: store.clone(),
            tasks: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            statuses: Arc::new(PostgresStatusRepository::new(pool.clone())),
            labels: Arc::new(PostgresLabelRepository::new(pool.clone())),
            tasks: Arc::new(PostgresTaskRepository::new(pool)),
        }
    }
}

/// Creates the repositories for the configured backend. `pool` is required
/// for PostgreSQL and ignored otherwise.
pub fn create_repositories(backend: &StorageBackend, pool: Option<PgPool>) -> anyhow::Result<Repositories> {
    match (backend, pool) {
        (StorageBackend::InMemory, _) => Ok(Repositories::in_memory()),
        (StorageBackend::PostgreSQL(_), Some(pool)) => Ok(Repositories::postgres(pool)),
        (StorageBackend::PostgreSQL(_), None) => {
            anyhow::bail!("PostgreSQL storage selected but no connection pool was provided")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_repositories_share_one_store() {
        let repos = create_repositories(&StorageBackend::InMemory, None).unwrap();
        let user = repos
            .users
            .insert(crate::domain::user::NewUser {
                username: "owner".to_string(),
                first_name: "O".to_string(),
                last_name: "W".to_string(),
                password_hash: String::new(),
            })
            .await
            .unwrap();
        let status = repos.statuses.insert("new").await.unwrap();
        let task = repos
            .tasks
            .insert(crate::domain::task::NewTask {
                name: "t1".to_string(),
                description: String::new(),
                status_id: status.id,
                creator_id: user.id,
                executor_id: None,
                label_ids: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(task.status_id, status.id);
        assert!(repos.statuses.delete(status.id).await.is_err());
    }

    #[test]
    fn test_postgres_without_pool_fails() {
        let backend = StorageBackend::PostgreSQL(crate::domain::repository::PostgresConfig {
            connection_string: "postgres://localhost/task_manager".to_string(),
            max_connections: 1,
        });
        assert!(create_repositories(&backend, None).is_err());
    }
}
