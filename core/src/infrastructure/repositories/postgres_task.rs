// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! PostgreSQL task repository.
//!
//! Label links live in `task_labels`; they are read back as a sorted array
//! column so a task always comes out of the store as one row.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row, Transaction};

use crate::domain::filter::TaskFilter;
use crate::domain::label::LabelId;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{RepositoryError, TaskRepository};
use crate::domain::status::StatusId;
use crate::domain::task::{normalize_label_ids, NewTask, Task, TaskChanges, TaskId};
use crate::domain::user::UserId;

const TASK_COLUMNS: &str = r#"
    t.id, t.name, t.description, t.status_id, t.creator_id, t.executor_id, t.created_at,
    ARRAY(SELECT tl.label_id FROM task_labels tl WHERE tl.task_id = t.id ORDER BY tl.label_id) AS label_ids
"#;

pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_task_row(row: &PgRow) -> Result<Task, RepositoryError> {
        let executor_id: Option<i64> = row.try_get("executor_id")?;
        let label_ids: Vec<i64> = row.try_get("label_ids")?;
        Ok(Task {
            id: TaskId(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status_id: StatusId(row.try_get("status_id")?),
            creator_id: UserId(row.try_get("creator_id")?),
            executor_id: executor_id.map(UserId),
            label_ids: label_ids.into_iter().map(LabelId).collect(),
            created_at: row.try_get("created_at")?,
        })
    }

    /// Make the links of `task_id` exactly `label_ids`. Surviving links keep
    /// their `created_at` and get a fresh `updated_at`.
    async fn sync_labels(
        tx: &mut Transaction<'_, Postgres>,
        task_id: TaskId,
        label_ids: &[LabelId],
    ) -> Result<(), RepositoryError> {
        let ids: Vec<i64> = label_ids.iter().map(|id| id.0).collect();

        sqlx::query("DELETE FROM task_labels WHERE task_id = $1 AND NOT (label_id = ANY($2))")
            .bind(task_id.0)
            .bind(&ids)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO task_labels (task_id, label_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT (task_id, label_id) DO UPDATE SET updated_at = NOW()
            "#,
        )
        .bind(task_id.0)
        .bind(&ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn fetch_one_task(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks t WHERE t.id = $1", TASK_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_task_row).transpose()
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    builder.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        builder.push(" AND t.status_id = ").push_bind(status.0);
    }
    if let Some(executor) = filter.executor {
        builder.push(" AND t.executor_id = ").push_bind(executor.0);
    }
    if let Some(creator) = filter.creator {
        builder.push(" AND t.creator_id = ").push_bind(creator.0);
    }
    if let Some(label) = filter.label {
        builder
            .push(" AND EXISTS (SELECT 1 FROM task_labels fl WHERE fl.task_id = t.id AND fl.label_id = ")
            .push_bind(label.0)
            .push(")");
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let label_ids = normalize_label_ids(task.label_ids);
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (name, description, status_id, creator_id, executor_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status_id.0)
        .bind(task.creator_id.0)
        .bind(task.executor_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await?;

        Self::sync_labels(&mut tx, TaskId(id), &label_ids).await?;
        tx.commit().await?;

        self.fetch_one_task(TaskId(id))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))
    }

    async fn update(&self, id: TaskId, changes: TaskChanges) -> Result<Task, RepositoryError> {
        let label_ids = normalize_label_ids(changes.label_ids);
        let mut tx = self.pool.begin().await?;

        // creator_id is never rewritten
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET name = $2, description = $3, status_id = $4, executor_id = $5
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.status_id.0)
        .bind(changes.executor_id.map(|id| id.0))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("task {}", id)));
        }

        Self::sync_labels(&mut tx, id, &label_ids).await?;
        tx.commit().await?;

        self.fetch_one_task(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        self.fetch_one_task(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks t WHERE t.name = $1", TASK_COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_task_row).transpose()
    }

    async fn list_page(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<Task>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tasks t", TASK_COLUMNS));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(page.size as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = select.build().fetch_all(&self.pool).await?;
        let tasks = rows
            .iter()
            .map(Self::parse_task_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(total, returned = tasks.len(), "Listed tasks");
        Ok(Page::new(tasks, page, total as usize))
    }

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        // task_labels rows go with the task via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }
}
