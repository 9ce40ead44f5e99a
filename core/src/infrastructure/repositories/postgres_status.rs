// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{RepositoryError, StatusRepository};
use crate::domain::status::{Status, StatusId};

pub struct PostgresStatusRepository {
    pool: PgPool,
}

impl PostgresStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_status_row(row: &PgRow) -> Result<Status, RepositoryError> {
        Ok(Status {
            id: StatusId(row.try_get("id")?),
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl StatusRepository for PostgresStatusRepository {
    async fn insert(&self, name: &str) -> Result<Status, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO statuses (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Self::parse_status_row(&row)
    }

    async fn update(&self, status: &Status) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE statuses SET name = $2 WHERE id = $1")
            .bind(status.id.0)
            .bind(&status.name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("status {}", status.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: StatusId) -> Result<Option<Status>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM statuses WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_status_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Status>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM statuses WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_status_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Status>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM statuses ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_status_row).collect()
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Status>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM statuses")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM statuses
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let statuses = rows
            .iter()
            .map(Self::parse_status_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(statuses, page, total as usize))
    }

    async fn delete(&self, id: StatusId) -> Result<(), RepositoryError> {
        let references: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status_id = $1")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        if references > 0 {
            return Err(RepositoryError::Protected(format!("status {}", id)));
        }

        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("status {}", id)));
        }
        Ok(())
    }
}
