// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::label::{Label, LabelId};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{LabelRepository, RepositoryError};

pub struct PostgresLabelRepository {
    pool: PgPool,
}

impl PostgresLabelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_label_row(row: &PgRow) -> Result<Label, RepositoryError> {
        Ok(Label {
            id: LabelId(row.try_get("id")?),
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl LabelRepository for PostgresLabelRepository {
    async fn insert(&self, name: &str) -> Result<Label, RepositoryError> {
        let row = sqlx::query("INSERT INTO labels (name) VALUES ($1) RETURNING id, name, created_at")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Self::parse_label_row(&row)
    }

    async fn update(&self, label: &Label) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE labels SET name = $2 WHERE id = $1")
            .bind(label.id.0)
            .bind(&label.name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("label {}", label.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: LabelId) -> Result<Option<Label>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM labels WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_label_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM labels WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_label_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Label>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM labels ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_label_row).collect()
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Label>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM labels")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at
            FROM labels
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let labels = rows
            .iter()
            .map(Self::parse_label_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(labels, page, total as usize))
    }

    async fn delete(&self, id: LabelId) -> Result<(), RepositoryError> {
        // Usage goes through the join table, not a column on tasks
        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM task_labels WHERE label_id = $1")
                .bind(id.0)
                .fetch_one(&self.pool)
                .await?;
        if references > 0 {
            return Err(RepositoryError::Protected(format!("label {}", id)));
        }

        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("label {}", id)));
        }
        Ok(())
    }
}
