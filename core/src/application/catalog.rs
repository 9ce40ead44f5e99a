// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Catalogs: statuses and labels
//!
//! Both are flat lists of uniquely named rows that tasks point at, with the
//! same lifecycle: create, rename, list, and delete while unreferenced. One
//! generic service covers both; the per-kind parts (repository, wording,
//! name limit) come from [`CatalogEntry`] and [`CatalogStore`].
//!
//! ```text
//! StandardCatalogService<Status> ──> Arc<dyn StatusRepository>
//! StandardCatalogService<Label>  ──> Arc<dyn LabelRepository>
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, NameForm};
use crate::domain::label::{Label, LabelId, LABEL_NAME_MAX_LENGTH};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::{LabelRepository, RepositoryError, StatusRepository};
use crate::domain::status::{Status, StatusId, STATUS_NAME_MAX_LENGTH};

pub const DUPLICATE_STATUS: &str = "Status with this Name already exists.";
pub const DUPLICATE_LABEL: &str = "Label with this Name already exists.";

/// A row known by a unique, non-blank name
pub trait CatalogEntry: Clone + Send + Sync + 'static {
    type Id: Copy + PartialEq + fmt::Display + Serialize + Send + Sync + 'static;

    /// Singular noun for log lines and not-found errors
    const NOUN: &'static str;
    /// Field error when another row already has the name
    const DUPLICATE: &'static str;
    const MAX_NAME_LENGTH: usize;

    fn id(&self) -> Self::Id;
    fn name(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn set_name(&mut self, name: String);
}

/// Persistence a catalog needs
#[async_trait]
pub trait CatalogStore<E: CatalogEntry>: Send + Sync {
    async fn insert(&self, name: &str) -> Result<E, RepositoryError>;
    async fn update(&self, entry: &E) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<E>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<E>, RepositoryError>;
    async fn list_page(&self, page: PageRequest) -> Result<Page<E>, RepositoryError>;
    async fn delete(&self, id: E::Id) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CatalogService<E: CatalogEntry>: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Page<E>, ServiceError>;
    /// Every entry, ordered by name
    async fn all(&self) -> Result<Vec<E>, ServiceError>;
    async fn get(&self, id: E::Id) -> Result<E, ServiceError>;
    async fn create(&self, form: &NameForm) -> Result<E, ServiceError>;
    async fn rename(&self, id: E::Id, form: &NameForm) -> Result<E, ServiceError>;
    /// Fails with `Protected` while any task references the entry
    async fn delete(&self, id: E::Id) -> Result<(), ServiceError>;
}

pub struct StandardCatalogService<E: CatalogEntry> {
    store: Arc<dyn CatalogStore<E>>,
}

impl<E: CatalogEntry> StandardCatalogService<E> {
    pub fn new(store: impl CatalogStore<E> + 'static) -> Self {
        Self { store: Arc::new(store) }
    }

    async fn ensure_name_free(&self, name: &str, current: Option<E::Id>) -> Result<(), ServiceError> {
        match self.store.find_by_name(name).await? {
            Some(existing) if Some(existing.id()) != current => {
                Err(FormErrors::field("name", E::DUPLICATE).into())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<E: CatalogEntry> CatalogService<E> for StandardCatalogService<E> {
    async fn list(&self, page: PageRequest) -> Result<Page<E>, ServiceError> {
        Ok(self.store.list_page(page).await?)
    }

    async fn all(&self) -> Result<Vec<E>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    async fn get(&self, id: E::Id) -> Result<E, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {}", E::NOUN, id)))
    }

    async fn create(&self, form: &NameForm) -> Result<E, ServiceError> {
        form.validate(E::MAX_NAME_LENGTH)?;
        self.ensure_name_free(&form.name, None).await?;

        let entry = self
            .store
            .insert(&form.name)
            .await
            .map_err(|e| ServiceError::from_write(e, E::DUPLICATE))?;
        info!(kind = E::NOUN, id = %entry.id(), name = %entry.name(), "Catalog entry created");
        Ok(entry)
    }

    async fn rename(&self, id: E::Id, form: &NameForm) -> Result<E, ServiceError> {
        let mut entry = self.get(id).await?;
        form.validate(E::MAX_NAME_LENGTH)?;
        self.ensure_name_free(&form.name, Some(id)).await?;

        entry.set_name(form.name.clone());
        self.store
            .update(&entry)
            .await
            .map_err(|e| ServiceError::from_write(e, E::DUPLICATE))?;
        info!(kind = E::NOUN, id = %id, name = %entry.name(), "Catalog entry renamed");
        Ok(entry)
    }

    async fn delete(&self, id: E::Id) -> Result<(), ServiceError> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!(kind = E::NOUN, id = %id, "Catalog entry deleted");
                Ok(())
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::Protected(_)) {
                    warn!(kind = E::NOUN, id = %id, "Refused to delete entry still used by tasks");
                }
                Err(err)
            }
        }
    }
}

// ============================================================================
// Statuses
// ============================================================================

impl CatalogEntry for Status {
    type Id = StatusId;

    const NOUN: &'static str = "status";
    const DUPLICATE: &'static str = DUPLICATE_STATUS;
    const MAX_NAME_LENGTH: usize = STATUS_NAME_MAX_LENGTH;

    fn id(&self) -> StatusId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

// Method lookup on `self` would find `CatalogStore` first, hence the
// fully qualified repository calls.
#[async_trait]
impl CatalogStore<Status> for Arc<dyn StatusRepository> {
    async fn insert(&self, name: &str) -> Result<Status, RepositoryError> {
        StatusRepository::insert(&**self, name).await
    }

    async fn update(&self, entry: &Status) -> Result<(), RepositoryError> {
        StatusRepository::update(&**self, entry).await
    }

    async fn find_by_id(&self, id: StatusId) -> Result<Option<Status>, RepositoryError> {
        StatusRepository::find_by_id(&**self, id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Status>, RepositoryError> {
        StatusRepository::find_by_name(&**self, name).await
    }

    async fn list_all(&self) -> Result<Vec<Status>, RepositoryError> {
        StatusRepository::list_all(&**self).await
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Status>, RepositoryError> {
        StatusRepository::list_page(&**self, page).await
    }

    async fn delete(&self, id: StatusId) -> Result<(), RepositoryError> {
        StatusRepository::delete(&**self, id).await
    }
}

// ============================================================================
// Labels
// ============================================================================

impl CatalogEntry for Label {
    type Id = LabelId;

    const NOUN: &'static str = "label";
    const DUPLICATE: &'static str = DUPLICATE_LABEL;
    const MAX_NAME_LENGTH: usize = LABEL_NAME_MAX_LENGTH;

    fn id(&self) -> LabelId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[async_trait]
impl CatalogStore<Label> for Arc<dyn LabelRepository> {
    async fn insert(&self, name: &str) -> Result<Label, RepositoryError> {
        LabelRepository::insert(&**self, name).await
    }

    async fn update(&self, entry: &Label) -> Result<(), RepositoryError> {
        LabelRepository::update(&**self, entry).await
    }

    async fn find_by_id(&self, id: LabelId) -> Result<Option<Label>, RepositoryError> {
        LabelRepository::find_by_id(&**self, id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, RepositoryError> {
        LabelRepository::find_by_name(&**self, name).await
    }

    async fn list_all(&self) -> Result<Vec<Label>, RepositoryError> {
        LabelRepository::list_all(&**self).await
    }

    async fn list_page(&self, page: PageRequest) -> Result<Page<Label>, RepositoryError> {
        LabelRepository::list_page(&**self, page).await
    }

    async fn delete(&self, id: LabelId) -> Result<(), RepositoryError> {
        LabelRepository::delete(&**self, id).await
    }
}
