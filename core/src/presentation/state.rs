// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use std::sync::Arc;

use crate::application::{
    CatalogService, Repositories, StandardCatalogService, StandardTaskService, StandardUserService,
    TaskService, UserService,
};
use crate::domain::config::SessionConfig;
use crate::domain::label::Label;
use crate::domain::status::Status;
use crate::infrastructure::session_store::SessionStore;
use crate::infrastructure::templates::TemplateEngine;

/// Shared state handed to every handler
pub struct AppState {
    pub users: Arc<dyn UserService>,
    pub statuses: Arc<dyn CatalogService<Status>>,
    pub labels: Arc<dyn CatalogService<Label>>,
    pub tasks: Arc<dyn TaskService>,
    pub sessions: Arc<SessionStore>,
    pub templates: Arc<TemplateEngine>,
    pub session_config: SessionConfig,
}

impl AppState {
    /// Wire the standard services over `repositories`
    pub fn new(repositories: Repositories, session_config: SessionConfig) -> Result<Self> {
        let Repositories { users, statuses, labels, tasks } = repositories;
        Ok(Self {
            tasks: Arc::new(StandardTaskService::new(
                tasks,
                statuses.clone(),
                labels.clone(),
                users.clone(),
            )),
            users: Arc::new(StandardUserService::new(users)),
            statuses: Arc::new(StandardCatalogService::new(statuses)),
            labels: Arc::new(StandardCatalogService::new(labels)),
            sessions: Arc::new(SessionStore::new()),
            templates: Arc::new(TemplateEngine::new()?),
            session_config,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(Repositories::in_memory(), SessionConfig::default())
    }
}
