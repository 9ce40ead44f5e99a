// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! User Accounts
//!
//! Signup, profile edits, account deletion and credential checks.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Collaborators:** `UserRepository`, `infrastructure::password`
//!
//! Ownership (a user may only edit or delete themselves) is enforced by the
//! caller through `application::permissions` before these methods run.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::error::ServiceError;
use crate::application::forms::{FormErrors, LoginForm, UserForm, INVALID_LOGIN};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::repository::UserRepository;
use crate::domain::user::{NewUser, User, UserId};
use crate::infrastructure::password::{hash_password, verify_password};

pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, ServiceError>;
    async fn all_users(&self) -> Result<Vec<User>, ServiceError>;
    async fn get_user(&self, id: UserId) -> Result<User, ServiceError>;
    async fn register(&self, form: UserForm) -> Result<User, ServiceError>;
    async fn update_user(&self, id: UserId, form: UserForm) -> Result<User, ServiceError>;
    /// Fails with `Protected` while the user created or is assigned to a task
    async fn delete_user(&self, id: UserId) -> Result<(), ServiceError>;
    /// Check credentials; a failure is a non-field form error
    async fn authenticate(&self, form: &LoginForm) -> Result<User, ServiceError>;
}

pub struct StandardUserService {
    repository: Arc<dyn UserRepository>,
}

impl StandardUserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    async fn validate(&self, form: &UserForm, current: Option<UserId>) -> Result<(), ServiceError> {
        let mut errors = form.validate().err().unwrap_or_default();
        if !errors.has("username") {
            if let Some(existing) = self.repository.find_by_username(&form.username).await? {
                if Some(existing.id) != current {
                    errors.add("username", DUPLICATE_USERNAME);
                }
            }
        }
        errors.into_result().map_err(ServiceError::Validation)
    }
}

#[async_trait]
impl UserService for StandardUserService {
    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, ServiceError> {
        Ok(self.repository.list_page(page).await?)
    }

    async fn all_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.repository.list_all().await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", id)))
    }

    async fn register(&self, form: UserForm) -> Result<User, ServiceError> {
        let form = form.normalized();
        self.validate(&form, None).await?;

        let user = self
            .repository
            .insert(NewUser {
                password_hash: hash_password(&form.password1)?,
                username: form.username,
                first_name: form.first_name,
                last_name: form.last_name,
            })
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_USERNAME))?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    async fn update_user(&self, id: UserId, form: UserForm) -> Result<User, ServiceError> {
        let mut user = self.get_user(id).await?;
        let form = form.normalized();
        self.validate(&form, Some(id)).await?;

        user.password_hash = hash_password(&form.password1)?;
        user.username = form.username;
        user.first_name = form.first_name;
        user.last_name = form.last_name;
        self.repository
            .update(&user)
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_USERNAME))?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ServiceError> {
        match self.repository.delete(id).await {
            Ok(()) => {
                info!(user_id = %id, "User deleted");
                Ok(())
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::Protected(_)) {
                    warn!(user_id = %id, "Refused to delete user referenced by tasks");
                }
                Err(err)
            }
        }
    }

    async fn authenticate(&self, form: &LoginForm) -> Result<User, ServiceError> {
        form.validate()?;
        let username = form.username.trim();
        let user = self.repository.find_by_username(username).await?;

        match user {
            Some(user) if verify_password(&form.password, &user.password_hash) => Ok(user),
            _ => {
                warn!(username = %username, "Failed login attempt");
                let mut errors = FormErrors::new();
                errors.add_non_field(INVALID_LOGIN);
                Err(ServiceError::Validation(errors))
            }
        }
    }
}
