// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

use crate::application::forms::FormErrors;
use crate::domain::repository::RepositoryError;
use crate::infrastructure::password::PasswordError;

/// Errors returned by the application services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The submitted form must be shown again with these messages
    #[error("Validation failed")]
    Validation(FormErrors),

    #[error("{0} not found")]
    NotFound(String),

    /// Delete refused because other rows still reference the target
    #[error("{0} is still in use")]
    Protected(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => ServiceError::NotFound(what),
            RepositoryError::Protected(what) => ServiceError::Protected(what),
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormErrors> for ServiceError {
    fn from(errors: FormErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl ServiceError {
    /// Convert a unique-constraint rejection from the store into the same
    /// field error the pre-write check produces.
    pub fn from_write(err: RepositoryError, duplicate_message: &str) -> Self {
        match err {
            RepositoryError::Duplicate { field } => {
                ServiceError::Validation(FormErrors::field(&field, duplicate_message))
            }
            other => other.into(),
        }
    }

    pub fn form_errors(&self) -> Option<&FormErrors> {
        match self {
            ServiceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
