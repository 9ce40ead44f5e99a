// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod forms;
pub mod permissions;
pub mod repository_factory;

pub mod catalog;
pub mod tasks;
pub mod users;

// Re-export services for convenience
pub use error::ServiceError;
pub use repository_factory::{create_repositories, Repositories};
pub use catalog::{CatalogEntry, CatalogService, StandardCatalogService};
pub use tasks::{StandardTaskService, TaskDetails, TaskService};
pub use users::{StandardUserService, UserService};
