// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Access checks
//!
//! Every guard has the same shape: no acting user means
//! [`Access::Unauthenticated`], a failing predicate means
//! [`Access::Forbidden`]. The presentation layer turns the outcome into a
//! redirect with the matching flash message.

use crate::domain::task::Task;
use crate::domain::user::UserId;

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in.";
pub const NOT_OWNER: &str = "You do not have permission to modify another user.";
pub const NOT_TASK_AUTHOR: &str = "A task can only be deleted by its author.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Unauthenticated,
    Forbidden,
}

impl Access {
    pub fn is_granted(self) -> bool {
        self == Access::Granted
    }
}

/// Evaluate `predicate` against the acting user
pub fn authorize(acting: Option<UserId>, predicate: impl FnOnce(UserId) -> bool) -> Access {
    match acting {
        None => Access::Unauthenticated,
        Some(user) if predicate(user) => Access::Granted,
        Some(_) => Access::Forbidden,
    }
}

/// Users may only edit or delete their own account
pub fn check_user_ownership(acting: Option<UserId>, target: UserId) -> Access {
    authorize(acting, |user| user == target)
}

/// Only the creator may delete a task
pub fn check_task_deletion(acting: Option<UserId>, task: &Task) -> Access {
    authorize(acting, |user| task.is_created_by(user))
}
