// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Form Validation
//!
//! Input structs for every create/update form plus the field-level error
//! collection rendered next to the inputs. Validation here is purely
//! syntactic (required, length, charset, id parsing); checks that need the
//! store (uniqueness, referenced rows exist) happen in the services.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Turn submitted strings into typed, validated commands

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::label::LabelId;
use crate::domain::status::StatusId;
use crate::domain::task::TASK_NAME_MAX_LENGTH;
use crate::domain::user::UserId;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PERSON_NAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 3;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

// ============================================================================
// Errors
// ============================================================================

/// Field-level and form-level validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn max_length_message(max: usize, actual: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, actual
    )
}

/// Required + max length check on an already trimmed value
fn check_text(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length == 0 {
        errors.add(field, REQUIRED);
    } else if length > max {
        errors.add(field, max_length_message(max, length));
    }
}

/// Parse an optional id field. Blank means absent; junk is an error.
fn parse_choice(errors: &mut FormErrors, field: &str, raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

// ============================================================================
// Status / Label
// ============================================================================

/// Single-field form shared by statuses and labels
#[derive(Debug, Clone, Default, Serialize)]
pub struct NameForm {
    pub name: String,
}

impl NameForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into().trim().to_string() }
    }

    /// Require a name of at most `max` characters
    pub fn validate(&self, max: usize) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        check_text(&mut errors, "name", &self.name, max);
        errors.into_result()
    }
}

// ============================================================================
// Task
// ============================================================================

/// Submitted task form, values as typed by the user
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
    pub status: String,
    pub executor: String,
    pub labels: Vec<String>,
}

/// Task form after syntactic validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTaskForm {
    pub name: String,
    pub description: String,
    pub status_id: StatusId,
    pub executor_id: Option<UserId>,
    pub label_ids: Vec<LabelId>,
}

impl TaskForm {
    pub fn validate(&self) -> Result<ValidTaskForm, FormErrors> {
        let mut errors = FormErrors::new();
        let name = self.name.trim().to_string();
        check_text(&mut errors, "name", &name, TASK_NAME_MAX_LENGTH);

        let status_raw = self.status.trim();
        if status_raw.is_empty() {
            errors.add("status", REQUIRED);
        }
        let status_id = parse_choice(&mut errors, "status", status_raw).map(StatusId);
        let executor_id = parse_choice(&mut errors, "executor", self.executor.trim()).map(UserId);

        let mut label_ids = Vec::new();
        for raw in &self.labels {
            if let Some(id) = parse_choice(&mut errors, "labels", raw.trim()) {
                label_ids.push(LabelId(id));
            }
        }

        match (errors.into_result(), status_id) {
            (Ok(()), Some(status_id)) => Ok(ValidTaskForm {
                name,
                description: self.description.trim().to_string(),
                status_id,
                executor_id,
                label_ids,
            }),
            (Err(errors), _) => Err(errors),
            (Ok(()), None) => Err(FormErrors::field("status", REQUIRED)),
        }
    }
}

// ============================================================================
// User
// ============================================================================

/// Signup and profile edit form
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

impl UserForm {
    /// Trims the text fields; passwords are kept verbatim
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        check_text(&mut errors, "username", &self.username, USERNAME_MAX_LENGTH);
        if !self.username.is_empty() && !self.username.chars().all(is_username_char) {
            errors.add("username", INVALID_USERNAME);
        }
        check_text(&mut errors, "first_name", &self.first_name, PERSON_NAME_MAX_LENGTH);
        check_text(&mut errors, "last_name", &self.last_name, PERSON_NAME_MAX_LENGTH);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", PASSWORD_MISMATCH);
            } else if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
                errors.add(
                    "password2",
                    format!(
                        "This password is too short. It must contain at least {} characters.",
                        PASSWORD_MIN_LENGTH
                    ),
                );
            }
        }

        errors.into_result()
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}
