// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `application/x-www-form-urlencoded` request bodies and query strings.
//!
//! Multi-selects submit the same key once per selected option, so the body
//! is kept as an ordered list of pairs rather than a map. Query strings go
//! through the same parser; a repeated single-valued key keeps its first
//! value.

use url::form_urlencoded;

use crate::application::forms::{LoginForm, NameForm, TaskForm, UserForm};
use crate::domain::filter::TaskFilterParams;
use crate::domain::pagination::PageRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value for `key`, untrimmed
    pub fn raw(&self, key: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Parse a request's query string, if any
    pub fn from_query(query: Option<&str>) -> Self {
        Self::parse(query.unwrap_or_default().as_bytes())
    }

    /// First value for `key`, when the key is present at all
    pub fn first(&self, key: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// First value for `key`, trimmed
    pub fn value(&self, key: &str) -> String {
        self.raw(key).trim().to_string()
    }

    /// Every non-blank value submitted for `key`
    pub fn values(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }

    /// `?page=` on list views
    pub fn page(&self) -> PageRequest {
        PageRequest::from_query(self.first("page").as_deref())
    }

    pub fn filter_params(&self) -> TaskFilterParams {
        TaskFilterParams {
            status: self.first("status"),
            executor: self.first("executor"),
            label: self.first("label"),
            self_tasks: self.first("self_tasks"),
            page: self.first("page"),
        }
    }

    pub fn name_form(&self) -> NameForm {
        NameForm::new(self.raw("name"))
    }

    pub fn task_form(&self) -> TaskForm {
        TaskForm {
            name: self.value("name"),
            description: self.value("description"),
            status: self.value("status"),
            executor: self.value("executor"),
            labels: self.values("labels"),
        }
    }

    pub fn user_form(&self) -> UserForm {
        UserForm {
            username: self.value("username"),
            first_name: self.value("first_name"),
            last_name: self.value("last_name"),
            password1: self.raw("password1").to_string(),
            password2: self.raw("password2").to_string(),
        }
    }

    pub fn login_form(&self) -> LoginForm {
        LoginForm {
            username: self.value("username"),
            password: self.raw("password").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_and_decoding() {
        let data = FormData::parse(b"name=Fix+the+%26+bug&labels=1&labels=3&labels=&executor=");
        let form = data.task_form();
        assert_eq!(form.name, "Fix the & bug");
        assert_eq!(form.labels, vec!["1", "3"]);
        assert_eq!(form.executor, "");
    }

    #[test]
    fn test_passwords_are_not_trimmed() {
        let data = FormData::parse(b"username=+jdoe+&password=+pw+");
        let login = data.login_form();
        assert_eq!(login.username, "jdoe");
        assert_eq!(login.password, " pw ");
    }

    #[test]
    fn test_repeated_query_keys_keep_first_value() {
        let params = FormData::from_query(Some("label=1&label=2&status=&page=3&page=x")).filter_params();
        assert_eq!(params.label.as_deref(), Some("1"));
        assert_eq!(params.status.as_deref(), Some(""));
        assert_eq!(params.executor, None);
        assert_eq!(params.page.as_deref(), Some("3"));
    }

    #[test]
    fn test_page_from_query() {
        assert_eq!(FormData::from_query(Some("page=2&page=9")).page(), PageRequest::new(2));
        assert_eq!(FormData::from_query(None).page(), PageRequest::default());
    }

    #[test]
    fn test_missing_key_is_empty() {
        let data = FormData::parse(b"");
        assert_eq!(data.value("name"), "");
        assert!(data.values("labels").is_empty());
    }
}
