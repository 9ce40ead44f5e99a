// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the web application
//!
//! Each test drives the full axum router (session layer, login guard,
//! handlers, templates) against in-memory repositories, carrying the
//! session cookie between requests like a browser would.

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use task_manager_core::application::forms::{NameForm, TaskForm};
use task_manager_core::domain::filter::TaskFilter;
use task_manager_core::domain::label::Label;
use task_manager_core::domain::pagination::PageRequest;
use task_manager_core::domain::status::Status;
use task_manager_core::domain::task::Task;
use task_manager_core::domain::user::User;
use task_manager_core::presentation::{app, AppState};

const PASSWORD: &str = "s3cret";

// ============================================================================
// Harness
// ============================================================================

struct Browser {
    router: Router,
    state: Arc<AppState>,
    cookie: Option<String>,
}

impl Browser {
    fn new(state: Arc<AppState>) -> Self {
        Self {
            router: app(state.clone()),
            state,
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(value) = response.headers().get(SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        response
    }

    async fn get(&mut self, path: &str) -> Response {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, path: &str, form: &str) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    async fn page(&mut self, path: &str) -> (StatusCode, String) {
        let response = self.get(path).await;
        let status = response.status();
        (status, body_text(response).await)
    }

    async fn signup(&mut self, username: &str) -> User {
        let form = format!(
            "username={u}&first_name={u}&last_name=Tester&password1={p}&password2={p}",
            u = username,
            p = PASSWORD
        );
        let response = self.post("/users/create/", &form).await;
        assert_redirect(&response, "/login/");
        find_user(&self.state, username).await
    }

    async fn login(&mut self, username: &str) {
        let form = format!("username={}&password={}", username, PASSWORD);
        let response = self.post("/login/", &form).await;
        assert_redirect(&response, "/");
    }

    /// A fresh browser sharing this one's server
    fn another(&self) -> Self {
        Self {
            router: self.router.clone(),
            state: self.state.clone(),
            cookie: None,
        }
    }
}

fn server() -> Browser {
    Browser::new(Arc::new(AppState::in_memory().unwrap()))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_redirect(response: &Response, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).unwrap(), location);
}

async fn find_user(state: &AppState, username: &str) -> User {
    state
        .users
        .all_users()
        .await
        .unwrap()
        .into_iter()
        .find(|u| u.username == username)
        .unwrap()
}

async fn status(state: &AppState, name: &str) -> Status {
    state.statuses.create(&NameForm::new(name)).await.unwrap()
}

async fn task(state: &AppState, name: &str, status: &Status, creator: &User, executor: Option<&User>) -> Task {
    let form = TaskForm {
        name: name.to_string(),
        description: String::new(),
        status: status.id.to_string(),
        executor: executor.map(|u| u.id.to_string()).unwrap_or_default(),
        labels: Vec::new(),
    };
    state.tasks.create_task(&form, creator.id).await.unwrap()
}

async fn labelled_task(state: &AppState, name: &str, status: &Status, creator: &User, labels: &[&Label]) -> Task {
    let form = TaskForm {
        name: name.to_string(),
        description: String::new(),
        status: status.id.to_string(),
        executor: String::new(),
        labels: labels.iter().map(|l| l.id.to_string()).collect(),
    };
    state.tasks.create_task(&form, creator.id).await.unwrap()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_health() {
    let mut browser = server();
    let (status, body) = browser.page("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn test_anonymous_request_to_protected_page_redirects_to_login() {
    let mut browser = server();

    let response = browser.get("/tasks/").await;
    assert_redirect(&response, "/login/");
    assert!(browser.cookie.is_some(), "flash should start a session");

    let (status, body) = browser.page("/login/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("You are not logged in! Please log in."));
}

#[tokio::test]
async fn test_anonymous_flash_session_is_released_once_read() {
    let mut browser = server();
    for _ in 0..5 {
        let mut crawler = browser.another();
        assert_redirect(&crawler.get("/tasks/").await, "/login/");
    }
    assert_eq!(browser.state.sessions.len(), 5);

    browser.get("/tasks/").await;
    assert_eq!(browser.state.sessions.len(), 6);
    let (_, body) = browser.page("/login/").await;
    assert!(body.contains("You are not logged in! Please log in."));
    assert_eq!(browser.state.sessions.len(), 5);
}

#[tokio::test]
async fn test_anonymous_post_does_not_execute() {
    let mut browser = server();
    let response = browser.post("/statuses/create/", "name=sneaky").await;
    assert_redirect(&response, "/login/");
    assert!(browser.state.statuses.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signup_login_logout() {
    let mut browser = server();
    browser.signup("alice").await;

    let (_, body) = browser.page("/login/").await;
    assert!(body.contains("User successfully registered"));

    browser.login("alice").await;
    let (_, body) = browser.page("/").await;
    assert!(body.contains("You are logged in"));
    assert!(body.contains("/logout/"));

    let response = browser.post("/logout/", "").await;
    assert_redirect(&response, "/");
    let (_, body) = browser.page("/").await;
    assert!(body.contains("You are logged out"));
    assert!(!body.contains("/logout/"));

    let response = browser.get("/tasks/").await;
    assert_redirect(&response, "/login/");
}

#[tokio::test]
async fn test_login_rotates_session_cookie() {
    let mut browser = server();
    browser.signup("alice").await;
    let before = browser.cookie.clone();
    browser.login("alice").await;
    assert!(browser.cookie.is_some());
    assert_ne!(browser.cookie, before);
}

#[tokio::test]
async fn test_bad_credentials_rerender_login() {
    let mut browser = server();
    browser.signup("alice").await;

    let response = browser.post("/login/", "username=alice&password=wrong").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Please enter a correct username and password"));
    assert!(body.contains("value=\"alice\""));

    let response = browser.get("/tasks/").await;
    assert_redirect(&response, "/login/");
}

#[tokio::test]
async fn test_unknown_session_cookie_is_ignored() {
    let mut browser = server();
    browser.cookie = Some("sessionid=not-a-session".to_string());
    let response = browser.get("/tasks/").await;
    assert_redirect(&response, "/login/");
}

// ============================================================================
// Statuses and labels
// ============================================================================

#[tokio::test]
async fn test_duplicate_status_name_rerenders_form() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;

    let response = browser.post("/statuses/create/", "name=new").await;
    assert_redirect(&response, "/statuses/");

    let response = browser.post("/statuses/create/", "name=new").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Status with this Name already exists."));
    assert!(body.contains("value=\"new\""));

    assert_eq!(browser.state.statuses.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_label_name_is_required() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;

    let response = browser.post("/labels/create/", "name=+++").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert!(browser.state.labels.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_label_rename_and_delete_pages() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;
    let label = browser.state.labels.create(&NameForm::new("bug")).await.unwrap();

    let (code, body) = browser.page(&format!("/labels/{}/update/", label.id)).await;
    assert_eq!(code, StatusCode::OK);
    assert!(body.contains("Edit label"));
    assert!(body.contains("value=\"bug\""));

    let response = browser.post(&format!("/labels/{}/update/", label.id), "name=defect").await;
    assert_redirect(&response, "/labels/");
    let (_, body) = browser.page("/labels/").await;
    assert!(body.contains("Label successfully changed"));
    assert!(body.contains("defect"));

    let (code, body) = browser.page(&format!("/labels/{}/delete/", label.id)).await;
    assert_eq!(code, StatusCode::OK);
    assert!(body.contains("Delete label"));
    assert!(body.contains(&format!("action=\"/labels/{}/delete/\"", label.id)));
}

#[tokio::test]
async fn test_referenced_status_cannot_be_deleted() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;

    let used = status(&browser.state, "in progress").await;
    let unused = status(&browser.state, "archived").await;
    task(&browser.state, "write docs", &used, &alice, None).await;

    let response = browser.post(&format!("/statuses/{}/delete/", used.id), "").await;
    assert_redirect(&response, "/statuses/");
    let (_, body) = browser.page("/statuses/").await;
    assert!(body.contains("Cannot delete status because it is in use"));
    assert!(browser.state.statuses.get(used.id).await.is_ok());

    let response = browser.post(&format!("/statuses/{}/delete/", unused.id), "").await;
    assert_redirect(&response, "/statuses/");
    let (_, body) = browser.page("/statuses/").await;
    assert!(body.contains("Status successfully deleted"));
    assert!(browser.state.statuses.get(unused.id).await.is_err());
}

#[tokio::test]
async fn test_referenced_label_cannot_be_deleted() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;

    let open = status(&browser.state, "open").await;
    let label = browser.state.labels.create(&NameForm::new("bug")).await.unwrap();
    let form = format!("name=crash&description=&status={}&executor=&labels={}", open.id, label.id);
    let response = browser.post("/tasks/create/", &form).await;
    assert_redirect(&response, "/tasks/");

    let response = browser.post(&format!("/labels/{}/delete/", label.id), "").await;
    assert_redirect(&response, "/labels/");
    let (_, body) = browser.page("/labels/").await;
    assert!(body.contains("Cannot delete label because it is in use"));
    assert!(browser.state.labels.get(label.id).await.is_ok());
}

#[tokio::test]
async fn test_pagination_splits_fifteen_records() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;
    for i in 0..15 {
        status(&browser.state, &format!("status {:02}", i)).await;
    }

    let rows = |body: &str| body.matches("/update/\"").count();

    let (code, body) = browser.page("/statuses/").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(rows(&body), 10);
    assert!(body.contains("Page 1 of 2"));

    let (_, body) = browser.page("/statuses/?page=2").await;
    assert_eq!(rows(&body), 5);

    let (code, body) = browser.page("/statuses/?page=3").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(rows(&body), 0);

    let (_, body) = browser.page("/statuses/?page=abc").await;
    assert_eq!(rows(&body), 10);
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn test_create_task_records_creator() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;
    let open = status(&browser.state, "open").await;

    let form = format!("name=Fix+login&description=Broken&status={}&executor={}", open.id, alice.id);
    let response = browser.post("/tasks/create/", &form).await;
    assert_redirect(&response, "/tasks/");

    let page = browser
        .state
        .tasks
        .list_tasks(&TaskFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let created = &page.items[0];
    assert_eq!(created.task.name, "Fix login");
    assert_eq!(created.creator.id, alice.id);
    assert_eq!(created.executor.as_ref().map(|u| u.id), Some(alice.id));

    let (code, body) = browser.page(&format!("/tasks/{}/", created.task.id)).await;
    assert_eq!(code, StatusCode::OK);
    assert!(body.contains("Fix login"));
    assert!(body.contains("Broken"));
}

#[tokio::test]
async fn test_invalid_task_form_keeps_values() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;

    let response = browser.post("/tasks/create/", "name=Orphan&description=&status=999").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Select a valid choice."));
    assert!(body.contains("value=\"Orphan\""));
}

#[tokio::test]
async fn test_update_never_changes_creator() {
    let mut alice_browser = server();
    let alice = alice_browser.signup("alice").await;
    let mut bob_browser = alice_browser.another();
    bob_browser.signup("bob").await;
    bob_browser.login("bob").await;

    let open = status(&alice_browser.state, "open").await;
    let done = status(&alice_browser.state, "done").await;
    let created = task(&alice_browser.state, "ship it", &open, &alice, None).await;

    let form = format!("name=ship+it+now&description=&status={}&executor=", done.id);
    let response = bob_browser.post(&format!("/tasks/{}/update/", created.id), &form).await;
    assert_redirect(&response, "/tasks/");

    let updated = bob_browser.state.tasks.get_task(created.id).await.unwrap();
    assert_eq!(updated.name, "ship it now");
    assert_eq!(updated.status_id, done.id);
    assert_eq!(updated.creator_id, alice.id);
}

#[tokio::test]
async fn test_only_author_can_delete_task() {
    let mut alice_browser = server();
    let alice = alice_browser.signup("alice").await;
    alice_browser.login("alice").await;
    let mut bob_browser = alice_browser.another();
    bob_browser.signup("bob").await;
    bob_browser.login("bob").await;

    let open = status(&alice_browser.state, "open").await;
    let created = task(&alice_browser.state, "guarded", &open, &alice, None).await;
    let delete_url = format!("/tasks/{}/delete/", created.id);

    let response = bob_browser.get(&delete_url).await;
    assert_redirect(&response, "/tasks/");
    let response = bob_browser.post(&delete_url, "").await;
    assert_redirect(&response, "/tasks/");
    let (_, body) = bob_browser.page("/tasks/").await;
    assert!(body.contains("A task can only be deleted by its author."));
    assert!(bob_browser.state.tasks.get_task(created.id).await.is_ok());

    let response = alice_browser.post(&delete_url, "").await;
    assert_redirect(&response, "/tasks/");
    assert!(alice_browser.state.tasks.get_task(created.id).await.is_err());
}

#[tokio::test]
async fn test_task_list_filters() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    let bob = browser.another().signup("bob").await;
    browser.login("alice").await;

    let open = status(&browser.state, "open").await;
    let done = status(&browser.state, "done").await;
    task(&browser.state, "task-open-alice", &open, &alice, Some(&bob)).await;
    task(&browser.state, "task-done-alice", &done, &alice, None).await;
    task(&browser.state, "task-open-bob", &open, &bob, None).await;

    let (_, body) = browser.page(&format!("/tasks/?status={}", open.id)).await;
    assert!(body.contains("task-open-alice"));
    assert!(body.contains("task-open-bob"));
    assert!(!body.contains("task-done-alice"));

    let (_, body) = browser.page("/tasks/?self_tasks=on").await;
    assert!(body.contains("task-open-alice"));
    assert!(body.contains("task-done-alice"));
    assert!(!body.contains("task-open-bob"));

    let (_, body) = browser.page(&format!("/tasks/?status={}&executor={}", open.id, bob.id)).await;
    assert!(body.contains("task-open-alice"));
    assert!(!body.contains("task-open-bob"));

    let (_, body) = browser.page("/tasks/?status=&executor=&label=").await;
    let newest = body.find("task-open-bob").unwrap();
    let oldest = body.find("task-open-alice").unwrap();
    assert!(newest < oldest, "tasks should be listed newest first");
}

#[tokio::test]
async fn test_task_list_filters_by_label() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    let bob = browser.another().signup("bob").await;
    browser.login("alice").await;

    let open = status(&browser.state, "open").await;
    let bug = browser.state.labels.create(&NameForm::new("bug")).await.unwrap();
    let ui = browser.state.labels.create(&NameForm::new("ui")).await.unwrap();
    labelled_task(&browser.state, "task-bug-alice", &open, &alice, &[&bug]).await;
    labelled_task(&browser.state, "task-bug-ui-bob", &open, &bob, &[&bug, &ui]).await;
    labelled_task(&browser.state, "task-plain-alice", &open, &alice, &[]).await;

    let (_, body) = browser.page(&format!("/tasks/?label={}", bug.id)).await;
    assert!(body.contains("task-bug-alice"));
    assert!(body.contains("task-bug-ui-bob"));
    assert!(!body.contains("task-plain-alice"));

    let (_, body) = browser.page(&format!("/tasks/?label={}", ui.id)).await;
    assert!(body.contains("task-bug-ui-bob"));
    assert!(!body.contains("task-bug-alice"));

    let (_, body) = browser.page(&format!("/tasks/?label={}&self_tasks=on", bug.id)).await;
    assert!(body.contains("task-bug-alice"));
    assert!(!body.contains("task-bug-ui-bob"));
    assert!(!body.contains("task-plain-alice"));
}

#[tokio::test]
async fn test_repeated_filter_key_uses_first_value() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;

    let open = status(&browser.state, "open").await;
    let bug = browser.state.labels.create(&NameForm::new("bug")).await.unwrap();
    let ui = browser.state.labels.create(&NameForm::new("ui")).await.unwrap();
    labelled_task(&browser.state, "task-bug", &open, &alice, &[&bug]).await;
    labelled_task(&browser.state, "task-ui", &open, &alice, &[&ui]).await;

    let (code, body) = browser
        .page(&format!("/tasks/?label={}&label={}&page=1&page=2", bug.id, ui.id))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert!(body.contains("task-bug"));
    assert!(!body.contains("task-ui"));

    let (code, _) = browser.page("/statuses/?page=1&page=2").await;
    assert_eq!(code, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_task_renders_not_found() {
    let mut browser = server();
    browser.signup("alice").await;
    browser.login("alice").await;

    let (code, body) = browser.page("/tasks/999/").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"));

    let (code, _) = browser.page("/tasks/abc/").await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (code, _) = browser.page("/no/such/page/").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_list_is_public() {
    let mut browser = server();
    browser.signup("alice").await;
    let (code, body) = browser.page("/users/").await;
    assert_eq!(code, StatusCode::OK);
    assert!(body.contains("alice"));
}

#[tokio::test]
async fn test_cannot_modify_another_user() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.another().signup("bob").await;
    browser.login("bob").await;

    let response = browser.get(&format!("/users/{}/update/", alice.id)).await;
    assert_redirect(&response, "/users/");

    let form = format!(
        "username=hacked&first_name=x&last_name=y&password1={p}&password2={p}",
        p = PASSWORD
    );
    let response = browser.post(&format!("/users/{}/update/", alice.id), &form).await;
    assert_redirect(&response, "/users/");

    let response = browser.post(&format!("/users/{}/delete/", alice.id), "").await;
    assert_redirect(&response, "/users/");

    let (_, body) = browser.page("/users/").await;
    assert!(body.contains("You do not have permission to modify another user."));
    let unchanged = browser.state.users.get_user(alice.id).await.unwrap();
    assert_eq!(unchanged.username, "alice");
}

#[tokio::test]
async fn test_user_updates_own_profile() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;

    let form = format!(
        "username=alice2&first_name=Alice&last_name=Smith&password1={p}&password2={p}",
        p = PASSWORD
    );
    let response = browser.post(&format!("/users/{}/update/", alice.id), &form).await;
    assert_redirect(&response, "/users/");

    let updated = browser.state.users.get_user(alice.id).await.unwrap();
    assert_eq!(updated.username, "alice2");
    assert_eq!(updated.full_name(), "Alice Smith");
}

#[tokio::test]
async fn test_referenced_user_cannot_be_deleted() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;
    let open = status(&browser.state, "open").await;
    task(&browser.state, "mine", &open, &alice, None).await;

    let response = browser.post(&format!("/users/{}/delete/", alice.id), "").await;
    assert_redirect(&response, "/users/");
    let (_, body) = browser.page("/users/").await;
    assert!(body.contains("Cannot delete user because it is in use"));
    assert!(browser.state.users.get_user(alice.id).await.is_ok());
}

#[tokio::test]
async fn test_deleting_own_account_logs_out() {
    let mut browser = server();
    let alice = browser.signup("alice").await;
    browser.login("alice").await;

    let response = browser.post(&format!("/users/{}/delete/", alice.id), "").await;
    assert_redirect(&response, "/users/");
    assert!(browser.state.users.get_user(alice.id).await.is_err());

    let (_, body) = browser.page("/users/").await;
    assert!(body.contains("User successfully deleted"));
    let response = browser.get("/tasks/").await;
    assert_redirect(&response, "/login/");
}
