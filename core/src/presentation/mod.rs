// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`task-manager-core`)
//!
//! Server-rendered HTML over axum. Handlers parse the request, call an
//! application service and either render a template or redirect with a
//! flash message. **No business logic lives here.**
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`router`] | Route table and middleware stack |
//! | [`session`] | Cookie-backed session handle and middleware |
//! | [`auth`] | Login guard and the acting-user extension |
//! | [`handlers`] | One module per resource |
//! | [`views`] | Rendering helpers and view models |

pub mod auth;
pub mod error;
pub mod form_data;
pub mod handlers;
pub mod router;
pub mod session;
pub mod state;
pub mod views;

pub use router::app;
pub use state::AppState;
