// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod password;
pub mod session_store;
pub mod templates;

pub use session_store::{FlashLevel, FlashMessage, SessionId, SessionStore};
pub use templates::{PageContext, TemplateEngine};
