// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Page handlers, one module per resource. Statuses and labels share
//! the generic `catalog` module.
//!
//! Every mutating handler ends in a 303 redirect with a flash message on
//! success, or re-renders its form with status 200 when validation fails.

pub mod auth;
pub mod catalog;
pub mod home;
pub mod tasks;
pub mod users;
