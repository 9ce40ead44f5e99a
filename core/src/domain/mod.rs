// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects and persistence contracts for the task manager.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Users, statuses, labels and tasks; task filtering;
//!   pagination; repository interfaces; deployment configuration

pub mod config;
pub mod filter;
pub mod label;
pub mod pagination;
pub mod repository;
pub mod status;
pub mod task;
pub mod user;
