// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use thiserror::Error;

use crate::application::error::ServiceError;

/// Marker read by the session layer, which renders the HTML error page
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub title: String,
    pub message: String,
}

/// Failures a handler cannot turn into a redirect or a form redisplay
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => WebError::NotFound(what),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::Internal(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for WebError {
    fn from(err: serde_json::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let page = match self {
            WebError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                ErrorPage {
                    status: StatusCode::NOT_FOUND,
                    title: "Page not found".to_string(),
                    message: "The page you requested does not exist.".to_string(),
                }
            }
            WebError::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                ErrorPage {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    title: "Server error".to_string(),
                    message: "Something went wrong. Please try again later.".to_string(),
                }
            }
        };
        let fallback = page.title.clone();
        (page.status, Extension(page), fallback).into_response()
    }
}
