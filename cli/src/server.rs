// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP server bootstrap: storage, application state, router, shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use task_manager_core::application::create_repositories;
use task_manager_core::domain::config::AppConfig;
use task_manager_core::domain::repository::StorageBackend;
use task_manager_core::infrastructure::db::Database;
use task_manager_core::presentation::{app, AppState};

/// How often expired sessions are pruned
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Run the web server until Ctrl+C or SIGTERM
pub async fn start_server(config: AppConfig, run_migrations: bool) -> Result<()> {
    let backend = config.storage_backend();
    let repositories = match &backend {
        StorageBackend::PostgreSQL(pg) => {
            let database = Database::new(pg).await?;
            if run_migrations {
                database.run_migrations().await?;
            }
            info!("Using PostgreSQL storage");
            create_repositories(&backend, Some(database.get_pool().clone()))?
        }
        StorageBackend::InMemory => {
            warn!("No database configured; using in-memory storage, data is lost on exit");
            create_repositories(&backend, None)?
        }
    };

    let state = Arc::new(
        AppState::new(repositories, config.session.clone())
            .context("Failed to initialize application state")?,
    );
    let sweeper = state.sessions.clone().spawn_sweeper(SESSION_SWEEP_INTERVAL);
    let router = app(state);

    let addr = config.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Task manager listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    sweeper.abort();
    info!("Task manager shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
