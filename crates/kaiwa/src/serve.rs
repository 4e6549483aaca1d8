// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kaiwa serve` command implementation.
//!
//! Wires the history store, state stores, cooldown and the Gemini provider
//! into a [`SessionService`], starts the periodic state flush task, and
//! parks until a shutdown signal arrives. A front end (chat platform
//! adapter) drives the service; this process owns its lifecycle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use kaiwa_config::KaiwaConfig;
use kaiwa_core::{GenerationProvider, KaiwaError};
use kaiwa_gemini::GeminiClient;
use kaiwa_history::HistoryStore;
use kaiwa_session::SessionService;
use kaiwa_state::{StateStores, spawn_flush_task};

use crate::shutdown;

/// Runs the `kaiwa serve` command.
pub async fn run_serve(config: KaiwaConfig) -> Result<(), KaiwaError> {
    init_tracing(&config.agent.log_level);

    info!("starting kaiwa serve");

    // Required directories. Failure here is fatal: running without durable
    // storage would silently lose every conversation.
    let history_dir = Path::new(&config.storage.history_dir);
    let state_dir = Path::new(&config.storage.state_dir);
    for dir in [history_dir, state_dir] {
        std::fs::create_dir_all(dir).map_err(|e| {
            error!(dir = %dir.display(), error = %e, "cannot create storage directory");
            KaiwaError::storage(e)
        })?;
    }

    let state = Arc::new(StateStores::load(state_dir).await?);

    let provider: Arc<dyn GenerationProvider> = match GeminiClient::new(&config.gemini) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            // State was already loaded; leave it consistent on disk.
            let _ = state.flush_all().await;
            return Err(e);
        }
    };

    let _service = SessionService::new(
        HistoryStore::new(history_dir),
        Arc::clone(&state),
        provider,
        Duration::from_secs_f64(config.agent.cooldown_secs),
        config.gemini.model.clone(),
    );

    let token = shutdown::install_signal_handler();
    let flush_handle = spawn_flush_task(
        Arc::clone(&state),
        Duration::from_secs(config.agent.flush_interval_secs),
        token.clone(),
    );

    info!(
        history_dir = %history_dir.display(),
        state_dir = %state_dir.display(),
        model = %config.gemini.model,
        "kaiwa ready"
    );

    token.cancelled().await;

    // The flush task performs the final flush on cancellation.
    if let Err(e) = flush_handle.await {
        error!(error = %e, "flush task panicked");
    }

    info!("kaiwa shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kaiwa={log_level},warn")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
