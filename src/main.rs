// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use custody_core::{
    api::router,
    audit::{AuditRecorder, JsonlAuditSink, RedactionPolicy},
    auth::OperatorAuth,
    config::AppConfig,
    custody::{CipherError, EnvelopeCipher, KeyError, MasterKeyManager},
    logging::init_tracing,
    state::AppState,
};

#[derive(Debug, Error)]
enum StartupError {
    #[error("encryption key error: {0}")]
    Cipher(#[from] CipherError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() {
    // Tracing is configured from the loaded config, so config errors go to stderr.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("custody-core: configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Startup failed");
        eprintln!("custody-core: {e}");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    info!(config = ?config, "Configuration loaded");

    let cipher = EnvelopeCipher::new(Some(config.wallet_encryption_key.as_str()))?;
    let keys = MasterKeyManager::new(config.master_seed_phrase.clone());
    // Startup continues either way; derivation requests fail until fixed.
    match keys.master_context() {
        Ok(_) => {}
        Err(KeyError::ConfigMissing) => warn!("MASTER_SEED_PHRASE is not set"),
        Err(e) => error!(error = %e, "MASTER_SEED_PHRASE is unusable"),
    }

    let shutdown = CancellationToken::new();
    let (recorder, worker) = AuditRecorder::new(
        JsonlAuditSink::new(&config.audit_log_dir),
        config.audit_channel_capacity,
        RedactionPolicy::default(),
        shutdown.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let state = AppState::new(
        keys,
        cipher,
        recorder,
        OperatorAuth::new(config.operator_jwt_secret.as_bytes()),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.bind_addr,
            source,
        })?;
    info!(addr = %config.bind_addr, audit_dir = %config.audit_log_dir.display(), "Custody server listening");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(StartupError::Serve);

    // Flush queued audit entries before exiting.
    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        error!(error = %e, "Audit worker terminated abnormally");
    }
    info!("Custody server stopped");

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
