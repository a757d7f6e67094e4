// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coffee_shop_server::{
    api::router,
    auth::Authenticator,
    config::{AppConfig, LogFormat, TlsConfig},
    state::AppState,
    storage::{seed_sample_drink, DrinkStore, MemoryDrinkStore, RedbDrinkStore},
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may be set directly.
    let dotenv = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default());
            tracing::error!(error = %e, "Configuration error");
            process::exit(1);
        }
    };
    init_tracing(config.log_format);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::warn!("A rustls crypto provider was already installed");
    }

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open drink store");
            process::exit(1);
        }
    };

    let authenticator = match Authenticator::new(config.auth.clone()) {
        Ok(authenticator) => Arc::new(authenticator),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build authenticator");
            process::exit(1);
        }
    };
    tracing::info!(
        issuer = %config.auth.issuer,
        audience = %config.auth.audience,
        jwks_url = %config.auth.jwks_url,
        "Verifying bearer tokens against issuer"
    );

    let app = router(AppState::new(store, authenticator));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let served = match &config.tls {
        Some(tls) => serve_tls(app, config.bind_addr, tls, shutdown).await,
        None => serve_plain(app, config.bind_addr, shutdown).await,
    };
    if let Err(e) = served {
        tracing::error!(error = %e, "Server error");
        process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = installed {
        eprintln!("Failed to initialise logging: {e}");
    }
}

fn open_store(
    config: &AppConfig,
) -> Result<Arc<dyn DrinkStore>, coffee_shop_server::storage::StorageError> {
    let store: Arc<dyn DrinkStore> = match config.database_path() {
        Some(path) => Arc::new(RedbDrinkStore::open(&path)?),
        None => {
            tracing::warn!("DATA_DIR not set; drinks are kept in memory only");
            Arc::new(MemoryDrinkStore::new())
        }
    };

    if config.seed_sample_drink {
        seed_sample_drink(store.as_ref())?;
    }
    Ok(store)
}

async fn serve_plain(
    app: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Coffee shop server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    tls: &TlsConfig,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    tracing::info!(%addr, "Coffee shop server listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
