// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ichibot_server::api::router;
use ichibot_server::auth::{gate, RouteAccess, TokenService};
use ichibot_server::config::{
    DATA_DIR_ENV, DEFAULT_DATA_DIR, DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_UPLOAD_DIR,
    SYNC_INTERVAL_ENV, UPLOAD_DIR_ENV,
};
use ichibot_server::crypto::FieldCipher;
use ichibot_server::providers::{AdministrationClient, FxClient, HolidayClient, WooClient};
use ichibot_server::state::AppState;
use ichibot_server::storage::{Datastore, OpsDatabase, StoragePaths, Workday};
use ichibot_server::sync::StoreSyncPoller;

#[tokio::main]
async fn main() {
    init_tracing();

    // Initialize storage
    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let paths = StoragePaths::new(&data_dir);
    let mut datastore = Datastore::new(paths.clone());
    datastore
        .initialize()
        .expect("Failed to initialize datastore");
    let ops = OpsDatabase::open(&paths.ops_db_file()).expect("Failed to open operations database");
    info!(data_dir = %data_dir, "Storage initialized");

    let cipher = FieldCipher::from_env();

    // Route allow-list: defaults plus the persisted encrypted overrides
    let route_access = match gate::load_overrides(&datastore, &cipher) {
        Some(overrides) => {
            info!(routes = overrides.len(), "Loaded route-access overrides");
            RouteAccess::defaults().with_overrides(overrides)
        }
        None => RouteAccess::defaults(),
    };

    let upload_dir =
        env::var(UPLOAD_DIR_ENV).unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string());
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload directory");

    let mut state = AppState::new(datastore, ops, cipher)
        .with_tokens(TokenService::from_env())
        .with_route_access(route_access)
        .with_workday(Workday::from_env())
        .with_upload_dir(upload_dir.into())
        .with_holidays(HolidayClient::from_env())
        .with_fx(FxClient::from_env());

    // Optional outbound integrations
    if WooClient::is_configured() {
        match WooClient::from_env() {
            Ok(client) => {
                state = state.attach_store_sync(client);
                info!("Storefront sync configured");
            }
            Err(e) => warn!(error = %e, "Storefront configuration is incomplete"),
        }
    } else {
        info!("Storefront sync disabled (no credentials)");
    }

    if AdministrationClient::is_configured() {
        match AdministrationClient::from_env() {
            Ok(client) => {
                state = state.with_administration(client);
                info!("Administration backend configured");
            }
            Err(e) => warn!(error = %e, "Administration configuration is incomplete"),
        }
    }

    // Background store sync poller
    let shutdown = CancellationToken::new();
    let sync_interval: u64 = env::var(SYNC_INTERVAL_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
    if sync_interval > 0 {
        if let Some(sync) = state.store_sync.clone() {
            let poller = StoreSyncPoller::new(sync, Duration::from_secs(sync_interval));
            tokio::spawn(poller.run(shutdown.clone()));
        }
    }

    let app = router(state);

    // Parse bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    info!("Ichibot server listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("HTTP server failed");
}

/// Select the log format and filter from the environment.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolve on SIGINT/SIGTERM and cancel the background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
