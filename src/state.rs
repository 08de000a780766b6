// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::auth::{RouteAccess, TokenService};
use crate::crypto::FieldCipher;
use crate::providers::{AdministrationClient, FxClient, HolidayClient, WooClient};
use crate::storage::{Datastore, MirrorCache, OpsDatabase, Workday};
use crate::sync::StoreSync;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// JSON-file datastore for soft entities
    pub datastore: Arc<Datastore>,
    /// Embedded database for inventory, orders and the mirror
    pub ops: Arc<OpsDatabase>,
    /// First-page cache for mirror listings
    pub mirror_cache: Arc<MirrorCache>,
    /// Field-level cipher for sensitive columns
    pub cipher: Arc<FieldCipher>,
    /// Session token service
    pub tokens: Arc<TokenService>,
    /// Route allow-list (defaults + persisted overrides)
    pub route_access: Arc<RwLock<RouteAccess>>,
    /// Configured workday for attendance arithmetic
    pub workday: Workday,
    /// Directory uploads are written to and served from
    pub upload_dir: PathBuf,
    /// Storefront sync engine; absent when the store is unconfigured
    pub store_sync: Option<Arc<StoreSync>>,
    /// Administration backend client; absent when unconfigured
    pub administration: Option<Arc<AdministrationClient>>,
    /// Public-holiday calendar client
    pub holidays: Arc<HolidayClient>,
    /// FX-rate client
    pub fx: Arc<FxClient>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create state over initialized storage with default ambient pieces.
    pub fn new(datastore: Datastore, ops: OpsDatabase, cipher: FieldCipher) -> Self {
        let upload_dir = datastore.paths().root().join("uploads");
        Self {
            datastore: Arc::new(datastore),
            ops: Arc::new(ops),
            mirror_cache: Arc::new(MirrorCache::default()),
            cipher: Arc::new(cipher),
            tokens: Arc::new(TokenService::new("ichibot-dev-session-secret")),
            route_access: Arc::new(RwLock::new(RouteAccess::defaults())),
            workday: Workday::default(),
            upload_dir,
            store_sync: None,
            administration: None,
            holidays: Arc::new(HolidayClient::new("http://localhost:0".to_string())),
            fx: Arc::new(FxClient::new("http://localhost:0".to_string())),
            started_at: Instant::now(),
        }
    }

    /// Replace the token service.
    pub fn with_tokens(mut self, tokens: TokenService) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    /// Replace the route allow-list.
    pub fn with_route_access(mut self, route_access: RouteAccess) -> Self {
        self.route_access = Arc::new(RwLock::new(route_access));
        self
    }

    /// Set the workday configuration.
    pub fn with_workday(mut self, workday: Workday) -> Self {
        self.workday = workday;
        self
    }

    /// Set the upload directory.
    pub fn with_upload_dir(mut self, upload_dir: PathBuf) -> Self {
        self.upload_dir = upload_dir;
        self
    }

    /// Attach the storefront sync engine.
    pub fn with_store_sync(mut self, sync: Arc<StoreSync>) -> Self {
        self.store_sync = Some(sync);
        self
    }

    /// Attach the administration backend client.
    pub fn with_administration(mut self, client: AdministrationClient) -> Self {
        self.administration = Some(Arc::new(client));
        self
    }

    /// Replace the holiday calendar client.
    pub fn with_holidays(mut self, client: HolidayClient) -> Self {
        self.holidays = Arc::new(client);
        self
    }

    /// Replace the FX-rate client.
    pub fn with_fx(mut self, client: FxClient) -> Self {
        self.fx = Arc::new(client);
        self
    }

    /// Whether the storefront is configured for syncing.
    pub fn store_configured(&self) -> bool {
        self.store_sync.is_some()
    }

    /// Attach a sync engine built from this state's database and cache.
    pub fn attach_store_sync(self, client: WooClient) -> Self {
        let sync = StoreSync::new(self.ops.clone(), self.mirror_cache.clone(), client);
        let mut state = self;
        state.store_sync = Some(Arc::new(sync));
        state
    }
}

#[cfg(test)]
pub mod test_support {
    //! Shared state fixtures for handler and extractor tests.

    use tempfile::TempDir;

    use super::*;
    use crate::storage::StoragePaths;

    /// Build a fully-initialized state over a temp directory.
    pub fn test_state() -> (AppState, TempDir) {
        let tmp = TempDir::new().expect("temp dir");
        let paths = StoragePaths::new(tmp.path());
        let mut datastore = Datastore::new(paths.clone());
        datastore.initialize().expect("datastore init");
        let ops = OpsDatabase::open(&paths.ops_db_file()).expect("ops db open");
        let cipher = FieldCipher::new("test-field-secret");

        let upload_dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("upload dir");

        let state = AppState::new(datastore, ops, cipher)
            .with_tokens(TokenService::new("test-session-secret"))
            .with_upload_dir(upload_dir);
        (state, tmp)
    }
}
