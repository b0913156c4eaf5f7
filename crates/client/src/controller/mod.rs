//! Offline cache controller.
//!
//! Intercepts GET requests, sorts them into resource classes and serves each
//! class through its own named cache and freshness strategy:
//!
//! | Class      | Cache     | Strategy                                  |
//! |------------|-----------|-------------------------------------------|
//! | navigation | `dynamic` | network-first, offline page fallback      |
//! | static     | `static`  | cache-first, stored as immutable          |
//! | API        | `api`     | network-first, short-lived stored copy    |
//! | image      | `images`  | stale-while-revalidate                    |
//! | other      | `dynamic` | cache-first                               |
//!
//! ### Lifecycle
//! `install` pre-caches the critical assets and asks to skip waiting;
//! `activate` deletes every cache not tagged with the current version and
//! claims open pages. Requests are only intercepted once activated.

pub mod classify;
pub mod strategy;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use showroom_core::{AppConfig, CacheDb, CacheSummary, Error};
use tokio::sync::RwLock;

pub use classify::{API_CACHE_CONTROL, CacheKind, Classifier, IMMUTABLE_CACHE_CONTROL, NO_STORE_CACHE_CONTROL, ResourceClass};
pub use strategy::{API_OFFLINE_BODY, OFFLINE_PAGE_BODY, OfflineFallback, Strategy};
pub use sync::{FAVORITES_SYNC_TAG, SyncOutcome};

use crate::fetch::{Network, Request, Response, resolve};

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Activated,
    /// Installation failed; this controller will never activate.
    Redundant,
}

/// Messages posted to the controller by pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl ControllerMessage {
    /// Decode a posted message. Unknown or malformed messages yield None.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// Settings the controller needs, resolved against the site origin.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub version: String,
    pub origin: Url,
    pub precache: Vec<String>,
    pub api_prefix: String,
    pub sync_endpoint: Url,
}

impl ControllerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let sync_endpoint = resolve(&origin, &config.sync_endpoint).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            version: config.cache_version.clone(),
            origin,
            precache: config.precache.clone(),
            api_prefix: config.api_prefix.clone(),
            sync_endpoint,
        })
    }
}

/// The offline cache controller.
pub struct CacheController {
    config: ControllerConfig,
    classifier: Classifier,
    db: CacheDb,
    network: Arc<dyn Network>,
    state: RwLock<Lifecycle>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl CacheController {
    pub fn new(config: ControllerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        let classifier = Classifier::new(config.api_prefix.clone());
        Self {
            config,
            classifier,
            db,
            network,
            state: RwLock::new(Lifecycle::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> Lifecycle {
        *self.state.read().await
    }

    /// Whether open pages have been claimed by this controller.
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Current-version name of one of the four caches.
    pub fn cache_name(&self, kind: CacheKind) -> String {
        kind.cache_name(&self.config.version)
    }

    async fn set_state(&self, state: Lifecycle) {
        let mut current = self.state.write().await;
        tracing::info!(from = ?*current, to = ?state, version = %self.config.version, "controller state change");
        *current = state;
    }

    /// Handle the install event: pre-cache the critical assets.
    ///
    /// All assets are fetched before any is stored, so a failed install leaves
    /// the static cache untouched. On failure the controller becomes redundant.
    pub async fn install(&self) -> Result<usize, Error> {
        self.set_state(Lifecycle::Installing).await;

        match self.precache().await {
            Ok(count) => {
                self.skip_waiting.store(true, Ordering::Release);
                self.set_state(Lifecycle::Installed).await;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("install failed: {}", e);
                self.set_state(Lifecycle::Redundant).await;
                Err(Error::InstallFailed(e.to_string()))
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let cache_name = self.cache_name(CacheKind::Static);
        let mut fetched = Vec::with_capacity(self.config.precache.len());

        for path in &self.config.precache {
            let url = resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            let request = Request::get(url);
            let response = self.network.fetch(&request).await?;
            if !response.is_ok() {
                return Err(Error::HttpError(format!("{} answered {}", request.url, response.status.as_u16())));
            }
            fetched.push((request, response));
        }

        self.db.open_cache(&cache_name).await?;
        for (request, response) in &fetched {
            self.db.put_entry(&cache_name, &response.snapshot(request)).await?;
        }

        tracing::debug!("pre-cached {} assets into {}", fetched.len(), cache_name);
        Ok(fetched.len())
    }

    /// Handle the activate event.
    ///
    /// Deletes every cache whose name does not start with `{version}-`, claims
    /// open pages, and returns the deleted cache names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let previous = self.state().await;
        if previous == Lifecycle::Redundant {
            return Err(Error::InvalidInput("cannot activate a redundant controller".into()));
        }

        self.set_state(Lifecycle::Activating).await;

        match self.delete_stale_caches().await {
            Ok(deleted) => {
                self.clients_claimed.store(true, Ordering::Release);
                self.set_state(Lifecycle::Activated).await;
                Ok(deleted)
            }
            Err(e) => {
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn delete_stale_caches(&self) -> Result<Vec<String>, Error> {
        let prefix = format!("{}-", self.config.version);
        let mut deleted = Vec::new();

        for name in self.db.cache_names().await? {
            if !name.starts_with(&prefix) && self.db.delete_cache(&name).await? {
                tracing::info!("deleted stale cache {}", name);
                deleted.push(name);
            }
        }

        Ok(deleted)
    }

    /// Install then activate, as happens for a controller that skips waiting.
    pub async fn start(&self) -> Result<Vec<String>, Error> {
        self.install().await?;
        self.activate().await
    }

    /// Whether `request` is handled by the caching strategies.
    ///
    /// Only GET requests over http(s) are intercepted, and only once active.
    pub async fn intercepts(&self, request: &Request) -> bool {
        request.method == reqwest::Method::GET && request.is_http() && self.state().await == Lifecycle::Activated
    }

    /// Handle a fetch event.
    ///
    /// Requests that are not intercepted go to the network untouched. Any
    /// error while applying a strategy falls back to a plain network fetch.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, Error> {
        if !self.intercepts(request).await {
            return self.network.fetch(request).await;
        }

        let class = self.classifier.classify(request);
        let cache_name = self.cache_name(class.cache_kind());
        tracing::debug!(class = ?class, cache = %cache_name, "routing {}", request.url);

        match class.strategy().execute(&self.db, &self.network, &cache_name, request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!("{:?} strategy failed for {}: {}; falling back to network", class, request.url, e);
                self.network.fetch(request).await
            }
        }
    }

    /// Handle a background sync event.
    ///
    /// Returns None for tags this controller does not own.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<SyncOutcome>, Error> {
        if tag != FAVORITES_SYNC_TAG {
            tracing::debug!("ignoring sync tag {}", tag);
            return Ok(None);
        }
        self.sync_favorites().await.map(Some)
    }

    /// Handle a message posted by a page.
    pub async fn handle_message(&self, message: ControllerMessage) -> Result<(), Error> {
        match message {
            ControllerMessage::SkipWaiting => {
                self.skip_waiting.store(true, Ordering::Release);
                if self.state().await == Lifecycle::Installed {
                    self.activate().await?;
                }
                Ok(())
            }
        }
    }

    /// Whether skip-waiting has been requested.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub async fn sync_favorites(&self) -> Result<SyncOutcome, Error> {
        sync::sync_favorites(&self.db, &self.network, &self.config.sync_endpoint).await
    }

    /// Queue a vehicle id for the next favorites sync. Returns the queue.
    pub async fn queue_favorite(&self, id: &str) -> Result<Vec<String>, Error> {
        self.db.queue_favorite(id).await
    }

    pub async fn dequeue_favorite(&self, id: &str) -> Result<Vec<String>, Error> {
        self.db.dequeue_favorite(id).await
    }

    pub async fn queued_favorites(&self) -> Result<Vec<String>, Error> {
        self.db.queued_favorites().await
    }

    /// Every cache with its entry count.
    pub async fn cache_summary(&self) -> Result<Vec<CacheSummary>, Error> {
        self.db.cache_summaries().await
    }
}
