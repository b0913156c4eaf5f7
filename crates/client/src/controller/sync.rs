//! Favorites background sync.
//!
//! Pushes the locally queued favorite ids to the sync endpoint and drops the
//! pushed ids from the queue only once the endpoint accepted them. Ids queued
//! while the push is in flight stay for the next sync. Failures leave the queue
//! in place for the next sync event.

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use showroom_core::{CacheDb, Error};

use crate::fetch::{Network, Request};

/// Tag of the sync registration that triggers favorites sync.
pub const FAVORITES_SYNC_TAG: &str = "background-sync-favorites";

/// Result of one favorites sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing was queued.
    Idle,
    /// The endpoint accepted the queued ids and they were removed from the queue.
    Synced { count: usize },
    /// The push failed; the queue is kept for a later attempt.
    Deferred { reason: String },
}

#[derive(Serialize)]
struct SyncPayload<'a> {
    favorites: &'a [String],
}

/// Push queued favorites to `endpoint`.
///
/// Only storage failures are returned as errors; network and HTTP failures
/// produce [`SyncOutcome::Deferred`].
pub async fn sync_favorites(db: &CacheDb, network: &Arc<dyn Network>, endpoint: &Url) -> Result<SyncOutcome, Error> {
    let favorites = db.queued_favorites().await?;
    if favorites.is_empty() {
        tracing::debug!("no queued favorites to sync");
        return Ok(SyncOutcome::Idle);
    }

    let body = serde_json::to_vec(&SyncPayload { favorites: &favorites })
        .map_err(|e| Error::SyncFailed(format!("failed to encode favorites: {e}")))?;
    let request = Request::post_json(endpoint.clone(), body);

    let reason = match network.fetch(&request).await {
        Ok(response) if response.is_ok() => {
            let remaining = db.remove_synced_favorites(&favorites).await?;
            tracing::info!(count = favorites.len(), remaining = remaining.len(), "synced favorites");
            return Ok(SyncOutcome::Synced { count: favorites.len() });
        }
        Ok(response) => Error::SyncFailed(format!("status {}", response.status.as_u16())),
        Err(e) => Error::SyncFailed(e.to_string()),
    };

    tracing::warn!(queued = favorites.len(), "favorites sync failed: {}", reason);
    Ok(SyncOutcome::Deferred { reason: reason.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{Script, ScriptedNetwork};
    use crate::fetch::{Response, ServedFrom};
    use reqwest::{Method, StatusCode};

    const ENDPOINT: &str = "http://localhost:3000/api/favorites/sync";

    #[tokio::test]
    async fn test_sync_idle_without_queue() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let dyn_network: Arc<dyn Network> = network.clone();

        let outcome = sync_favorites(&db, &dyn_network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Idle);
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_posts_and_clears_queue() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.queue_favorite("suv-200").await.unwrap();
        db.queue_favorite("ev-300").await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        network.script(ENDPOINT, Script::ok("{}"));
        let dyn_network: Arc<dyn Network> = network.clone();

        let outcome = sync_favorites(&db, &dyn_network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Synced { count: 2 });
        assert!(db.queued_favorites().await.unwrap().is_empty());

        let calls = network.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Method::POST);
        let body: serde_json::Value = serde_json::from_slice(calls[0].2.as_ref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "favorites": ["suv-200", "ev-300"] }));
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_queue() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.queue_favorite("suv-200").await.unwrap();
        let network = ScriptedNetwork::new();
        network.script(ENDPOINT, Script::status(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        let network: Arc<dyn Network> = Arc::new(network);

        let outcome = sync_favorites(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Deferred { ref reason } if reason.contains("500")));
        assert_eq!(db.queued_favorites().await.unwrap(), vec!["suv-200".to_string()]);
    }

    #[tokio::test]
    async fn test_sync_offline_keeps_queue() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.queue_favorite("sedan-100").await.unwrap();
        let network: Arc<dyn Network> = Arc::new(ScriptedNetwork::new());

        let outcome = sync_favorites(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Deferred { .. }));
        assert_eq!(db.queued_favorites().await.unwrap().len(), 1);
    }

    /// Queues another favorite while the sync POST is in flight.
    struct QueueDuringSync {
        db: CacheDb,
    }

    #[async_trait::async_trait]
    impl Network for QueueDuringSync {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.db.queue_favorite("added-during-sync").await?;
            Ok(Response {
                url: request.url.clone(),
                status: StatusCode::OK,
                headers: reqwest::header::HeaderMap::new(),
                body: bytes::Bytes::from_static(b"{}"),
                served_from: ServedFrom::Network,
            })
        }
    }

    #[tokio::test]
    async fn test_sync_keeps_ids_queued_in_flight() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.queue_favorite("suv-200").await.unwrap();
        let network: Arc<dyn Network> = Arc::new(QueueDuringSync { db: db.clone() });

        let outcome = sync_favorites(&db, &network, &Url::parse(ENDPOINT).unwrap()).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Synced { count: 1 });
        assert_eq!(db.queued_favorites().await.unwrap(), vec!["added-during-sync".to_string()]);
    }
}
