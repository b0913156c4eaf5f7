//! Caching strategies.
//!
//! Each strategy owns its full read-then-write sequence for one request.
//! Header overrides apply to the stored copy only; the live response handed
//! back to the page keeps the headers the network sent.

use std::sync::Arc;

use reqwest::Url;
use showroom_core::{CacheDb, Error};

use crate::fetch::{Network, Request, Response};

/// Body of the synthetic 503 served for pages with no network and no cached copy.
pub const OFFLINE_PAGE_BODY: &str = "Offline fallback";

/// Body of the synthetic 503 served for API calls with no network and no cached copy.
pub const API_OFFLINE_BODY: &str = r#"{"error":"API offline"}"#;

/// Placeholder served when a network-first request cannot be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineFallback {
    Page,
    Api,
}

impl OfflineFallback {
    pub fn response(self, url: Url) -> Response {
        match self {
            OfflineFallback::Page => Response::unavailable(url, "text/plain; charset=utf-8", OFFLINE_PAGE_BODY),
            OfflineFallback::Api => Response::unavailable(url, "application/json", API_OFFLINE_BODY),
        }
    }
}

/// Freshness policy for one resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve the cached copy if present, else fetch and store.
    CacheFirst { cache_control: Option<&'static str> },
    /// Always try the network; fall back to the cached copy, then to a placeholder.
    NetworkFirst { cache_control: &'static str, fallback: OfflineFallback },
    /// Serve the cached copy immediately and refresh it in the background.
    StaleWhileRevalidate,
}

impl Strategy {
    /// Run this strategy for `request` against the cache named `cache_name`.
    pub async fn execute(
        self, db: &CacheDb, network: &Arc<dyn Network>, cache_name: &str, request: &Request,
    ) -> Result<Response, Error> {
        match self {
            Strategy::CacheFirst { cache_control } => cache_first(db, network, cache_name, request, cache_control).await,
            Strategy::NetworkFirst { cache_control, fallback } => {
                network_first(db, network, cache_name, request, cache_control, fallback).await
            }
            Strategy::StaleWhileRevalidate => stale_while_revalidate(db, network, cache_name, request).await,
        }
    }
}

async fn lookup(db: &CacheDb, cache_name: &str, request: &Request) -> Result<Option<Response>, Error> {
    match db.match_entry(cache_name, request.method.as_str(), request.url.as_str()).await? {
        Some(entry) => Ok(Some(Response::from_cached(entry)?)),
        None => Ok(None),
    }
}

async fn store_copy(
    db: &CacheDb, cache_name: &str, request: &Request, response: &Response, cache_control: Option<&str>,
) -> Result<(), Error> {
    let mut entry = response.snapshot(request);
    if let Some(value) = cache_control {
        entry.set_header("cache-control", value);
    }
    db.put_entry(cache_name, &entry).await
}

async fn cache_first(
    db: &CacheDb, network: &Arc<dyn Network>, cache_name: &str, request: &Request, cache_control: Option<&str>,
) -> Result<Response, Error> {
    if let Some(cached) = lookup(db, cache_name, request).await? {
        tracing::debug!("cache hit in {} for {}", cache_name, request.url);
        return Ok(cached);
    }

    tracing::debug!("cache miss in {} for {}", cache_name, request.url);
    let response = network.fetch(request).await?;
    if response.is_ok() {
        store_copy(db, cache_name, request, &response, cache_control).await?;
    }
    Ok(response)
}

async fn network_first(
    db: &CacheDb, network: &Arc<dyn Network>, cache_name: &str, request: &Request, cache_control: &str,
    fallback: OfflineFallback,
) -> Result<Response, Error> {
    match network.fetch(request).await {
        Ok(response) if response.is_ok() => {
            store_copy(db, cache_name, request, &response, Some(cache_control)).await?;
            return Ok(response);
        }
        Ok(response) => {
            tracing::debug!("{} answered {} for {}", cache_name, response.status.as_u16(), request.url);
        }
        Err(e) => {
            tracing::debug!("network failed for {}: {}", request.url, e);
        }
    }

    // From here on nothing may fail: a cached copy or a placeholder.
    let cached = match lookup(db, cache_name, request).await {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!("cache lookup in {} failed for {}: {}", cache_name, request.url, e);
            None
        }
    };

    Ok(cached.unwrap_or_else(|| fallback.response(request.url.clone())))
}

async fn stale_while_revalidate(
    db: &CacheDb, network: &Arc<dyn Network>, cache_name: &str, request: &Request,
) -> Result<Response, Error> {
    if let Some(cached) = lookup(db, cache_name, request).await? {
        let db = db.clone();
        let network = Arc::clone(network);
        let cache_name = cache_name.to_string();
        let request = request.clone();

        // Refresh failures are dropped: the page already has the cached copy.
        tokio::spawn(async move {
            if let Ok(response) = network.fetch(&request).await
                && response.is_ok()
            {
                let _ = store_copy(&db, &cache_name, &request, &response, None).await;
            }
        });

        return Ok(cached);
    }

    let response = network.fetch(request).await?;
    if response.is_ok() {
        store_copy(db, cache_name, request, &response, None).await?;
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{Script, ScriptedNetwork};
    use crate::fetch::{Destination, ServedFrom};
    use reqwest::StatusCode;
    use std::time::Duration;

    const CACHE: &str = "v1-test";

    fn request(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_cache_first_stores_with_override_and_returns_live() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = ScriptedNetwork::new();
        network.script(
            "https://example.com/static/js/app.js",
            Script::ok_with_header("console.log(1)", "cache-control", "no-cache"),
        );
        let network: Arc<dyn Network> = Arc::new(network);
        let req = request("https://example.com/static/js/app.js");
        let strategy = Strategy::CacheFirst { cache_control: Some("public, max-age=31536000, immutable") };

        let live = strategy.execute(&db, &network, CACHE, &req).await.unwrap();
        assert_eq!(live.served_from, ServedFrom::Network);
        assert_eq!(live.header(reqwest::header::CACHE_CONTROL), Some("no-cache"));

        let stored = db.match_entry(CACHE, "GET", req.url.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.header("cache-control"), Some("public, max-age=31536000, immutable"));

        let second = strategy.execute(&db, &network, CACHE, &req).await.unwrap();
        assert_eq!(second.served_from, ServedFrom::Cache);
        assert_eq!(second.text(), "console.log(1)");
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = ScriptedNetwork::new();
        network.script("https://example.com/missing.css", Script::status(StatusCode::NOT_FOUND, "nope"));
        let network: Arc<dyn Network> = Arc::new(network);
        let req = request("https://example.com/missing.css");

        let response = Strategy::CacheFirst { cache_control: None }
            .execute(&db, &network, CACHE, &req)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(db.match_entry(CACHE, "GET", req.url.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_propagates_network_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(ScriptedNetwork::new());
        let req = request("https://example.com/offers");

        let result = Strategy::CacheFirst { cache_control: None }.execute(&db, &network, CACHE, &req).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_network_first_prefers_cache_over_error_status() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        network.script("https://example.com/api/models", Script::ok(r#"["suv"]"#));
        let dyn_network: Arc<dyn Network> = network.clone();
        let req = request("https://example.com/api/models");
        let strategy = Strategy::NetworkFirst { cache_control: "max-age=300", fallback: OfflineFallback::Api };

        strategy.execute(&db, &dyn_network, CACHE, &req).await.unwrap();

        network.script("https://example.com/api/models", Script::status(StatusCode::BAD_GATEWAY, "upstream"));
        let response = strategy.execute(&db, &dyn_network, CACHE, &req).await.unwrap();
        assert_eq!(response.served_from, ServedFrom::Cache);
        assert_eq!(response.text(), r#"["suv"]"#);
    }

    #[tokio::test]
    async fn test_network_first_error_status_without_cache_is_placeholder() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = ScriptedNetwork::new();
        network.script("https://example.com/api/dealers", Script::status(StatusCode::NOT_FOUND, "none"));
        let network: Arc<dyn Network> = Arc::new(network);
        let req = request("https://example.com/api/dealers");

        let response = Strategy::NetworkFirst { cache_control: "max-age=300", fallback: OfflineFallback::Api }
            .execute(&db, &network, CACHE, &req)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.served_from, ServedFrom::Synthetic);
        assert_eq!(response.text(), API_OFFLINE_BODY);
    }

    #[tokio::test]
    async fn test_network_first_api_offline_placeholder() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(ScriptedNetwork::new());
        let req = request("https://example.com/api/inventory");

        let response = Strategy::NetworkFirst { cache_control: "max-age=300", fallback: OfflineFallback::Api }
            .execute(&db, &network, CACHE, &req)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), API_OFFLINE_BODY);
        assert_eq!(response.served_from, ServedFrom::Synthetic);
    }

    #[tokio::test]
    async fn test_swr_returns_cached_without_waiting_for_refresh() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let url = "https://example.com/render/suv-front";
        network.script(url, Script::ok("v1-image"));
        let dyn_network: Arc<dyn Network> = network.clone();
        let req = request(url).with_destination(Destination::Image);

        Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req).await.unwrap();

        network.script(url, Script::Hang);
        let response = tokio::time::timeout(
            Duration::from_secs(2),
            Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req),
        )
        .await
        .expect("stale-while-revalidate must not wait for the refresh")
        .unwrap();

        assert_eq!(response.served_from, ServedFrom::Cache);
        assert_eq!(response.text(), "v1-image");
    }

    #[tokio::test]
    async fn test_swr_refresh_overwrites_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let url = "https://example.com/render/suv-side";
        network.script(url, Script::ok("old"));
        let dyn_network: Arc<dyn Network> = network.clone();
        let req = request(url).with_destination(Destination::Image);

        Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req).await.unwrap();
        network.script(url, Script::ok("new"));

        let stale = Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req).await.unwrap();
        assert_eq!(stale.text(), "old");

        let mut refreshed = String::new();
        for _ in 0..50 {
            let entry = db.match_entry(CACHE, "GET", url).await.unwrap().unwrap();
            refreshed = String::from_utf8(entry.body).unwrap();
            if refreshed == "new" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(refreshed, "new");
    }

    #[tokio::test]
    async fn test_swr_refresh_failure_is_silent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let url = "https://example.com/render/suv-rear";
        network.script(url, Script::ok("kept"));
        let dyn_network: Arc<dyn Network> = network.clone();
        let req = request(url).with_destination(Destination::Image);

        Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req).await.unwrap();
        network.script(url, Script::Fail);

        let response = Strategy::StaleWhileRevalidate.execute(&db, &dyn_network, CACHE, &req).await.unwrap();
        assert_eq!(response.text(), "kept");

        tokio::time::sleep(Duration::from_millis(50)).await;
        let entry = db.match_entry(CACHE, "GET", url).await.unwrap().unwrap();
        assert_eq!(entry.body, b"kept");
    }
}
