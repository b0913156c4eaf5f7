//! Named cache operations.
//!
//! Mirrors the `caches.open` / `caches.keys` / `caches.delete` surface:
//! a cache exists once opened (even when empty) until it is deleted,
//! and deleting it drops every entry it holds.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Entry count for one named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: u64,
}

impl CacheDb {
    /// Create a named cache if it doesn't exist.
    pub async fn open_cache(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a named cache exists.
    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All cache names, sorted.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a named cache and all of its entries.
    ///
    /// Returns true if the cache existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every named cache with its entry count, sorted by name.
    pub async fn cache_summaries(&self) -> Result<Vec<CacheSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, COUNT(e.key_hash)
                FROM caches c LEFT JOIN cache_entries e ON e.cache_name = c.name
                GROUP BY c.name ORDER BY c.name ASC",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(CacheSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedResponse;

    fn make_entry(url: &str) -> CachedResponse {
        CachedResponse {
            method: "GET".to_string(),
            url: url.to_string(),
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_open_cache_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("v1-static").await.unwrap();
        db.open_cache("v1-static").await.unwrap();

        assert_eq!(db.cache_names().await.unwrap(), vec!["v1-static".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cache_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1-static", &make_entry("https://example.com/app.js"))
            .await
            .unwrap();

        assert!(db.delete_cache("v1-static").await.unwrap());
        assert!(!db.has_cache("v1-static").await.unwrap());

        db.open_cache("v1-static").await.unwrap();
        let entry = db.match_entry("v1-static", "GET", "https://example.com/app.js").await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.delete_cache("v0-static").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_summaries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("v1-api").await.unwrap();
        db.put_entry("v1-images", &make_entry("https://example.com/a.jpg")).await.unwrap();
        db.put_entry("v1-images", &make_entry("https://example.com/b.jpg")).await.unwrap();

        let summaries = db.cache_summaries().await.unwrap();
        assert_eq!(
            summaries,
            vec![
                CacheSummary { name: "v1-api".to_string(), entries: 0 },
                CacheSummary { name: "v1-images".to_string(), entries: 2 },
            ]
        );
    }
}
