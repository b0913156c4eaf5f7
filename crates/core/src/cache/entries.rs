//! Cache entry operations.
//!
//! A cache entry is a full response snapshot (status, headers, body) stored
//! under a named cache and keyed by request method plus normalized URL.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    /// Header pairs in response order. Names keep their original case.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of a header with a single new one.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Request identity this entry is stored under.
    pub fn key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

impl CacheDb {
    /// Insert or overwrite an entry in a named cache.
    ///
    /// The cache is created if it does not exist yet, matching `caches.open(name)`
    /// followed by `cache.put(request, response)`.
    pub async fn put_entry(&self, cache_name: &str, entry: &CachedResponse) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let entry = entry.clone();
        let key = entry.key();
        let headers_json = serde_json::to_string(&entry.headers)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![&cache_name, &created_at],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                    cache_name, key_hash, method, url, status_code, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status_code = excluded.status_code,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &cache_name,
                        &key,
                        &entry.method.to_ascii_uppercase(),
                        &entry.url,
                        entry.status as i64,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for a request in one named cache.
    ///
    /// Returns None if the cache or the entry doesn't exist.
    pub async fn match_entry(&self, cache_name: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let cache_name = cache_name.to_string();
        let key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status_code, headers_json, body, stored_at
                FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                });

                match result {
                    Ok((method, url, status, headers_json, body, stored_at)) => {
                        let headers = serde_json::from_str(&headers_json)?;
                        let status =
                            u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
                        Ok(Some(CachedResponse { method, url, status, headers, body, stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for a request from one named cache.
    ///
    /// Returns true if an entry was removed.
    pub async fn delete_entry(&self, cache_name: &str, method: &str, url: &str) -> Result<bool, Error> {
        let cache_name = cache_name.to_string();
        let key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache_name, key],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in a named cache, oldest first.
    pub async fn entry_urls(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY stored_at ASC, url ASC")?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
