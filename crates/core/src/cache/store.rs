//! Local key-value store and the favorites sync queue.
//!
//! Values are JSON strings keyed by name, the way page code keeps small
//! client state in browser local storage.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Storage key of the queued favorite vehicle ids awaiting background sync.
pub const FAVORITES_QUEUE_KEY: &str = "favorites-sync-queue";

impl CacheDb {
    /// Read a stored value.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value_json FROM local_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                );

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a stored value.
    pub async fn set_item(&self, key: &str, value_json: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value_json = value_json.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO local_store (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![key, value_json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a stored value.
    ///
    /// Returns true if the key existed.
    pub async fn remove_item(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM local_store WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Favorite ids waiting to be synced, in the order they were queued.
    pub async fn queued_favorites(&self) -> Result<Vec<String>, Error> {
        match self.get_item(FAVORITES_QUEUE_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append a favorite id to the sync queue unless it is already queued.
    ///
    /// Returns the queue after the change.
    pub async fn queue_favorite(&self, id: &str) -> Result<Vec<String>, Error> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("favorite id cannot be empty".into()));
        }

        let id = id.to_string();
        self.update_favorites(move |queue| {
            if queue.contains(&id) {
                return false;
            }
            queue.push(id);
            true
        })
        .await
    }

    /// Drop a favorite id from the sync queue.
    ///
    /// Returns the queue after the change.
    pub async fn dequeue_favorite(&self, id: &str) -> Result<Vec<String>, Error> {
        let id = id.to_string();
        self.update_favorites(move |queue| {
            let before = queue.len();
            queue.retain(|queued| *queued != id);
            queue.len() != before
        })
        .await
    }

    /// Drop the ids a sync pushed, keeping anything queued since.
    ///
    /// Returns the queue after the change.
    pub async fn remove_synced_favorites(&self, synced: &[String]) -> Result<Vec<String>, Error> {
        let synced = synced.to_vec();
        self.update_favorites(move |queue| {
            let before = queue.len();
            queue.retain(|queued| !synced.contains(queued));
            queue.len() != before
        })
        .await
    }

    /// Read, modify and write the favorites queue in one transaction.
    ///
    /// `modify` returns whether it changed the queue; unchanged queues are not written.
    async fn update_favorites<F>(&self, modify: F) -> Result<Vec<String>, Error>
    where
        F: FnOnce(&mut Vec<String>) -> bool + Send + 'static,
    {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                let stored = tx.query_row(
                    "SELECT value_json FROM local_store WHERE key = ?1",
                    params![FAVORITES_QUEUE_KEY],
                    |row| row.get::<_, String>(0),
                );
                let mut queue: Vec<String> = match stored {
                    Ok(json) => serde_json::from_str(&json)?,
                    Err(rusqlite::Error::QueryReturnedNoRows) => Vec::new(),
                    Err(e) => return Err(e.into()),
                };

                if modify(&mut queue) {
                    tx.execute(
                        "INSERT INTO local_store (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                        ON CONFLICT(key) DO UPDATE SET
                            value_json = excluded.value_json,
                            updated_at = excluded.updated_at",
                        params![FAVORITES_QUEUE_KEY, serde_json::to_string(&queue)?, updated_at],
                    )?;
                }
                tx.commit()?;
                Ok(queue)
            })
            .await
            .map_err(Error::from)
    }
}
