//! Request identity keys for cache entries.

use sha2::{Digest, Sha256};

/// Compute the cache key identifying a request by method and normalized URL.
///
/// The method is upper-cased so `get` and `GET` share an entry.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
