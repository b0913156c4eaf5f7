//! Responses returned by the cache controller and their stored snapshots.

use bytes::Bytes;
use reqwest::{StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use showroom_core::{CachedResponse, Error};

use super::Request;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedFrom {
    Network,
    Cache,
    /// Built by the controller itself (offline placeholders).
    Synthetic,
}

/// A response delivered to the page.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub body: Bytes,
    pub served_from: ServedFrom,
}

impl Response {
    /// True for 2xx statuses, like `response.ok`.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// First value of a header as a string, if it is valid UTF-8.
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A synthetic 503 used when neither network nor cache can answer.
    pub fn unavailable(url: Url, content_type: &'static str, body: &'static str) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
        Self {
            url,
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: Bytes::from_static(body.as_bytes()),
            served_from: ServedFrom::Synthetic,
        }
    }

    /// Snapshot this response for storage under the identity of `request`.
    pub fn snapshot(&self, request: &Request) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        CachedResponse {
            method: request.method.as_str().to_string(),
            url: request.url.to_string(),
            status: self.status.as_u16(),
            headers,
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a response from a stored snapshot.
    pub fn from_cached(entry: CachedResponse) -> Result<Self, Error> {
        let url = Url::parse(&entry.url).map_err(|e| Error::CorruptEntry(format!("url {}: {e}", entry.url)))?;
        let status = StatusCode::from_u16(entry.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        let mut headers = header::HeaderMap::new();
        for (name, value) in &entry.headers {
            let name = header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::CorruptEntry(e.to_string()))?;
            let value = header::HeaderValue::from_str(value).map_err(|e| Error::CorruptEntry(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Self { url, status, headers, body: Bytes::from(entry.body), served_from: ServedFrom::Cache })
    }
}
