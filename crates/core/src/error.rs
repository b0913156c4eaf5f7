//! Unified error types for showroom.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the cache controller and its storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL, unknown method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The request never produced a response (connection refused, DNS, timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Pre-caching the critical asset list failed.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Favorites could not be pushed to the sync endpoint.
    #[error("SYNC_FAILED: {0}")]
    SyncFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32006, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::InstallFailed(msg) => (-32013, msg.clone()),
            Error::SyncFailed(msg) => (-32014, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("ftp://dealer.example/index.html".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("/index.html"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::Network("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32006);
    }

    #[test]
    fn test_corrupt_entry_from_json() {
        let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("CACHE_ERROR: corrupt entry"));
    }

    #[test]
    fn test_storage_errors_share_code() {
        let corrupt: McpError = Error::CorruptEntry("bad headers".into()).into();
        let migration: McpError = Error::MigrationFailed("002".into()).into();
        assert_eq!(corrupt.code.0, -32002);
        assert_eq!(migration.code.0, -32002);
    }
}
