// Error types for the JSON document store
// Carries enough context to be logged without the call site

use std::io;

use thiserror::Error;

/// Main error type for store, protocol and server operations
#[derive(Debug, Error)]
pub enum JsonDbError {
    /// I/O operation failed
    #[error("I/O error during {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// JSON text could not be encoded or decoded
    #[error("JSON error during {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Database file holds text that is not a JSON object
    #[error("Corrupt document: {reason}")]
    CorruptDocument { reason: String },

    /// Key element is not a string or an array of strings
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    /// Request envelope is missing fields or has the wrong shape
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Frame payload does not fit the 2-byte length prefix
    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    /// Blocking worker panicked or was cancelled
    #[error("Worker failed during {operation}: {reason}")]
    Worker { operation: String, reason: String },
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, JsonDbError>;

/// Helper trait for adding context to io::Errors
pub trait IoContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| JsonDbError::Io {
            context: context.into(),
            source: e,
        })
    }
}

/// Same as [`IoContext`] for serde_json results
pub trait JsonContext<T> {
    fn json_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> JsonContext<T> for serde_json::Result<T> {
    fn json_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| JsonDbError::Json {
            context: context.into(),
            source: e,
        })
    }
}

impl JsonDbError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        JsonDbError::InvalidKey { reason: reason.into() }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        JsonDbError::InvalidRequest { reason: reason.into() }
    }

    /// True for errors caused by the caller's input rather than the server
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            JsonDbError::InvalidKey { .. } | JsonDbError::InvalidRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = JsonDbError::invalid_key("path must contain at least one segment");
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid key"));
        assert!(msg.contains("at least one segment"));
    }

    #[test]
    fn test_io_context() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let result: io::Result<()> = Err(io_err);

        let err = result.io_context("writing db.json").unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("writing db.json"));
        assert!(msg.contains("access denied"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_context() {
        let result: serde_json::Result<serde_json::Value> = serde_json::from_str("{not json");
        let err = result.json_context("decoding request").unwrap_err();
        assert!(format!("{}", err).contains("decoding request"));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_frame_too_large_display() {
        let err = JsonDbError::FrameTooLarge { len: 70000, max: 65535 };
        assert_eq!(format!("{}", err), "Frame of 70000 bytes exceeds the 65535 byte limit");
    }
}
