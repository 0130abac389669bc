//! Error handling for Dubmix
//!
//! Every failure aborts the whole export job. Errors carry enough context
//! (region index, bucket/key) to diagnose a failed job without re-running it.

use thiserror::Error;

/// Result type alias for Dubmix operations
pub type Result<T> = std::result::Result<T, DubError>;

/// Main error type for Dubmix operations
#[derive(Error, Debug)]
pub enum DubError {
    // Request Errors
    #[error("Invalid region {index}: {reason}")]
    Validation { index: usize, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    // Storage Errors
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Transfer failed for {bucket}/{key}: {reason}")]
    Transfer {
        bucket: String,
        key: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Audio Errors
    #[error("Cannot decode audio{}: {reason}", location(.key))]
    Decode {
        key: Option<String>,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cannot encode audio: {reason}")]
    Encode { reason: String },

    #[error("Overlay at {position_ms}ms exceeds the {limit_secs}s timeline limit")]
    Timeline { position_ms: f64, limit_secs: f64 },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn location(key: &Option<String>) -> String {
    key.as_ref().map(|k| format!(" at {}", k)).unwrap_or_default()
}

impl DubError {
    /// Build a decode error without object context
    pub fn decode(reason: impl Into<String>) -> Self {
        DubError::Decode {
            key: None,
            reason: reason.into(),
            source: None,
        }
    }

    /// Build a transfer error for a bucket/key pair
    pub fn transfer(
        bucket: &str,
        key: &str,
        reason: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DubError::Transfer {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.into(),
            source,
        }
    }

    /// Attach the storage location to a decode error raised by a codec.
    ///
    /// Other variants pass through unchanged.
    pub fn for_object(self, bucket: &str, key: &str) -> Self {
        self.at(format!("{}/{}", bucket, key))
    }

    /// Attach a location to a decode error that has none yet
    pub fn at(self, location: impl Into<String>) -> Self {
        match self {
            DubError::Decode {
                key: None,
                reason,
                source,
            } => DubError::Decode {
                key: Some(location.into()),
                reason,
                source,
            },
            other => other,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DubError::Validation { .. } => "VALIDATION_ERROR",
            DubError::InvalidRequest(_) => "INVALID_REQUEST",
            DubError::NotFound { .. } => "NOT_FOUND",
            DubError::Transfer { .. } => "TRANSFER_ERROR",
            DubError::Decode { .. } => "DECODE_ERROR",
            DubError::Encode { .. } => "ENCODE_ERROR",
            DubError::Timeline { .. } => "TIMELINE_ERROR",
            DubError::Io(_) => "IO_ERROR",
        }
    }

    /// Status code reported to the invoking transport
    pub fn status_code(&self) -> u16 {
        match self {
            DubError::Validation { .. } | DubError::InvalidRequest(_) => 400,
            DubError::NotFound { .. } => 404,
            DubError::Decode { .. } | DubError::Timeline { .. } => 422,
            DubError::Transfer { .. } => 502,
            DubError::Encode { .. } | DubError::Io(_) => 500,
        }
    }

    /// Whether redriving the same job could succeed.
    ///
    /// The pipeline itself never retries; this is advice for the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DubError::Transfer { .. } | DubError::Io(_))
    }
}
