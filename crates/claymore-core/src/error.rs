//! Error types for the agent.
//!
//! Fetch-side variants are recoverable per cycle; sink variants are subject to
//! the configured sink-error policy; `Bind` only occurs at startup.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    // Upstream (miner API) errors
    #[error("failed to connect to miner at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error talking to miner at {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("miner at {addr} closed the connection without a response")]
    EmptyResponse { addr: String },

    #[error("miner at {addr} sent a response line longer than {limit} bytes")]
    ResponseTooLarge { addr: String, limit: u64 },

    #[error("invalid JSON from miner: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed stats payload: expected {expected} result fields, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },

    // Sink errors
    #[error("failed to build metric batch: {reason}")]
    SinkConstruction { reason: String },

    #[error("sink request failed: {0}")]
    SinkRequest(#[source] reqwest::Error),

    #[error("sink rejected write (HTTP {status}): {message}")]
    SinkWrite { status: u16, message: String },

    // Startup errors
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    /// Whether the error came from building or writing a metric batch.
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Self::SinkConstruction { .. } | Self::SinkRequest(_) | Self::SinkWrite { .. }
        )
    }
}
