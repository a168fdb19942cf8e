//! Claymore remote management API client.
//!
//! One request per connection: dial, write the `miner_getstat1` line, read one
//! response line, close.

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{AgentError, Result};

/// The fixed stats request, without the line terminator.
pub const STATS_REQUEST: &str = r#"{"id":0,"jsonrpc":"2.0","method":"miner_getstat1"}"#;

/// Longest response line accepted, terminator included.
pub const MAX_RESPONSE_BYTES: u64 = 64 * 1024;

/// JSON envelope returned by `miner_getstat1`.
///
/// `result` is positional; see [`crate::stats::MinerStats`] for the slot layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawStatsResponse {
    #[serde(default)]
    pub result: Vec<String>,
    #[serde(default)]
    pub id: i64,
    /// Claymore sends `null` when there is no error.
    #[serde(default)]
    pub error: Option<String>,
}

impl RawStatsResponse {
    /// Parse a single response line.
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim_end())?)
    }
}

/// Client for a single miner endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    addr: String,
}

impl ApiClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Fetch one stats snapshot over a fresh connection.
    ///
    /// The connection is dropped (closed) on every return path. No retries.
    pub async fn fetch_stats(&self) -> Result<RawStatsResponse> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| AgentError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        let mut stream = BufReader::new(stream);

        stream
            .get_mut()
            .write_all(format!("{STATS_REQUEST}\n").as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;

        let mut line = String::new();
        let n = (&mut stream)
            .take(MAX_RESPONSE_BYTES)
            .read_line(&mut line)
            .await
            .map_err(|source| self.io_error(source))?;
        if n == 0 {
            return Err(AgentError::EmptyResponse {
                addr: self.addr.clone(),
            });
        }
        if n as u64 == MAX_RESPONSE_BYTES && !line.ends_with('\n') {
            return Err(AgentError::ResponseTooLarge {
                addr: self.addr.clone(),
                limit: MAX_RESPONSE_BYTES,
            });
        }

        let response = RawStatsResponse::from_line(&line)?;
        if let Some(err) = response.error.as_deref().filter(|e| !e.is_empty()) {
            log::warn!("miner at {} reported error: {err}", self.addr);
        }
        log::debug!(
            "miner at {} returned {} result fields",
            self.addr,
            response.result.len()
        );
        Ok(response)
    }

    fn io_error(&self, source: std::io::Error) -> AgentError {
        AgentError::Io {
            addr: self.addr.clone(),
            source,
        }
    }
}
