//! # claymore-core
//!
//! Polls a Claymore miner's remote management API (`miner_getstat1`), decodes
//! its positional payload into named per-GPU metrics and writes them to
//! InfluxDB as one batch per cycle.
//!
//! ## Quick Start
//!
//! ```no_run
//! use claymore_core::{AgentConfig, InfluxSink, PollLoop, resolve_hostname};
//!
//! # async fn run() -> claymore_core::Result<()> {
//! let config = AgentConfig::default();
//! let sink = InfluxSink::new(&config.sink)?;
//! let poll = PollLoop::new(&config, sink, &resolve_hostname());
//!
//! let report = poll.run_cycle().await?;
//! println!("wrote {} points", report.points);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ApiClient → StatsDecoder → MetricBatch → MetricsSink
//!
//! [`ApiClient`] fetches one [`RawStatsResponse`] per connection.
//! [`decode`] validates it as [`MinerStats`] and maps it to field names.
//! [`MetricBatch`] tags every field with the host and a shared timestamp, and
//! a [`MetricsSink`] (normally [`InfluxSink`]) writes it in one request.
//! [`PollLoop`] repeats this on the configured interval.

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod influx;
pub mod metric;
pub mod poll;
pub mod sink;
pub mod stats;

pub use client::{ApiClient, RawStatsResponse, STATS_REQUEST};
pub use config::{AgentConfig, Cadence, SinkConfig};
pub use error::{AgentError, Result};
pub use host::{resolve_hostname, unix_secs_now};
pub use influx::InfluxSink;
pub use metric::{DecodedMetric, Metric};
pub use poll::{CycleReport, PollLoop};
pub use sink::{HOST_TAG, MEASUREMENT, MetricBatch, MetricsSink, Point, host_tags};
pub use stats::{MinerStats, RESULT_FIELDS, decode, decode_metrics};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
