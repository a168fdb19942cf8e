//! Poll loop: fetch → decode → build batch → write → sleep, forever.
//!
//! Cycles are strictly sequential. A failed fetch or malformed payload skips
//! the cycle; a failed sink write either skips the cycle or, with
//! `exit_on_sink_error`, ends the loop with that error.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::client::ApiClient;
use crate::config::{AgentConfig, Cadence};
use crate::error::Result;
use crate::host::unix_secs_now;
use crate::sink::{MetricBatch, MetricsSink, host_tags};
use crate::stats::decode;

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Points written. Zero means nothing decoded and no write was made.
    pub points: usize,
    pub timestamp: u64,
}

pub struct PollLoop<S> {
    client: ApiClient,
    sink: S,
    tags: BTreeMap<String, String>,
    interval: Duration,
    cadence: Cadence,
    exit_on_sink_error: bool,
}

impl<S: MetricsSink> PollLoop<S> {
    /// `hostname` is captured once by the caller and never re-resolved.
    pub fn new(config: &AgentConfig, sink: S, hostname: &str) -> Self {
        Self {
            client: ApiClient::new(config.claymore_addr.clone()),
            sink,
            tags: host_tags(hostname),
            interval: config.interval,
            cadence: config.cadence,
            exit_on_sink_error: config.exit_on_sink_error,
        }
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Run one fetch–decode–write cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let raw = self.client.fetch_stats().await?;
        let stats = decode(&raw)?;

        let timestamp = unix_secs_now();
        let batch = MetricBatch::new(&stats, timestamp, &self.tags)?;
        if batch.is_empty() {
            log::warn!(
                "no metrics decoded from {}, skipping write",
                self.client.addr()
            );
            return Ok(CycleReport {
                points: 0,
                timestamp,
            });
        }

        self.sink.write(&batch).await?;
        log::info!("submitted {} points to influxdb", batch.len());
        Ok(CycleReport {
            points: batch.len(),
            timestamp,
        })
    }

    /// Run one cycle and apply the error policy. `Err` only for a sink error
    /// with `exit_on_sink_error` set.
    async fn step(&self) -> Result<()> {
        match self.run_cycle().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_sink_error() => {
                if self.exit_on_sink_error {
                    return Err(e);
                }
                log::error!("metric write failed, dropping cycle: {e}");
                Ok(())
            }
            Err(e) => {
                log::warn!("skipping cycle: {e}");
                Ok(())
            }
        }
    }

    /// Poll forever. Returns only on a fatal sink error.
    pub async fn run(&self) -> Result<Infallible> {
        log::info!(
            "polling {} every {:?} ({:?})",
            self.client.addr(),
            self.interval,
            self.cadence
        );
        match self.cadence {
            Cadence::FixedDelay => loop {
                self.step().await?;
                tokio::time::sleep(self.interval).await;
            },
            Cadence::FixedRate => {
                let mut ticker = tokio::time::interval(self.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    self.step().await?;
                }
            }
        }
    }
}
