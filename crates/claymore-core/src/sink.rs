//! Metric batches and the sink seam.
//!
//! A cycle's decoded mapping becomes one [`MetricBatch`]: every entry is a
//! point under [`MEASUREMENT`], all points share one tag set and one
//! timestamp, and the whole batch goes out in a single write.

use std::collections::BTreeMap;
use std::future::Future;

use crate::error::{AgentError, Result};

/// Measurement every point is written under.
pub const MEASUREMENT: &str = "claymore_stats";

/// Tag key carrying the agent's hostname.
pub const HOST_TAG: &str = "host";

/// One field value within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub field: String,
    pub value: f64,
}

/// All points for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBatch {
    pub measurement: &'static str,
    pub tags: BTreeMap<String, String>,
    /// Unix seconds, captured once per cycle.
    pub timestamp: u64,
    pub points: Vec<Point>,
}

impl MetricBatch {
    /// Wrap a decoded mapping into a batch. Non-finite values are rejected.
    pub fn new(
        stats: &BTreeMap<String, f64>,
        timestamp: u64,
        tags: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut points = Vec::with_capacity(stats.len());
        for (field, &value) in stats {
            if !value.is_finite() {
                return Err(AgentError::SinkConstruction {
                    reason: format!("field {field} has non-finite value {value}"),
                });
            }
            points.push(Point {
                field: field.clone(),
                value,
            });
        }
        Ok(Self {
            measurement: MEASUREMENT,
            tags: tags.clone(),
            timestamp,
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Render as InfluxDB line protocol, one line per point, second precision.
    pub fn to_line_protocol(&self) -> String {
        let mut series = escape_measurement(self.measurement);
        for (key, value) in &self.tags {
            series.push(',');
            series.push_str(&escape_key(key));
            series.push('=');
            series.push_str(&escape_key(value));
        }

        self.points
            .iter()
            .map(|p| {
                format!(
                    "{series} {}={} {}",
                    escape_key(&p.field),
                    p.value,
                    self.timestamp
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Build the tag set shared by every point.
pub fn host_tags(hostname: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(HOST_TAG.to_string(), hostname.to_string())])
}

/// Destination for metric batches. One call per cycle.
pub trait MetricsSink: Send + Sync {
    fn write(&self, batch: &MetricBatch) -> impl Future<Output = Result<()>> + Send;
}

fn escape_measurement(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a tag key, tag value or field key.
fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_batch_shares_timestamp_and_tags() {
        let batch = MetricBatch::new(
            &stats(&[("uptime", 5.0), ("hashrate", 30.5), ("gpu_0_fan_speed", 40.0)]),
            1_700_000_000,
            &host_tags("rig01"),
        )
        .unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.measurement, "claymore_stats");
        assert_eq!(batch.timestamp, 1_700_000_000);
        assert_eq!(batch.tags.get("host").map(String::as_str), Some("rig01"));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let err =
            MetricBatch::new(&stats(&[("uptime", f64::NAN)]), 0, &host_tags("rig01")).unwrap_err();
        assert!(matches!(err, AgentError::SinkConstruction { .. }));
    }

    #[test]
    fn test_empty_mapping_gives_empty_batch() {
        let batch = MetricBatch::new(&BTreeMap::new(), 0, &host_tags("rig01")).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.to_line_protocol(), "");
    }

    #[test]
    fn test_line_protocol_one_line_per_point() {
        let batch = MetricBatch::new(
            &stats(&[("hashrate", 12.345), ("shares", 10.0)]),
            1_700_000_000,
            &host_tags("rig01"),
        )
        .unwrap();
        assert_eq!(
            batch.to_line_protocol(),
            "claymore_stats,host=rig01 hashrate=12.345 1700000000\n\
             claymore_stats,host=rig01 shares=10 1700000000"
        );
    }

    #[test]
    fn test_line_protocol_escapes_tag_values() {
        let batch = MetricBatch::new(
            &stats(&[("uptime", 1.0)]),
            7,
            &host_tags("my rig,a=b"),
        )
        .unwrap();
        assert_eq!(
            batch.to_line_protocol(),
            "claymore_stats,host=my\\ rig\\,a\\=b uptime=1 7"
        );
    }
}
