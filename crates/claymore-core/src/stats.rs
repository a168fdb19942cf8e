//! Positional `miner_getstat1` payload decoding.
//!
//! The `result` array is indexed like so:
//!
//! | slot | content |
//! |---|---|
//! | 0 | miner version |
//! | 1 | uptime, minutes |
//! | 2 | `hashrate;shares;rejected_shares` (hashrate in kH/s) |
//! | 3 | per-GPU hashrate `hr0;hr1;...` (kH/s) |
//! | 4 | DCR `hashrate;shares;rejected_shares` |
//! | 5 | DCR per-GPU hashrate |
//! | 6 | `temp0;fan0;temp1;fan1;...` |
//! | 7 | pool address |
//! | 8 | ETH invalid shares; ETH pool switches; DCR invalid; DCR switches |
//!
//! Decoding is best-effort per token: a token that does not parse yields no
//! metric, it never fails the whole decode. Only a payload with fewer than
//! [`RESULT_FIELDS`] slots is rejected.

use std::collections::BTreeMap;

use crate::client::RawStatsResponse;
use crate::error::{AgentError, Result};
use crate::metric::{DecodedMetric, Metric};

/// Number of positional slots in a `miner_getstat1` result.
pub const RESULT_FIELDS: usize = 9;

/// Vendor hashrate sub-unit per canonical unit (kH/s → MH/s).
const HASHRATE_DIVISOR: f64 = 1000.0;

/// Named view over the nine positional slots, validated once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinerStats<'a> {
    pub version: &'a str,
    pub uptime: &'a str,
    pub eth_totals: &'a str,
    pub eth_gpu_hashrates: &'a str,
    pub dcr_totals: &'a str,
    pub dcr_gpu_hashrates: &'a str,
    pub temps_and_fans: &'a str,
    pub pools: &'a str,
    pub invalid_and_switches: &'a str,
}

impl<'a> MinerStats<'a> {
    pub fn from_response(raw: &'a RawStatsResponse) -> Result<Self> {
        let slots: Vec<&'a str> = raw.result.iter().map(String::as_str).collect();
        match slots[..] {
            [
                version,
                uptime,
                eth_totals,
                eth_gpu_hashrates,
                dcr_totals,
                dcr_gpu_hashrates,
                temps_and_fans,
                pools,
                invalid_and_switches,
                ..,
            ] => Ok(Self {
                version,
                uptime,
                eth_totals,
                eth_gpu_hashrates,
                dcr_totals,
                dcr_gpu_hashrates,
                temps_and_fans,
                pools,
                invalid_and_switches,
            }),
            _ => Err(AgentError::MalformedPayload {
                expected: RESULT_FIELDS,
                actual: slots.len(),
            }),
        }
    }

    /// Decode into metrics in emission order.
    pub fn metrics(&self) -> Vec<DecodedMetric> {
        let mut out = Vec::new();

        if let Some(minutes) = parse_token(self.uptime) {
            out.push(DecodedMetric::new(Metric::Uptime, minutes));
        }

        // hashrate;shares;rejected_shares. Rejected shares are not exported.
        let totals: Vec<&str> = self.eth_totals.split(';').collect();
        if let Some(shares) = totals.get(1).and_then(|t| parse_token(t)) {
            out.push(DecodedMetric::new(Metric::Shares, shares));
        }
        if let Some(hashrate) = totals.first().and_then(|t| parse_token(t)) {
            out.push(DecodedMetric::new(
                Metric::Hashrate,
                hashrate / HASHRATE_DIVISOR,
            ));
        }

        for (i, token) in self.eth_gpu_hashrates.split(';').enumerate() {
            if let Some(hashrate) = parse_token(token) {
                out.push(DecodedMetric::new(
                    Metric::GpuHashrate(i),
                    hashrate / HASHRATE_DIVISOR,
                ));
            }
        }

        // Even positions are temperatures keyed by their own position; odd
        // positions are fan speeds keyed by the preceding even position.
        for (i, token) in self.temps_and_fans.split(';').enumerate() {
            let Some(value) = parse_token(token) else {
                continue;
            };
            if i % 2 == 0 {
                out.push(DecodedMetric::new(Metric::GpuTemperature(i), value));
                out.push(DecodedMetric::new(
                    Metric::GpuTemperatureF(i),
                    celsius_to_fahrenheit(value),
                ));
            } else {
                out.push(DecodedMetric::new(Metric::GpuFanSpeed(i - 1), value));
            }
        }

        out
    }
}

/// Decode a raw response into metrics in emission order.
pub fn decode_metrics(raw: &RawStatsResponse) -> Result<Vec<DecodedMetric>> {
    Ok(MinerStats::from_response(raw)?.metrics())
}

/// Decode a raw response into a field name → value mapping.
pub fn decode(raw: &RawStatsResponse) -> Result<BTreeMap<String, f64>> {
    Ok(decode_metrics(raw)?
        .into_iter()
        .map(|m| (m.name(), m.value))
        .collect())
}

/// Parse a token with 32-bit precision. Non-numeric and non-finite tokens
/// yield `None`.
pub fn parse_token(token: &str) -> Option<f64> {
    token
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(f64::from)
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}
