//! Decoded metric kinds and their sink field names.
//!
//! Every value the decoder emits is a [`DecodedMetric`]; its [`Metric`] kind
//! renders as the field key written to the sink (e.g. `gpu_2_fan_speed`).

/// Kind of metric, optionally keyed by GPU index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// Miner uptime in minutes.
    Uptime,
    /// Accepted shares.
    Shares,
    /// Total hashrate, MH/s.
    Hashrate,
    /// Per-GPU hashrate, MH/s.
    GpuHashrate(usize),
    /// Per-GPU temperature, degrees Celsius.
    GpuTemperature(usize),
    /// Per-GPU temperature, degrees Fahrenheit.
    GpuTemperatureF(usize),
    /// Per-GPU fan speed, percent.
    GpuFanSpeed(usize),
}

impl Metric {
    /// GPU key for per-GPU metrics.
    pub fn gpu(&self) -> Option<usize> {
        match self {
            Self::Uptime | Self::Shares | Self::Hashrate => None,
            Self::GpuHashrate(i)
            | Self::GpuTemperature(i)
            | Self::GpuTemperatureF(i)
            | Self::GpuFanSpeed(i) => Some(*i),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uptime => write!(f, "uptime"),
            Self::Shares => write!(f, "shares"),
            Self::Hashrate => write!(f, "hashrate"),
            Self::GpuHashrate(i) => write!(f, "gpu_{i}_hashrate"),
            Self::GpuTemperature(i) => write!(f, "gpu_{i}_temperature"),
            Self::GpuTemperatureF(i) => write!(f, "gpu_{i}_temperature_f"),
            Self::GpuFanSpeed(i) => write!(f, "gpu_{i}_fan_speed"),
        }
    }
}

/// One decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedMetric {
    pub metric: Metric,
    pub value: f64,
}

impl DecodedMetric {
    pub fn new(metric: Metric, value: f64) -> Self {
        Self { metric, value }
    }

    /// Sink field name.
    pub fn name(&self) -> String {
        self.metric.to_string()
    }
}
