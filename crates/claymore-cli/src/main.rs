//! claymore-agent — ship Claymore miner GPU stats to InfluxDB.

mod supervisor;

use std::time::Duration;

use clap::Parser;
use claymore_core::{AgentConfig, Cadence, SinkConfig};

#[derive(Parser, Debug)]
#[command(name = "claymore-agent")]
#[command(about = "Poll a Claymore miner's stats API and write GPU metrics to InfluxDB")]
#[command(version = claymore_core::VERSION)]
struct Cli {
    /// Address and port of the Claymore remote management API
    #[arg(long, default_value = claymore_core::config::DEFAULT_CLAYMORE_ADDR)]
    claymore_addr: String,

    /// Bind address for the health endpoint
    #[arg(long, default_value = claymore_core::config::DEFAULT_HTTP_HOST)]
    http_host: String,

    /// Port for the health endpoint (GET /healthz)
    #[arg(long, default_value_t = claymore_core::config::DEFAULT_HTTP_PORT)]
    http_port: u16,

    /// InfluxDB database to store points in
    #[arg(long, default_value = claymore_core::config::DEFAULT_INFLUX_DATABASE)]
    influxdb_database: String,

    /// InfluxDB HTTP endpoint, e.g. http://127.0.0.1:8086
    #[arg(long, default_value = claymore_core::config::DEFAULT_INFLUX_ADDR)]
    influxdb_addr: String,

    /// InfluxDB username (empty disables authentication)
    #[arg(long, default_value = "admin")]
    influxdb_user: String,

    /// InfluxDB password
    #[arg(long, default_value = "admin")]
    influxdb_pass: String,

    /// Seconds between polls of the Claymore API
    #[arg(
        long,
        default_value_t = claymore_core::config::DEFAULT_CHECK_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    check_interval: u64,

    /// Schedule polls from cycle start instead of sleeping after each cycle
    #[arg(long)]
    fixed_rate: bool,

    /// Exit the process when a write to InfluxDB fails
    #[arg(long)]
    exit_on_sink_error: bool,
}

impl Cli {
    fn into_config(self) -> AgentConfig {
        AgentConfig {
            claymore_addr: self.claymore_addr,
            http_host: self.http_host,
            http_port: self.http_port,
            sink: SinkConfig {
                addr: self.influxdb_addr,
                database: self.influxdb_database,
                username: self.influxdb_user,
                password: self.influxdb_pass,
            },
            interval: Duration::from_secs(self.check_interval),
            cadence: if self.fixed_rate {
                Cadence::FixedRate
            } else {
                Cadence::FixedDelay
            },
            exit_on_sink_error: self.exit_on_sink_error,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(supervisor::run(config)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("claymore-agent").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_match_core_config() {
        let config = parse(&[]).unwrap().into_config();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_flag_overrides() {
        let config = parse(&[
            "--claymore-addr",
            "10.0.0.5:3333",
            "--http-port",
            "9100",
            "--influxdb-addr",
            "http://influx:8086",
            "--influxdb-database",
            "rigs",
            "--influxdb-user",
            "",
            "--check-interval",
            "5",
            "--fixed-rate",
            "--exit-on-sink-error",
        ])
        .unwrap()
        .into_config();

        assert_eq!(config.claymore_addr, "10.0.0.5:3333");
        assert_eq!(config.http_port, 9100);
        assert_eq!(config.sink.addr, "http://influx:8086");
        assert_eq!(config.sink.database, "rigs");
        assert_eq!(config.sink.username, "");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.cadence, Cadence::FixedRate);
        assert!(config.exit_on_sink_error);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(parse(&["--check-interval", "0"]).is_err());
    }

    #[test]
    fn test_bad_port_rejected() {
        assert!(parse(&["--http-port", "70000"]).is_err());
    }
}
