//! InfluxDB 1.x HTTP write sink.
//!
//! `POST {addr}/write?db=<database>&precision=s` with a line-protocol body.
//! Idle connections are never pooled, so each cycle's connection is released
//! once its write completes.

use reqwest::Client;
use serde::Deserialize;

use crate::config::SinkConfig;
use crate::error::{AgentError, Result};
use crate::sink::{MetricBatch, MetricsSink};

/// Error body InfluxDB returns on a rejected write.
#[derive(Deserialize)]
struct InfluxErrorBody {
    error: String,
}

pub struct InfluxSink {
    client: Client,
    write_url: String,
    database: String,
    username: String,
    password: String,
}

impl InfluxSink {
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| AgentError::SinkConstruction {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            write_url: format!("{}/write", config.addr.trim_end_matches('/')),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

impl MetricsSink for InfluxSink {
    async fn write(&self, batch: &MetricBatch) -> Result<()> {
        let mut request = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "s")])
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(batch.to_line_protocol());
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await.map_err(AgentError::SinkRequest)?;
        let status = response.status();
        if status.is_success() {
            log::debug!("influxdb accepted {} points (HTTP {status})", batch.len());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<InfluxErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(AgentError::SinkWrite {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::host_tags;
    use axum::{
        Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Captured {
        query: HashMap<String, String>,
        auth: Option<String>,
        body: String,
    }

    #[derive(Clone, Default)]
    struct FakeInflux {
        writes: Arc<Mutex<Vec<Captured>>>,
        reject: bool,
    }

    async fn handle_write(
        State(state): State<FakeInflux>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.writes.lock().unwrap().push(Captured { query, auth, body });
        if state.reject {
            (
                StatusCode::BAD_REQUEST,
                r#"{"error":"database not found: \"nope\""}"#.to_string(),
            )
        } else {
            (StatusCode::NO_CONTENT, String::new())
        }
    }

    async fn spawn_fake_influx(state: FakeInflux) -> String {
        let app = Router::new()
            .route("/write", post(handle_write))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn batch() -> MetricBatch {
        let stats = BTreeMap::from([
            ("hashrate".to_string(), 30.0),
            ("uptime".to_string(), 12.0),
        ]);
        MetricBatch::new(&stats, 1_700_000_000, &host_tags("rig01")).unwrap()
    }

    #[test]
    fn test_write_url_trims_trailing_slash() {
        let sink = InfluxSink::new(&SinkConfig {
            addr: "http://influx:8086/".to_string(),
            ..SinkConfig::default()
        })
        .unwrap();
        assert_eq!(sink.write_url(), "http://influx:8086/write");
    }

    #[tokio::test]
    async fn test_single_write_per_batch() {
        let state = FakeInflux::default();
        let addr = spawn_fake_influx(state.clone()).await;
        let sink = InfluxSink::new(&SinkConfig {
            addr,
            ..SinkConfig::default()
        })
        .unwrap();

        sink.write(&batch()).await.unwrap();

        let writes = state.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let w = &writes[0];
        assert_eq!(w.query.get("db").map(String::as_str), Some("homelab_custom"));
        assert_eq!(w.query.get("precision").map(String::as_str), Some("s"));
        // admin:admin
        assert_eq!(w.auth.as_deref(), Some("Basic YWRtaW46YWRtaW4="));
        assert_eq!(w.body.lines().count(), 2);
        assert!(
            w.body
                .lines()
                .all(|l| l.starts_with("claymore_stats,host=rig01 ") && l.ends_with(" 1700000000"))
        );
    }

    #[tokio::test]
    async fn test_no_auth_without_username() {
        let state = FakeInflux::default();
        let addr = spawn_fake_influx(state.clone()).await;
        let sink = InfluxSink::new(&SinkConfig {
            addr,
            username: String::new(),
            password: String::new(),
            ..SinkConfig::default()
        })
        .unwrap();

        sink.write(&batch()).await.unwrap();
        assert_eq!(state.writes.lock().unwrap()[0].auth, None);
    }

    #[tokio::test]
    async fn test_rejected_write_surfaces_influx_message() {
        let state = FakeInflux {
            reject: true,
            ..FakeInflux::default()
        };
        let addr = spawn_fake_influx(state).await;
        let sink = InfluxSink::new(&SinkConfig {
            addr,
            database: "nope".to_string(),
            ..SinkConfig::default()
        })
        .unwrap();

        match sink.write(&batch()).await {
            Err(AgentError::SinkWrite { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "database not found: \"nope\"");
            }
            other => panic!("expected SinkWrite, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_sink_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = InfluxSink::new(&SinkConfig {
            addr: format!("http://{addr}"),
            ..SinkConfig::default()
        })
        .unwrap();
        let err = sink.write(&batch()).await.unwrap_err();
        assert!(matches!(err, AgentError::SinkRequest(_)));
        assert!(err.is_sink_error());
    }
}
