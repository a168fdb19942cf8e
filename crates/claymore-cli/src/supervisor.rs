//! Top-level lifecycle for the two long-running tasks.
//!
//! The poll loop and the health server are sibling tokio tasks with no shared
//! mutable state. Either one is restarted on its own if it dies; a fatal poll
//! error (sink failure with `--exit-on-sink-error`) ends the process.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use claymore_core::{AgentConfig, AgentError, InfluxSink, PollLoop, Result, resolve_hostname};
use tokio::task::JoinHandle;

const RESTART_DELAY: Duration = Duration::from_secs(1);

type Poller = Arc<PollLoop<InfluxSink>>;

pub async fn run(config: AgentConfig) -> Result<()> {
    config.validate()?;

    // Startup failures below are fatal.
    let listener = claymore_server::bind(&config.http_host, config.http_port).await?;
    let sink = InfluxSink::new(&config.sink)?;
    let hostname = resolve_hostname();
    log::info!(
        "claymore-agent v{} on host={hostname}, writing to {}/{}",
        claymore_core::VERSION,
        config.sink.addr,
        config.sink.database
    );

    let poll: Poller = Arc::new(PollLoop::new(&config, sink, &hostname));
    let poll_task = spawn_poll(&poll);
    let health_addr = config.health_bind_addr();
    let health_task: JoinHandle<Result<()>> = tokio::spawn(async move {
        claymore_server::serve(listener)
            .await
            .map_err(|source| AgentError::Io {
                addr: health_addr,
                source,
            })
    });

    supervise(
        poll_task,
        health_task,
        || spawn_poll(&poll),
        || spawn_health(&config),
        RESTART_DELAY,
        shutdown_signal(),
    )
    .await
}

/// Watch both tasks until a fatal poll error or `shutdown` resolves.
///
/// A poll task that panics and a health task that ends for any reason are
/// respawned after `restart_delay`. A poll task returning an error aborts the
/// health task and hands the error back.
async fn supervise<P, H, F>(
    mut poll_task: JoinHandle<Result<Infallible>>,
    mut health_task: JoinHandle<Result<()>>,
    mut respawn_poll: P,
    mut respawn_health: H,
    restart_delay: Duration,
    shutdown: F,
) -> Result<()>
where
    P: FnMut() -> JoinHandle<Result<Infallible>>,
    H: FnMut() -> JoinHandle<Result<()>>,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            joined = &mut poll_task => {
                match joined {
                    Ok(Ok(never)) => match never {},
                    Ok(Err(e)) => {
                        health_task.abort();
                        return Err(e);
                    }
                    Err(e) => {
                        log::error!("poll loop task died: {e}; restarting");
                        tokio::time::sleep(restart_delay).await;
                        poll_task = respawn_poll();
                    }
                }
            }
            joined = &mut health_task => {
                match joined {
                    Ok(Ok(())) => log::warn!("health server stopped; restarting"),
                    Ok(Err(e)) => log::error!("health server failed: {e}; restarting"),
                    Err(e) => log::error!("health server task died: {e}; restarting"),
                }
                tokio::time::sleep(restart_delay).await;
                health_task = respawn_health();
            }
            () = &mut shutdown => {
                poll_task.abort();
                health_task.abort();
                return Ok(());
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("cannot listen for interrupt: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("interrupt received, shutting down");
}

fn spawn_poll(poll: &Poller) -> JoinHandle<Result<Infallible>> {
    let poll = Arc::clone(poll);
    tokio::spawn(async move { poll.run().await })
}

fn spawn_health(config: &AgentConfig) -> JoinHandle<Result<()>> {
    let host = config.http_host.clone();
    let port = config.http_port;
    tokio::spawn(async move { claymore_server::run_server(&host, port).await })
}
