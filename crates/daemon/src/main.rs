// SPDX-License-Identifier: MIT

//! `spindled` — the Spindle task-orchestration daemon binary: owns the
//! durable Task Store and Item Repository, runs the Worker loop and the
//! Reaper sweep, and serves `spindle-wire::Request`s over a Unix (and
//! optionally TCP) socket.

mod context;
mod env;
mod listener;

use context::ListenCtx;
use listener::Listener;
use spindle_bus::{InMemoryBus, MessageBus, ProgressBus};
use spindle_core::ids::stage;
use spindle_core::{Clock, Config, SystemClock};
use spindle_engine::{Controller, Reaper, Worker};
use spindle_handlers::test_support::NoopHandler;
use spindle_handlers::{HandlerRegistry, StageHandlerDecl};
use spindle_storage::{ItemRepository, TaskStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
}

/// Every pipeline stage, wired to [`NoopHandler`] for now: concrete
/// business logic per stage (fetch/cache/media/...) is an external
/// collaborator this repo doesn't ship (spec.md §1).
fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for stage_id in stage::FULL_ORDER {
        registry.register(StageHandlerDecl { stage_id: spindle_core::StageId::new(*stage_id), handler: Arc::new(NoopHandler::new(*stage_id)) });
    }
    registry
}

fn socket_path(state_dir: &Path) -> std::path::PathBuf {
    state_dir.join("spindled.sock")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let state_dir = env::state_dir().map_err(|e| anyhow::anyhow!("failed to resolve SPINDLE_STATE_DIR: {e}"))?;
    std::fs::create_dir_all(&state_dir)?;

    let config_path = state_dir.join("config.toml");
    let config = if config_path.exists() { Config::load(&config_path)? } else { Config::default() };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tasks = Arc::new(TaskStore::open(state_dir.join("tasks"), Arc::clone(&clock))?);
    let items = Arc::new(ItemRepository::open(state_dir.join("items"))?);
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new(Arc::clone(&clock)));
    let progress = Arc::new(ProgressBus::new(config.bus.event_ring_size as usize));

    let controller = Arc::new(Controller::new(Arc::clone(&tasks), Arc::clone(&bus), Arc::clone(&progress), config.bus.queue_name.clone()));

    let stuck_threshold = config.stuck_threshold()?;
    let reaper = Arc::new(Reaper::new(Arc::clone(&tasks), Arc::clone(&bus), Arc::clone(&progress), Arc::clone(&clock), stuck_threshold));

    tracing::info!("running startup recovery");
    let reset = reaper.comprehensive_reset().await?;
    if !reset.is_empty() {
        tracing::warn!(count = reset.len(), "revoked stale tasks left over from a previous process");
    }

    let registry = Arc::new(default_registry());
    let handler_timeout = config.handler_timeout()?;
    // A task may run through every pipeline stage before the bus lease is
    // ack'd, each bounded by `handler_timeout`; size the lease generously
    // above the worst case so the Reaper never reaps a lease still in use.
    let lease_ms = (handler_timeout * (stage::FULL_ORDER.len() as u32 + 2)).as_millis() as u64;
    let worker = Arc::new(Worker::new(
        "spindled-worker-0",
        config.bus.queue_name.clone(),
        lease_ms,
        Arc::clone(&tasks),
        items,
        Arc::clone(&bus),
        Arc::clone(&progress),
        registry,
        handler_timeout,
        config.task.max_concurrent_items_default,
    ));
    let worker_handle = tokio::spawn({
        let worker = Arc::clone(&worker);
        async move {
            loop {
                match worker.run_once().await {
                    Ok(true) => continue,
                    Ok(false) => tokio::time::sleep(Duration::from_millis(200)).await,
                    Err(e) => {
                        tracing::error!(error = %e, "worker loop error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    });

    let sweep_period = env::reaper_sweep_ms().unwrap_or(stuck_threshold / 2);
    let reaper_handle = Arc::clone(&reaper).spawn(sweep_period);

    let sock_path = socket_path(&state_dir);
    let _ = std::fs::remove_file(&sock_path);
    let unix = UnixListener::bind(&sock_path)?;
    tracing::info!(path = %sock_path.display(), "listening on unix socket");

    let ctx = Arc::new(ListenCtx {
        tasks,
        controller,
        progress,
        reaper,
        config,
        start_time: std::time::Instant::now(),
        auth_token: env::auth_token(),
        shutdown: Arc::new(Notify::new()),
    });
    let shutdown = Arc::clone(&ctx.shutdown);

    let listener = match env::tcp_port() {
        Some(port) => {
            let tcp = TcpListener::bind(("0.0.0.0", port)).await?;
            tracing::info!(port, "listening on tcp");
            Listener::with_tcp(unix, tcp, ctx)
        }
        None => Listener::new(unix, ctx),
    };
    let listener_handle = tokio::spawn(listener.run());

    tokio::select! {
        _ = shutdown.notified() => tracing::info!("shutdown requested"),
        _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c"),
    }

    // Stop accepting new connections immediately; give in-flight ones a
    // grace period to finish before tearing down the rest.
    listener_handle.abort();
    tokio::time::sleep(env::drain_timeout()).await;
    worker_handle.abort();
    reaper_handle.abort();

    let _ = std::fs::remove_file(&sock_path);
    Ok(())
}
