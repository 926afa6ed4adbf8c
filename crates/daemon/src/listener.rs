// SPDX-License-Identifier: MIT

//! Listener: accepts Unix (and optionally TCP) connections and dispatches
//! each one's single [`Request`] to a [`Response`], grounded on the
//! teacher's `Listener::run_dual`/`handle_connection` accept-loop shape.

use crate::context::ListenCtx;
use crate::env::{ipc_timeout, PROTOCOL_VERSION};
use spindle_core::{Preferences, Task, TaskId, TaskKind};
use spindle_wire::{read_request, write_response, LogPage, ProtocolError, Request, Response, TaskSummary};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionSource {
    /// Local Unix socket — trusted, no auth required.
    Unix,
    /// Remote TCP — requires the auth token in the `Hello` handshake.
    Tcp,
}

pub struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: Some(tcp), ctx }
    }

    pub async fn run(mut self) {
        match self.tcp.take() {
            Some(tcp) => self.run_dual(tcp).await,
            None => self.run_unix_only().await,
        }
    }

    async fn run_unix_only(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, ConnectionSource::Unix, ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("unix accept error: {e}"),
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener) {
        loop {
            tokio::select! {
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = handle_connection(reader, writer, ConnectionSource::Unix, ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("unix accept error: {e}"),
                },
                result = tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!("tcp connection from {addr}");
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = handle_connection(reader, writer, ConnectionSource::Tcp, ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("tcp accept error: {e}"),
                },
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("client disconnected"),
        ConnectionError::Timeout => warn!("connection timed out"),
        other => error!("connection error: {other}"),
    }
}

async fn handle_connection<R, W>(mut reader: R, mut writer: W, source: ConnectionSource, ctx: Arc<ListenCtx>) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = tokio::time::timeout(ipc_timeout(), read_request(&mut reader)).await.map_err(|_| ConnectionError::Timeout)??;

    if source == ConnectionSource::Tcp {
        if let Request::Hello { ref token, .. } = request {
            if let Some(ref expected) = ctx.auth_token {
                let authorized = matches!(token, Some(provided) if provided == expected);
                if !authorized {
                    let response = Response::Error { message: "unauthorized".to_string() };
                    let _ = write_response(&mut writer, &response).await;
                    return Ok(());
                }
            }
        } else {
            let response = Response::Error { message: "TCP connections must start with Hello".to_string() };
            let _ = write_response(&mut writer, &response).await;
            return Ok(());
        }
    }

    info!(?request, "received request");

    if let Request::Subscribe { task_id } = request {
        return stream_subscription(writer, &ctx, task_id).await;
    }

    let response = handle_request(request, &ctx).await;
    write_response(&mut writer, &response).await?;
    Ok(())
}

/// Upgrades the connection into a one-way stream of [`Response::Event`]
/// frames until the task reaches a terminal state or the client
/// disconnects (spec.md §6.2).
async fn stream_subscription<W>(mut writer: W, ctx: &ListenCtx, task_id: TaskId) -> Result<(), ConnectionError>
where
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let (replayed, mut receiver) = ctx.progress.subscribe(task_id.as_str(), 16);
    for event in replayed {
        write_response(&mut writer, &Response::Event { event }).await?;
    }
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let terminal = matches!(event, spindle_bus::ProgressEvent::TaskCompleted { .. });
                write_response(&mut writer, &Response::Event { event }).await?;
                if terminal {
                    return Ok(());
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(task_id = %task_id, skipped, "subscriber lagged behind the progress ring");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { .. } => Response::Hello { version: PROTOCOL_VERSION.to_string() },
        Request::Shutdown { cancel_active } => handle_shutdown(ctx, cancel_active).await,
        Request::Status => Response::Status { uptime_secs: ctx.uptime_secs(), task_active: ctx.tasks.get_active().is_some() },
        Request::StartTask { kind, preferences } => handle_start_task(ctx, kind, preferences).await,
        Request::CancelTask { task_id } => handle_cancel_task(ctx, task_id).await,
        Request::GetActiveTask => Response::Task { task: ctx.tasks.get_active().map(Box::new) },
        Request::GetTask { task_id } => handle_get_task(ctx, task_id),
        Request::GetTaskLogs { task_id, since_sequence, limit } => handle_get_task_logs(ctx, task_id, since_sequence, limit),
        Request::GetTaskEvents { task_id, kinds, limit } => handle_get_task_events(ctx, task_id, kinds, limit),
        Request::Subscribe { .. } => Response::Error { message: "Subscribe must be the first and only request on a connection".to_string() },
        Request::ListTasks { status, kind, limit, offset } => handle_list_tasks(ctx, status, kind, limit, offset),
        Request::AdminReset => handle_admin_reset(ctx).await,
        Request::AdminArchive { older_than } => handle_admin_archive(ctx, older_than),
    }
}

async fn handle_shutdown(ctx: &ListenCtx, cancel_active: bool) -> Response {
    if cancel_active {
        if let Some(task) = ctx.tasks.get_active() {
            if let Err(e) = ctx.tasks.revoke_task(&task.id, "shutdown with cancel_active".to_string()) {
                error!(task_id = %task.id, error = %e, "failed to revoke active task on shutdown");
            }
        }
    }
    ctx.shutdown.notify_one();
    Response::ShuttingDown
}

async fn handle_start_task(ctx: &ListenCtx, kind: TaskKind, preferences: Preferences) -> Response {
    match ctx.controller.start_task(kind, preferences).await {
        Ok(task_id) => Response::TaskStarted { task_id },
        Err(spindle_engine::EngineError::Storage(spindle_storage::StorageError::TaskAlreadyActive(active_task_id))) => Response::TaskAlreadyActive { active_task_id },
        Err(spindle_engine::EngineError::InvalidPreferences(e)) => Response::ContradictoryDirectives { message: e.to_string() },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

async fn handle_cancel_task(ctx: &ListenCtx, task_id: TaskId) -> Response {
    match ctx.controller.stop_task(&task_id).await {
        Ok(()) => Response::TaskCancelAccepted { accepted: true },
        Err(spindle_engine::EngineError::TaskNotFound(id)) => Response::NotFound { task_id: id },
        Err(spindle_engine::EngineError::TaskTerminal(id)) => Response::TaskTerminal { task_id: id },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

fn handle_get_task(ctx: &ListenCtx, task_id: TaskId) -> Response {
    match ctx.tasks.get(&task_id) {
        Some(task) => Response::Task { task: Some(Box::new(task)) },
        None => Response::NotFound { task_id },
    }
}

fn handle_get_task_logs(ctx: &ListenCtx, task_id: TaskId, since_sequence: u64, limit: usize) -> Response {
    if ctx.tasks.get(&task_id).is_none() {
        return Response::NotFound { task_id };
    }
    let limit = if limit == 0 { usize::MAX } else { limit };
    let entries = ctx.tasks.logs_since(&task_id, since_sequence, limit);
    let next_cursor = if entries.len() == limit { entries.last().map(|e| e.sequence) } else { None };
    Response::TaskLogs(LogPage { entries, next_cursor })
}

fn handle_get_task_events(ctx: &ListenCtx, task_id: TaskId, kinds: Option<Vec<String>>, limit: usize) -> Response {
    if ctx.tasks.get(&task_id).is_none() {
        return Response::NotFound { task_id };
    }
    let replay_n = if limit == 0 { 256 } else { limit };
    let (replayed, _receiver) = ctx.progress.subscribe(task_id.as_str(), replay_n);
    let events = match &kinds {
        Some(kinds) => replayed.into_iter().filter(|e| kinds.iter().any(|k| k == event_kind_tag(e))).collect(),
        None => replayed,
    };
    Response::TaskEvents { events }
}

fn event_kind_tag(event: &spindle_bus::ProgressEvent) -> &'static str {
    use spindle_bus::ProgressEvent::*;
    match event {
        TaskStatus { .. } => "TaskStatus",
        PhaseUpdate { .. } => "PhaseUpdate",
        PhaseComplete { .. } => "PhaseComplete",
        Log { .. } => "Log",
        TaskCompleted { .. } => "TaskCompleted",
        TaskError { .. } => "TaskError",
    }
}

fn handle_list_tasks(ctx: &ListenCtx, status: Option<String>, kind: Option<String>, limit: usize, offset: usize) -> Response {
    let mut tasks: Vec<Task> = ctx.tasks.list();
    tasks.sort_by_key(|t| std::cmp::Reverse(t.created_at_ms));
    if let Some(status) = &status {
        tasks.retain(|t| &t.status.to_string() == status);
    }
    if let Some(kind) = &kind {
        tasks.retain(|t| &t.kind.to_string() == kind);
    }
    let total = tasks.len();
    let limit = if limit == 0 { total } else { limit };
    let page: Vec<TaskSummary> = tasks.into_iter().skip(offset).take(limit).map(|t| TaskSummary::from(&t)).collect();
    Response::Tasks { tasks: page, total }
}

async fn handle_admin_reset(ctx: &ListenCtx) -> Response {
    match ctx.reaper.comprehensive_reset().await {
        Ok(reset_task_ids) => Response::ResetDone { reset_task_ids },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

fn handle_admin_archive(ctx: &ListenCtx, older_than: Option<String>) -> Response {
    let retention = match older_than {
        Some(ref s) => match spindle_core::config::parse_duration(s) {
            Ok(d) => d,
            Err(reason) => return Response::Error { message: format!("invalid older_than: {reason}") },
        },
        None => match ctx.config.archive_retention() {
            Ok(d) => d,
            Err(e) => return Response::Error { message: e.to_string() },
        },
    };
    match ctx.reaper.archive_old_tasks(retention) {
        Ok(archived) => Response::ArchiveDone { archived },
        Err(e) => Response::Error { message: e.to_string() },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
