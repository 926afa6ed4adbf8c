// SPDX-License-Identifier: MIT

//! `spindle task` - task lifecycle commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand, ValueEnum};
use spindle_core::{Preferences, SynthesisMode, Task, TaskId, TaskKind};
use spindle_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, handle_list, OutputFormat};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RunModeArg {
    FullPipeline,
    FetchOnly,
    SynthesisOnly,
    EmbeddingOnly,
    GitOnly,
    Custom,
}

impl From<RunModeArg> for TaskKind {
    fn from(m: RunModeArg) -> Self {
        match m {
            RunModeArg::FullPipeline => Self::FullPipeline,
            RunModeArg::FetchOnly => Self::FetchOnly,
            RunModeArg::SynthesisOnly => Self::SynthesisOnly,
            RunModeArg::EmbeddingOnly => Self::EmbeddingOnly,
            RunModeArg::GitOnly => Self::GitOnly,
            RunModeArg::Custom => Self::Custom,
        }
    }
}

impl From<RunModeArg> for spindle_core::RunMode {
    fn from(m: RunModeArg) -> Self {
        match m {
            RunModeArg::FullPipeline => Self::FullPipeline,
            RunModeArg::FetchOnly => Self::FetchOnly,
            RunModeArg::SynthesisOnly => Self::SynthesisOnly,
            RunModeArg::EmbeddingOnly => Self::EmbeddingOnly,
            RunModeArg::GitOnly => Self::GitOnly,
            RunModeArg::Custom => Self::Custom,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SynthesisModeArg {
    Comprehensive,
    Technical,
    Practical,
}

impl From<SynthesisModeArg> for SynthesisMode {
    fn from(m: SynthesisModeArg) -> Self {
        match m {
            SynthesisModeArg::Comprehensive => Self::Comprehensive,
            SynthesisModeArg::Technical => Self::Technical,
            SynthesisModeArg::Practical => Self::Practical,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Start a new pipeline run (rejected while another task is active)
    Start {
        /// Which stages to run (default: full_pipeline)
        #[arg(long = "mode", value_enum)]
        run_mode: Option<RunModeArg>,

        /// Stage IDs to run when `--mode custom` is given
        #[arg(long = "stage")]
        custom_stages: Vec<String>,

        /// Stage IDs to skip entirely
        #[arg(long)]
        skip: Vec<String>,

        /// Stage IDs to force-run even if otherwise skippable
        #[arg(long)]
        force: Vec<String>,

        /// Force every stage to re-run
        #[arg(long, conflicts_with = "skip")]
        force_all: bool,

        /// Synthesis style for the synthesize stage
        #[arg(long, value_enum)]
        synthesis_mode: Option<SynthesisModeArg>,

        /// Fail the whole stage on the first item error
        #[arg(long)]
        fail_fast: bool,
    },
    /// Request cancellation of the active task (or a specific task by ID)
    Stop {
        /// Task ID; defaults to the currently active task
        task_id: Option<String>,
    },
    /// Show task details
    Status {
        /// Task ID; defaults to the currently active task
        task_id: Option<String>,
    },
    /// View durable log entries for a task
    Logs {
        task_id: String,
        /// Only entries with a sequence number greater than this
        #[arg(long, default_value_t = 0)]
        since: u64,
        /// Maximum entries to return (0 = no limit)
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: usize,
    },
    /// Show recent progress events for a task
    Events {
        task_id: String,
        /// Restrict to these event kind tags (e.g. PhaseUpdate, Log)
        #[arg(long = "kind")]
        kinds: Vec<String>,
        /// Maximum events to return (0 = no limit)
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: usize,
    },
    /// List past and present tasks
    History {
        /// Filter by status (e.g. "running", "success", "failed")
        #[arg(long)]
        status: Option<String>,
        /// Filter by task kind
        #[arg(long)]
        kind: Option<String>,
        /// Maximum tasks to show (default: 20)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

pub async fn handle(command: TaskCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        TaskCommand::Start { run_mode, custom_stages, skip, force, force_all, synthesis_mode, fail_fast } => {
            start(client, run_mode, custom_stages, skip, force, force_all, synthesis_mode, fail_fast, format).await
        }
        TaskCommand::Stop { task_id } => stop(client, task_id, format).await,
        TaskCommand::Status { task_id } => status(client, task_id, format).await,
        TaskCommand::Logs { task_id, since, limit } => logs(client, task_id, since, limit, format).await,
        TaskCommand::Events { task_id, kinds, limit } => events(client, task_id, kinds, limit, format).await,
        TaskCommand::History { status, kind, limit, offset } => history(client, status, kind, limit, offset, format).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn start(
    client: &mut DaemonClient,
    run_mode: Option<RunModeArg>,
    custom_stages: Vec<String>,
    skip: Vec<String>,
    force: Vec<String>,
    force_all: bool,
    synthesis_mode: Option<SynthesisModeArg>,
    fail_fast: bool,
    format: OutputFormat,
) -> Result<()> {
    let kind: TaskKind = run_mode.map(Into::into).unwrap_or(TaskKind::FullPipeline);
    let preferences = Preferences {
        run_mode: run_mode.map(Into::into),
        custom_stages: custom_stages.into_iter().collect(),
        skip: skip.into_iter().collect(),
        force: force.into_iter().collect(),
        force_all,
        synthesis_mode: synthesis_mode.map(Into::into),
        fail_fast,
    };

    match client.send(&Request::StartTask { kind, preferences }).await? {
        Response::TaskStarted { task_id } => {
            format_or_json(format, &task_id, || println!("Started task {}", color::header(task_id.as_str())))
        }
        Response::TaskAlreadyActive { active_task_id } => {
            Err(anyhow!("a task is already active: {}", active_task_id))
        }
        Response::ContradictoryDirectives { message } => Err(anyhow!("invalid preferences: {message}")),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn resolve_task_id(client: &mut DaemonClient, task_id: Option<String>) -> Result<TaskId> {
    if let Some(id) = task_id {
        return Ok(TaskId::from_string(id));
    }
    match client.send(&Request::GetActiveTask).await? {
        Response::Task { task: Some(task) } => Ok(task.id),
        Response::Task { task: None } => Err(anyhow!("no active task")),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn stop(client: &mut DaemonClient, task_id: Option<String>, format: OutputFormat) -> Result<()> {
    let task_id = resolve_task_id(client, task_id).await?;
    match client.send(&Request::CancelTask { task_id: task_id.clone() }).await? {
        Response::TaskCancelAccepted { accepted } => {
            format_or_json(format, &accepted, || {
                if accepted {
                    println!("Cancellation requested for task {}", task_id.as_str());
                } else {
                    println!("Task {} could not be cancelled", task_id.as_str());
                }
            })
        }
        Response::NotFound { task_id } => Err(anyhow!("task not found: {task_id}")),
        Response::TaskTerminal { task_id } => Err(anyhow!("task {task_id} has already finished")),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

fn print_task(task: &Task) {
    println!("{} {}", color::header("Task:"), task.id.as_str());
    println!("  {} {}", color::context("Kind:"), task.kind);
    println!("  {} {}", color::context("Status:"), color::status(&task.status.to_string()));
    println!("  {} {}%", color::context("Progress:"), task.progress_percent);
    if let Some(phase) = &task.current_phase_id {
        println!("  {} {}", color::context("Phase:"), phase);
    }
    if let Some(summary) = &task.result_summary {
        println!("  {} {}", color::context("Result:"), summary);
    }
    if let Some(kind) = task.error_kind {
        println!("  {} {} ({})", color::context("Error:"), task.error_message.as_deref().unwrap_or(""), kind);
    }
}

async fn status(client: &mut DaemonClient, task_id: Option<String>, format: OutputFormat) -> Result<()> {
    let request = match task_id {
        Some(id) => Request::GetTask { task_id: TaskId::from_string(id) },
        None => Request::GetActiveTask,
    };
    match client.send(&request).await? {
        Response::Task { task: Some(task) } => format_or_json(format, &task, || print_task(&task)),
        Response::Task { task: None } => {
            format_or_json(format, &serde_json::json!({ "task": null }), || println!("No active task"))
        }
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn logs(client: &mut DaemonClient, task_id: String, since: u64, limit: usize, format: OutputFormat) -> Result<()> {
    let task_id = TaskId::from_string(task_id);
    let request = Request::GetTaskLogs { task_id, since_sequence: since, limit };
    match client.send(&request).await? {
        Response::TaskLogs(page) => handle_list(format, &page.entries, "No log entries", |entries| {
            for entry in entries {
                println!("[{}] {} {}", entry.sequence, entry.level, entry.message);
            }
            if let Some(cursor) = page.next_cursor {
                println!("\n... more available, resume with --since {cursor}");
            }
        }),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn events(client: &mut DaemonClient, task_id: String, kinds: Vec<String>, limit: usize, format: OutputFormat) -> Result<()> {
    let task_id = TaskId::from_string(task_id);
    let kinds = if kinds.is_empty() { None } else { Some(kinds) };
    let request = Request::GetTaskEvents { task_id, kinds, limit };
    match client.send(&request).await? {
        Response::TaskEvents { events } => handle_list(format, &events, "No events", |events| {
            for event in events {
                println!("{event:?}");
            }
        }),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn history(client: &mut DaemonClient, status: Option<String>, kind: Option<String>, limit: usize, offset: usize, format: OutputFormat) -> Result<()> {
    let request = Request::ListTasks { status, kind, limit, offset };
    match client.send(&request).await? {
        Response::Tasks { tasks, total } => handle_list(format, &tasks, "No tasks", |tasks| {
            for t in tasks {
                println!(
                    "{:<24} {:<14} {:<9} {:>3}%  {}",
                    t.id.as_str(),
                    t.kind.to_string(),
                    color::status(&t.status.to_string()),
                    t.progress_percent,
                    crate::output::format_time_ago(t.updated_at_ms),
                );
            }
            if tasks.len() < total {
                println!("\n... {} of {} shown. Use --offset to page further.", tasks.len(), total);
            }
        }),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}
