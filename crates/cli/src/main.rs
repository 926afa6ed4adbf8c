// SPDX-License-Identifier: MIT

//! `spindle` — operator CLI for talking to `spindled` over its Unix socket.

mod client;
mod color;
mod commands;
mod env;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::admin::{self, AdminArgs};
use commands::task::{self, TaskArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "spindle", version, about = "Operator CLI for the Spindle task-orchestration daemon")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Task lifecycle: start, stop, status, logs, events, history
    Task(TaskArgs),
    /// Operator maintenance: reset, archive
    Admin(AdminArgs),
    /// Daemon liveness and uptime
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut client = match DaemonClient::connect().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Task(args) => task::handle(args.command, &mut client, cli.output).await,
        Command::Admin(args) => admin::handle(args.command, &mut client, cli.output).await,
        Command::Status => status(&mut client, cli.output).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn status(client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    use output::format_or_json;
    use spindle_wire::{Request, Response};

    match client.send(&Request::Status).await? {
        Response::Status { uptime_secs, task_active } => format_or_json(format, &(uptime_secs, task_active), || {
            println!("Uptime: {}", output::format_elapsed(uptime_secs));
            println!("Task active: {task_active}");
        }),
        other => Err(anyhow::anyhow!("unexpected response: {other:?}")),
    }
}
