// SPDX-License-Identifier: MIT

//! `spindle admin` - operator maintenance commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use spindle_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Revoke every non-terminal task, reap stale leases, and clear progress rings
    Reset,
    /// Archive terminal tasks older than a duration (default: configured retention)
    Archive {
        /// Duration string (e.g. "30d", "12h"); defaults to the configured retention
        #[arg(long)]
        older_than: Option<String>,
    },
}

pub async fn handle(command: AdminCommand, client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        AdminCommand::Reset => reset(client, format).await,
        AdminCommand::Archive { older_than } => archive(client, older_than, format).await,
    }
}

async fn reset(client: &mut DaemonClient, format: OutputFormat) -> Result<()> {
    match client.send(&Request::AdminReset).await? {
        Response::ResetDone { reset_task_ids } => format_or_json(format, &reset_task_ids, || {
            if reset_task_ids.is_empty() {
                println!("Nothing to reset");
            } else {
                for id in &reset_task_ids {
                    println!("Revoked {}", id.as_str());
                }
            }
        }),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}

async fn archive(client: &mut DaemonClient, older_than: Option<String>, format: OutputFormat) -> Result<()> {
    match client.send(&Request::AdminArchive { older_than }).await? {
        Response::ArchiveDone { archived } => {
            format_or_json(format, &archived, || println!("Archived {archived} task(s)"))
        }
        Response::Error { message } => Err(anyhow!("{message}")),
        other => Err(anyhow!("unexpected response: {other:?}")),
    }
}
