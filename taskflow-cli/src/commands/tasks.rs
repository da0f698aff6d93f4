use anyhow::{Result, bail};
use clap::Subcommand;
use client::TaskApi;
use shared::models::{Task, TaskCreate, TaskUpdate};
use tracing::debug;

use super::with_login_hint;

/// Task subcommands.
#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List all tasks
    List,
    /// Show one task
    Show {
        /// Task id
        id: i64,
    },
    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Optional description
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Mark a task as completed
    Done {
        /// Task id
        id: i64,
    },
    /// Change fields of a task
    Update {
        /// Task id
        id: i64,

        /// New title
        #[arg(long, short)]
        title: Option<String>,

        /// New description
        #[arg(long, short)]
        description: Option<String>,

        /// New completion state
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: i64,
    },
}

/// Run one task subcommand against the API.
pub async fn run(api: &TaskApi, command: TaskCommand) -> Result<()> {
    debug!(?command, api_url = api.session().base_url(), "running task command");
    match command {
        TaskCommand::List => {
            let tasks = api.list().await.map_err(with_login_hint)?;
            debug!(count = tasks.len(), "tasks fetched");
            if tasks.is_empty() {
                println!("No tasks yet.");
            }
            for task in &tasks {
                println!("{}", line(task));
            }
        }
        TaskCommand::Show { id } => {
            let task = api.get(id).await.map_err(with_login_hint)?;
            println!("{}", line(&task));
            if let Some(description) = &task.description {
                println!("    {description}");
            }
            println!("    created {}", task.created_at.format("%Y-%m-%d %H:%M"));
        }
        TaskCommand::Add { title, description } => {
            let task = api
                .create(&TaskCreate::new(title, description))
                .await
                .map_err(with_login_hint)?;
            println!("Created {}", line(&task));
        }
        TaskCommand::Done { id } => {
            let task = api.complete(id).await.map_err(with_login_hint)?;
            println!("Completed {}", line(&task));
        }
        TaskCommand::Update {
            id,
            title,
            description,
            completed,
        } => {
            let update = TaskUpdate {
                title,
                description,
                completed,
            };
            if update.is_empty() {
                bail!("nothing to update; pass --title, --description or --completed");
            }
            let task = api.update(id, &update).await.map_err(with_login_hint)?;
            println!("Updated {}", line(&task));
        }
        TaskCommand::Delete { id } => {
            api.delete(id).await.map_err(with_login_hint)?;
            println!("Deleted task {id}");
        }
    }
    Ok(())
}

fn line(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!("[{mark}] {:>4}  {}", task.id, task.title)
}
