//! Task management commands for CLI.

use clap::{Args, Subcommand};
use vitempo_core::{Task, TechniqueId};

use super::{CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the end of the list
    Add {
        /// Task title
        title: String,
        /// Estimated work cycles
        #[arg(long, short = 'e', default_value = "1")]
        estimate: u32,
        #[command(flatten)]
        scope: Scope,
    },
    /// List tasks in order
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        scope: Scope,
    },
    /// Change a task's title or estimate
    Edit {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short = 'e')]
        estimate: Option<u32>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Mark a task done, or not started again
    Toggle {
        /// Task ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Move a task to another task's position or to an index
    Move {
        /// Task ID
        id: String,
        /// Take the position of this task
        #[arg(long, conflicts_with = "to", required_unless_present = "to")]
        before: Option<String>,
        /// Zero-based target index
        #[arg(long)]
        to: Option<usize>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Make a task the current one
    Current {
        /// Task ID
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
}

/// Which technique's list to use when lists are kept per technique.
#[derive(Args)]
pub struct Scope {
    #[arg(long)]
    technique: Option<TechniqueId>,
}

fn print_task(task: &Task) -> CliResult {
    println!("{}", serde_json::to_string_pretty(task)?);
    Ok(())
}

pub fn run(action: TaskAction) -> CliResult {
    let ctx = Context::load()?;
    let scope = match &action {
        TaskAction::Add { scope, .. }
        | TaskAction::List { scope, .. }
        | TaskAction::Edit { scope, .. }
        | TaskAction::Delete { scope, .. }
        | TaskAction::Toggle { scope, .. }
        | TaskAction::Move { scope, .. }
        | TaskAction::Current { scope, .. } => scope.technique,
    };
    let technique = scope.unwrap_or(ctx.config.active_technique);
    let mut tasks = ctx.tasks(technique);

    match action {
        TaskAction::Add { title, estimate, .. } => {
            let task = tasks.add(&title, estimate)?.clone();
            ctx.save_tasks(technique, &tasks)?;
            print_task(&task)?;
        }
        TaskAction::List { json, .. } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
                return Ok(());
            }
            if tasks.is_empty() {
                println!("No tasks");
                return Ok(());
            }
            let current = tasks.effective_current().map(|t| t.id.clone());
            for task in tasks.tasks() {
                let marker = if current.as_deref() == Some(task.id.as_str()) {
                    ">"
                } else if task.is_complete() {
                    "x"
                } else {
                    " "
                };
                println!(
                    "{marker} {} [{}/{}] {}",
                    task.id, task.completed_cycles, task.estimated_cycles, task.title
                );
            }
        }
        TaskAction::Edit {
            id,
            title,
            estimate,
            ..
        } => {
            let existing = tasks
                .get(&id)
                .cloned()
                .ok_or_else(|| vitempo_core::ValidationError::TaskNotFound(id.clone()))?;
            let title = title.unwrap_or(existing.title);
            let estimate = estimate.unwrap_or(existing.estimated_cycles);
            let task = tasks.edit(&id, &title, estimate)?.clone();
            ctx.save_tasks(technique, &tasks)?;
            print_task(&task)?;
        }
        TaskAction::Delete { id, .. } => {
            let task = tasks.delete(&id)?;
            ctx.save_tasks(technique, &tasks)?;
            println!("deleted {}", task.id);
        }
        TaskAction::Toggle { id, .. } => {
            let task = tasks.toggle_complete(&id)?.clone();
            ctx.save_tasks(technique, &tasks)?;
            print_task(&task)?;
        }
        TaskAction::Move { id, before, to, .. } => {
            let moved = match (before, to) {
                (Some(target), _) => tasks.move_task(&id, &target)?,
                (None, Some(index)) => tasks.move_to(&id, index)?,
                (None, None) => false,
            };
            if moved {
                ctx.save_tasks(technique, &tasks)?;
            }
            println!("{}", if moved { "moved" } else { "unchanged" });
        }
        TaskAction::Current { id, .. } => {
            if tasks.assign_current(&id)? {
                ctx.save_tasks(technique, &tasks)?;
            } else if tasks.get(&id).is_some_and(Task::is_complete) {
                return Err(format!("task {id} is already complete").into());
            }
            println!("current task: {id}");
        }
    }
    Ok(())
}
