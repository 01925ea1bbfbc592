//! Task Command
//!
//! Usage:
//!   nexushub task add <title> [--description ..] [--priority ..]
//!   nexushub task list [-f json]
//!   nexushub task show <id>
//!   nexushub task status <id> <status>
//!   nexushub task analyze <id>
//!   nexushub task subtasks <id> [--apply]
//!   nexushub task toggle <id> <subtask-id>
//!   nexushub task chat <id> [message]
//!   nexushub task delete <id>

use std::io::{BufRead, Write};

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::{ChatMessage, ChatRole, HubError, Priority, Result, Task, TaskStatus};

pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub product: Option<String>,
    pub task_type: Option<String>,
    pub due_date: Option<String>,
}

pub fn add(ctx: &CommandContext, new: NewTask) -> Result<()> {
    let mut task = Task::new(new.title);
    task.description = new.description.unwrap_or_default();
    task.priority = Priority::coerce(new.priority.as_deref());
    task.product = new.product.unwrap_or_default();
    task.task_type = new.task_type.unwrap_or_default();
    task.due_date = new.due_date;

    let task = ctx.services.tasks.create(task)?;
    Output::new().success(&format!("Created task {}", task.id));
    Ok(())
}

pub fn list(ctx: &CommandContext, status: Option<&str>, format: &str) -> Result<()> {
    let filter = status.map(parse_status).transpose()?;
    let tasks: Vec<Task> = ctx
        .services
        .tasks
        .list()?
        .into_iter()
        .filter(|t| filter.is_none_or(|s| t.status == s))
        .collect();

    if super::is_json(format) {
        return super::print_json(&tasks);
    }

    let out = Output::new();
    if tasks.is_empty() {
        out.info("No tasks");
        return Ok(());
    }
    for status in TaskStatus::ALL {
        let column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
        if column.is_empty() {
            continue;
        }
        out.section(&format!("{} ({})", status, column.len()));
        for task in column {
            out.task_row(task);
        }
    }
    Ok(())
}

pub fn show(ctx: &CommandContext, id: &str, format: &str) -> Result<()> {
    let task = ctx.services.tasks.get(id)?;
    if super::is_json(format) {
        return super::print_json(&task);
    }
    Output::new().task(&task);
    Ok(())
}

pub fn status(ctx: &CommandContext, id: &str, status: &str) -> Result<()> {
    let task = ctx.services.tasks.update_status(id, parse_status(status)?)?;
    Output::new().success(&format!("{} → {}", task.title, task.status));
    Ok(())
}

pub async fn analyze(ctx: &CommandContext, id: &str) -> Result<()> {
    let out = Output::new();
    out.info("Generating execution strategy...");
    let task = ctx.services.tasks.analyze(id).await?;
    out.task(&task);
    Ok(())
}

pub async fn subtasks(ctx: &CommandContext, id: &str, apply: bool) -> Result<()> {
    let out = Output::new();
    let suggested = ctx.services.tasks.suggest_subtasks(id).await?;
    if suggested.is_empty() {
        out.warning("No subtasks suggested");
        return Ok(());
    }

    out.section("Suggested subtasks");
    out.subtasks(&suggested);

    if apply {
        let count = suggested.len();
        ctx.services.tasks.add_subtasks(id, suggested)?;
        out.success(&format!("Added {} subtasks", count));
    } else {
        out.info("Re-run with --apply to add them to the task");
    }
    Ok(())
}

pub fn toggle(ctx: &CommandContext, id: &str, subtask_id: &str) -> Result<()> {
    let task = ctx.services.tasks.toggle_subtask(id, subtask_id)?;
    let out = Output::new();
    out.success(&format!(
        "{}/{} subtasks completed",
        task.completed_subtasks(),
        task.subtasks.len()
    ));
    out.subtasks(&task.subtasks);
    Ok(())
}

/// Guide chat anchored to a task. Without a message, reads turns from stdin
/// until EOF or an empty line.
pub async fn chat(ctx: &CommandContext, id: &str, message: Option<&str>) -> Result<()> {
    let task = ctx.services.tasks.get(id)?;
    let out = Output::new();

    if let Some(message) = message {
        let reply = ctx.services.tasks.chat(id, &[], message).await?;
        println!("{}", reply.content);
        return Ok(());
    }

    out.header(&format!("Guide: {}", task.title));
    out.info("Empty line to finish");

    let mut log: Vec<ChatMessage> = Vec::new();
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let line = line.trim();

        match ctx.services.tasks.chat(id, &log, line).await {
            Ok(reply) => {
                println!("\n{}\n", reply.content);
                log.push(ChatMessage::new(ChatRole::User, line));
                log.push(reply);
            }
            Err(e) => out.error(&e.user_message()),
        }
    }
    Ok(())
}

pub fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    ctx.services.tasks.delete(id)?;
    Output::new().success(&format!("Deleted task {}", id));
    Ok(())
}

fn parse_status(raw: &str) -> Result<TaskStatus> {
    raw.parse::<TaskStatus>().map_err(HubError::Config)
}
