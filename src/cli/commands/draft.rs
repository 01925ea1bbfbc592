//! Draft Command
//!
//! Turn a free-form request into three task drafts. With `--pick N` the
//! chosen draft is stored as a new task.

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::{HubError, Result};

pub async fn run(
    ctx: &CommandContext,
    input: &str,
    pick: Option<usize>,
    format: &str,
) -> Result<()> {
    let out = Output::new();
    let drafts = ctx.services.tasks.draft(input).await?;

    let Some(pick) = pick else {
        if super::is_json(format) {
            return super::print_json(&drafts);
        }
        out.header("Task drafts");
        for (i, patch) in drafts.iter().enumerate() {
            out.draft(i + 1, patch);
        }
        println!();
        out.info("Re-run with --pick <N> to create one of these tasks");
        return Ok(());
    };

    let patch = pick
        .checked_sub(1)
        .and_then(|i| drafts.get(i))
        .ok_or_else(|| {
            HubError::Config(format!("--pick must be between 1 and {}", drafts.len()))
        })?;

    let task = ctx.services.tasks.create_from_patch(patch)?;
    if super::is_json(format) {
        return super::print_json(&task);
    }
    out.success(&format!("Created task {}", task.id));
    out.task(&task);
    Ok(())
}
