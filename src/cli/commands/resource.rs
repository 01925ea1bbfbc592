//! Resource Command
//!
//! Knowledge hub: add a resource from a URL (AI analysis) or a local file,
//! retry failed analyses, list, show and delete.

use std::path::Path;

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::cli::util::file_upload;
use crate::types::{HubError, Result};

pub async fn add(ctx: &CommandContext, url: Option<&str>, file: Option<&Path>) -> Result<()> {
    let out = Output::new();
    let resource = match (url, file) {
        (Some(url), None) => {
            out.info(&format!("Analyzing {}...", url));
            ctx.services.knowledge.add_from_url(url).await?
        }
        (None, Some(path)) => ctx.services.knowledge.add_from_file(&file_upload(path)?)?,
        _ => {
            return Err(HubError::Config(
                "Provide either a URL or --file <path>".to_string(),
            ));
        }
    };

    if resource.is_failed() {
        out.warning(&format!("Stored {} as a draft", resource.id));
    } else {
        out.success(&format!("Added {}", resource.id));
    }
    out.resource(&resource);
    Ok(())
}

pub async fn retry(ctx: &CommandContext, id: &str) -> Result<()> {
    let out = Output::new();
    out.info(&format!("Re-analyzing {}...", id));
    let resource = ctx.services.knowledge.retry(id).await?;
    if resource.is_failed() {
        out.warning("Analysis failed again");
    } else {
        out.success("Analysis succeeded");
    }
    out.resource(&resource);
    Ok(())
}

pub fn list(ctx: &CommandContext, failed_only: bool, format: &str) -> Result<()> {
    let resources: Vec<_> = ctx
        .services
        .knowledge
        .list()?
        .into_iter()
        .filter(|r| !failed_only || r.is_failed())
        .collect();

    if super::is_json(format) {
        return super::print_json(&resources);
    }

    let out = Output::new();
    if resources.is_empty() {
        out.info("No resources");
        return Ok(());
    }
    out.section(&format!("Resources ({})", resources.len()));
    for resource in &resources {
        out.resource_row(resource);
    }
    Ok(())
}

pub fn show(ctx: &CommandContext, id: &str, format: &str) -> Result<()> {
    let resource = ctx.services.knowledge.get(id)?;
    if super::is_json(format) {
        return super::print_json(&resource);
    }
    Output::new().resource(&resource);
    Ok(())
}

pub fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    ctx.services.knowledge.delete(id)?;
    Output::new().success(&format!("Deleted resource {}", id));
    Ok(())
}
