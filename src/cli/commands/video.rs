//! Video Command
//!
//! Usage:
//!   nexushub video analyze <url>
//!   nexushub video frames <name> --frame a.webp --frame b.webp --duration 120
//!   nexushub video summary <url>
//!   nexushub video history [-f json]
//!   nexushub video show <id>

use std::path::PathBuf;

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::cli::util::read_image;
use crate::types::{Result, log_filter_warn};

pub async fn analyze(ctx: &CommandContext, url: &str, format: &str) -> Result<()> {
    let out = Output::new();
    if !super::is_json(format) {
        out.info(&format!("Analyzing {}...", url));
    }
    let item = ctx.services.video.analyze_url(url).await?;
    if super::is_json(format) {
        return super::print_json(&item);
    }
    out.analysis(&item);
    Ok(())
}

/// Frames are pre-extracted still images in playback order.
pub async fn frames(
    ctx: &CommandContext,
    name: &str,
    frames: &[PathBuf],
    duration: f64,
    format: &str,
) -> Result<()> {
    let out = Output::new();
    let images: Vec<_> = frames
        .iter()
        .filter_map(|path| log_filter_warn(read_image(path), &path.display().to_string()))
        .collect();
    if images.len() < frames.len() {
        out.warning(&format!(
            "Skipped {} unreadable frames",
            frames.len() - images.len()
        ));
    }

    let item = ctx
        .services
        .video
        .analyze_frames(name, images, duration)
        .await?;
    if super::is_json(format) {
        return super::print_json(&item);
    }
    out.analysis(&item);
    Ok(())
}

pub async fn summary(ctx: &CommandContext, url: &str) -> Result<()> {
    let text = ctx.services.video.quick_summary(url).await?;
    println!("{}", text);
    Ok(())
}

pub fn history(ctx: &CommandContext, format: &str) -> Result<()> {
    let items = ctx.services.video.history()?;
    if super::is_json(format) {
        return super::print_json(&items);
    }

    let out = Output::new();
    if items.is_empty() {
        out.info("No analyses yet");
        return Ok(());
    }
    out.section(&format!("Analysis history ({})", items.len()));
    for item in &items {
        out.history_row(item);
    }
    Ok(())
}

pub fn show(ctx: &CommandContext, id: &str, format: &str) -> Result<()> {
    let item = ctx.services.video.get(id)?;
    if super::is_json(format) {
        return super::print_json(&item);
    }
    Output::new().analysis(&item);
    Ok(())
}
