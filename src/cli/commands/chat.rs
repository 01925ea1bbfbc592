//! Chat Command
//!
//! Streaming assistant chat. With a message, prints one streamed reply;
//! without one, runs an interactive session on stdin.

use std::io::{BufRead, Write};
use std::path::Path;

use futures::StreamExt;

use crate::ai::StreamEvent;
use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::cli::util::read_image;
use crate::types::{ChatTurn, InlineImage, Result};

pub async fn run(
    ctx: &CommandContext,
    message: Option<&str>,
    image: Option<&Path>,
    model: Option<&str>,
) -> Result<()> {
    let image = image.map(read_image).transpose()?;
    let model = model.unwrap_or_default();

    if let Some(message) = message {
        stream_reply(ctx, &[], message, image, model).await?;
        return Ok(());
    }

    let out = Output::new();
    out.header("NexusHub assistant");
    out.info("Empty line to finish");

    let mut history: Vec<ChatTurn> = Vec::new();
    let mut image = image;
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let line = line.trim();

        // The image rides along with the first turn only
        let attached = image.take();
        let mut turn = ChatTurn::user(line);
        if let Some(img) = attached.clone() {
            turn = turn.with_image(img);
        }

        if let Some(reply) = stream_reply(ctx, &history, line, attached, model).await? {
            history.push(turn);
            history.push(ChatTurn::model(reply));
        }
    }
    Ok(())
}

/// Print chunks as they arrive. Returns the full reply, or `None` when the
/// stream reported an error.
async fn stream_reply(
    ctx: &CommandContext,
    history: &[ChatTurn],
    message: &str,
    image: Option<InlineImage>,
    model: &str,
) -> Result<Option<String>> {
    let mut stream = ctx.services.assistant.stream(history, message, image, model);
    let mut reply = String::new();
    let mut stdout = std::io::stdout();

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Text(chunk) => {
                print!("{}", chunk);
                stdout.flush()?;
                reply.push_str(&chunk);
            }
            StreamEvent::Error(message) => {
                println!();
                Output::new().error(&message);
                return Ok(None);
            }
        }
    }
    println!();
    Ok(Some(reply))
}
