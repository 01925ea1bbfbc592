//! General assistant chat, streamed.

use async_stream::stream;
use futures::StreamExt;

use super::SharedContext;
use crate::ai::{ChatStream, StreamEvent};
use crate::types::{ChatTurn, InlineImage};

pub struct AssistantService {
    ctx: SharedContext,
}

impl AssistantService {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    /// Stream a reply to `message`, optionally with an image.
    ///
    /// An empty `model` uses the fast model. If no chunk arrives before the
    /// first-chunk deadline the stream yields one `Error` and ends.
    pub fn stream(
        &self,
        history: &[ChatTurn],
        message: &str,
        image: Option<InlineImage>,
        model: &str,
    ) -> ChatStream {
        let mut turn = ChatTurn::user(message);
        if let Some(image) = image {
            turn = turn.with_image(image);
        }
        let model = if model.trim().is_empty() {
            self.ctx.ai.model_fast.as_str()
        } else {
            model
        };

        let mut inner = self.ctx.client.stream_chat(history, turn, model);
        let deadline = self.ctx.timeouts.first_chunk;

        Box::pin(stream! {
            match tokio::time::timeout(deadline, inner.next()).await {
                Err(_) => {
                    tracing::warn!("No reply chunk within {:?}", deadline);
                    yield StreamEvent::Error(format!(
                        "No response within {} seconds",
                        deadline.as_secs()
                    ));
                    return;
                }
                Ok(None) => return,
                Ok(Some(first)) => {
                    let failed = matches!(first, StreamEvent::Error(_));
                    yield first;
                    if failed {
                        return;
                    }
                }
            }
            while let Some(event) = inner.next().await {
                yield event;
            }
        })
    }
}
