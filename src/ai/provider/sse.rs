//! Incremental parser for data-only server-sent events.
//!
//! Network chunks may split an event (or a UTF-8 sequence) anywhere, so bytes
//! are buffered until a blank line terminates the event.

#[derive(Debug, Default)]
pub(super) struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    /// Feed raw bytes and return the `data` payloads of every completed event.
    pub(super) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_event_end(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            if let Some(data) = event_data(&raw[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub(super) fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buf);
        event_data(&raw)
    }
}

fn find_event_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn event_data(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();

    if lines.is_empty() {
        return None;
    }
    let data = lines.join("\n");
    if data.trim().is_empty() || data.trim() == "[DONE]" {
        None
    } else {
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_events() {
        let mut sse = SseBuffer::default();
        let events = sse.push(b"data: {\"a\":1}\n\ndata: {\"a\":2}\n\n");
        assert_eq!(events, vec!["{\"a\":1}", "{\"a\":2}"]);
        assert_eq!(sse.finish(), None);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut sse = SseBuffer::default();
        assert!(sse.push(b"data: {\"te").is_empty());
        assert!(sse.push(b"xt\":\"hi\"}\r\n").is_empty());
        let events = sse.push(b"\r\ndata: next");
        assert_eq!(events, vec!["{\"text\":\"hi\"}"]);
        assert_eq!(sse.finish().as_deref(), Some("next"));
    }

    #[test]
    fn test_split_utf8_sequence() {
        let payload = "data: 안녕\n\n".as_bytes();
        let mut sse = SseBuffer::default();
        assert!(sse.push(&payload[..8]).is_empty());
        assert_eq!(sse.push(&payload[8..]), vec!["안녕"]);
    }

    #[test]
    fn test_ignores_comments_and_done() {
        let mut sse = SseBuffer::default();
        let events = sse.push(b": keep-alive\n\ndata: [DONE]\n\nevent: x\ndata: ok\n\n");
        assert_eq!(events, vec!["ok"]);
    }
}
