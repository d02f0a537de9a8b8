//! Incremental Server-Sent-Events decoding for OpenAI-compatible streams
//!
//! SSE format:
//! ```text
//! data: {"json": "content"}
//!
//! data: more content
//!
//! data: [DONE]
//! ```

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Event payload (multiple `data:` lines joined with `\n`)
    Data(String),
    /// The `[DONE]` terminator
    Done,
}

impl SseEvent {
    /// Content fragment of an OpenAI chat completion chunk, if any
    ///
    /// ```json
    /// {"id":"chatcmpl-123","choices":[{"index":0,"delta":{"content":"Hello"}}]}
    /// ```
    pub fn openai_delta(&self) -> Option<String> {
        let SseEvent::Data(data) = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        value
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()
            .map(|s| s.to_string())
    }
}

/// Text reassembled from a finished stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub content: String,
    /// Whether the `[DONE]` terminator was seen
    pub is_complete: bool,
    pub event_count: usize,
}

impl ExtractedContent {
    pub fn from_events(events: &[SseEvent]) -> Self {
        Self {
            content: extract_openai_content(events),
            is_complete: events.iter().any(|e| matches!(e, SseEvent::Done)),
            event_count: events.len(),
        }
    }
}

/// Line-oriented decoder that accepts arbitrary chunk boundaries
#[derive(Debug, Default)]
pub struct SseDecoder {
    partial: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.feed_line(line.trim_end_matches(['\n', '\r']), &mut events);
        }

        events
    }

    /// Flush whatever is buffered at end-of-input
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            let line = String::from_utf8_lossy(&rest);
            self.feed_line(line.trim_end_matches('\r'), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn feed_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            let payload = rest.strip_prefix(' ').unwrap_or(rest);
            if payload == "[DONE]" {
                self.dispatch(events);
                events.push(SseEvent::Done);
                return;
            }
            match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(payload);
                }
                None => self.data = Some(payload.to_string()),
            }
            return;
        }

        if line.starts_with(':') || is_sse_field(line) {
            return;
        }

        // Bare, unprefixed payload line
        self.dispatch(events);
        if line == "[DONE]" {
            events.push(SseEvent::Done);
        } else {
            events.push(SseEvent::Data(line.to_string()));
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        if let Some(data) = self.data.take() {
            events.push(SseEvent::Data(data));
        }
    }
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
}

/// Parse a complete raw SSE body
pub fn parse_sse_events(raw: &str) -> Vec<SseEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.push(raw.as_bytes());
    events.extend(decoder.finish());
    events
}

/// Concatenate every OpenAI delta in arrival order
pub fn extract_openai_content(events: &[SseEvent]) -> String {
    events.iter().filter_map(SseEvent::openai_delta).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_events() {
        let raw = "data: {\"a\":1}\n\ndata: {\"b\":2}\n\ndata: [DONE]\n\n";
        let events = parse_sse_events(raw);
        assert_eq!(
            events,
            vec![
                SseEvent::Data("{\"a\":1}".to_string()),
                SseEvent::Data("{\"b\":2}".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_multiline_data_joined() {
        let events = parse_sse_events("data: line1\ndata: line2\n\n");
        assert_eq!(events, vec![SseEvent::Data("line1\nline2".to_string())]);
    }

    #[test]
    fn test_comments_and_fields_ignored() {
        let events = parse_sse_events(": keep-alive\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec![SseEvent::Data("x".to_string())]);
    }

    #[test]
    fn test_unprefixed_lines_and_crlf() {
        let events = parse_sse_events("{\"raw\":true}\r\n[DONE]\r\n");
        assert_eq!(
            events,
            vec![SseEvent::Data("{\"raw\":true}".to_string()), SseEvent::Done]
        );
    }

    #[test]
    fn test_chunk_boundary_inside_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"choices\":[{\"delta\":{\"con").is_empty());
        let events = decoder.push(b"tent\":\"Hi\"}}]}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].openai_delta().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_chunk_boundary_inside_utf8() {
        let text = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n\n";
        let bytes = text.as_bytes();
        let split = text.find('é').unwrap() + 1;
        let mut decoder = SseDecoder::new();
        let mut events = decoder.push(&bytes[..split]);
        events.extend(decoder.push(&bytes[split..]));
        assert_eq!(extract_openai_content(&events), "héllo");
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec![SseEvent::Data("tail".to_string())]);
    }

    #[test]
    fn test_extracted_content_without_done() {
        let raw = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n";
        let extracted = ExtractedContent::from_events(&parse_sse_events(raw));
        assert_eq!(extracted.content, "partial");
        assert!(!extracted.is_complete);
        assert_eq!(extracted.event_count, 1);
    }

    #[test]
    fn test_delta_skips_role_only_chunks() {
        let event = SseEvent::Data(
            "{\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}".to_string(),
        );
        assert!(event.openai_delta().is_none());
        assert!(SseEvent::Done.openai_delta().is_none());
    }
}
