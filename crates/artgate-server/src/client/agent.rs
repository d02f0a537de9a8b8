//! Agent event stream decoding and turn/session tracking
//!
//! The vendor streams one JSON object per line. A turn may be split across
//! many events whose `content` must be concatenated in arrival order. The
//! session id is held by the caller only: capture the latest non-empty value
//! and send it with the next question to continue the conversation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One decoded line of the vendor's event stream
///
/// Decoding is lenient: a null or oddly typed field falls back to a default
/// rather than losing the whole event, since the event may carry the
/// `finishReason` and `sessionId` that close the turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub request_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: String,
    #[serde(default, deserialize_with = "truthy")]
    pub finish_reason: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Value>,
    /// Fields this version does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Null becomes empty; numbers and booleans keep their JSON text
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// JSON truthiness: null, false, 0 and "" are false
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Newline-delimited JSON decoder tolerant of partial chunks
#[derive(Debug, Default)]
pub struct AgentStreamDecoder {
    partial: Vec<u8>,
    skipped: usize,
}

impl AgentStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event whose line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AgentMessageEvent> {
        self.partial.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Decode the trailing unterminated line, if any
    pub fn finish(&mut self) -> Vec<AgentMessageEvent> {
        let rest = std::mem::take(&mut self.partial);
        self.decode_line(&rest).into_iter().collect()
    }

    /// Number of non-blank lines that failed to decode
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<AgentMessageEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let line = line
            .strip_prefix("data:")
            .map(str::trim_start)
            .unwrap_or(line);

        match serde_json::from_str::<AgentMessageEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                self.skipped += 1;
                tracing::trace!("Skipping undecodable agent line: {e}");
                None
            }
        }
    }
}

/// Lifecycle of one agent turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingFirstEvent,
    Receiving,
    Terminated,
}

/// Accumulates the events of one question/answer exchange
#[derive(Debug, Clone)]
pub struct AgentTurn {
    state: TurnState,
    content: String,
    session_id: Option<String>,
    events: Vec<AgentMessageEvent>,
}

impl Default for AgentTurn {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentTurn {
    pub fn new() -> Self {
        Self {
            state: TurnState::AwaitingFirstEvent,
            content: String::new(),
            session_id: None,
            events: Vec::new(),
        }
    }

    /// Apply one event. Events arriving after termination are ignored and
    /// `false` is returned.
    pub fn apply(&mut self, event: AgentMessageEvent) -> bool {
        if self.state == TurnState::Terminated {
            return false;
        }

        self.content.push_str(&event.content);
        if !event.session_id.is_empty() {
            self.session_id = Some(event.session_id.clone());
        }
        self.state = if event.finish_reason {
            TurnState::Terminated
        } else {
            TurnState::Receiving
        };
        self.events.push(event);
        true
    }

    /// Mark end-of-input. A turn always terminates when the stream ends.
    pub fn finish_input(&mut self) {
        self.state = TurnState::Terminated;
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TurnState::Terminated
    }

    /// Reply text reassembled so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Latest non-empty session id seen in this turn
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn events(&self) -> &[AgentMessageEvent] {
        &self.events
    }
}

/// Client-held agent session identifier; empty means "start a new session"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSession {
    id: String,
}

impl AgentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Value to send as `sessionId` on the next call
    pub fn current(&self) -> &str {
        &self.id
    }

    /// Adopt the session id issued during `turn`, if any
    pub fn observe(&mut self, turn: &AgentTurn) {
        if let Some(id) = turn.session_id() {
            self.id = id.to_string();
        }
    }

    pub fn reset(&mut self) {
        self.id.clear();
    }
}
