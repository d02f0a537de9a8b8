//! Caller-side decoding of the relayed streams
//!
//! The proxies relay upstream bytes untouched. Turning those bytes back into
//! text deltas (chat) or agent events (agent turns) happens here, on the
//! consuming side: the CLI and the integration tests use these decoders.

mod agent;
mod sse;

pub use agent::{AgentMessageEvent, AgentSession, AgentStreamDecoder, AgentTurn, TurnState};
pub use sse::{ExtractedContent, SseDecoder, SseEvent, extract_openai_content, parse_sse_events};

use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Drain an agent byte stream into one turn.
///
/// Stops reading as soon as an event with `finishReason == true` arrives;
/// otherwise the turn terminates at end-of-input.
pub async fn collect_agent_turn<S, E>(mut stream: S) -> Result<AgentTurn, E>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let mut decoder = AgentStreamDecoder::new();
    let mut turn = AgentTurn::new();

    while let Some(chunk) = stream.next().await {
        for event in decoder.push(&chunk?) {
            turn.apply(event);
        }
        if turn.is_terminated() {
            return Ok(turn);
        }
    }

    for event in decoder.finish() {
        turn.apply(event);
    }
    turn.finish_input();
    Ok(turn)
}

/// Drain an OpenAI-compatible SSE byte stream, calling `on_delta` for every
/// content fragment as it arrives.
pub async fn collect_chat_stream<S, E, F>(
    mut stream: S,
    mut on_delta: F,
) -> Result<ExtractedContent, E>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    F: FnMut(&str),
{
    let mut decoder = SseDecoder::new();
    let mut events = Vec::new();

    while let Some(chunk) = stream.next().await {
        for event in decoder.push(&chunk?) {
            if let Some(delta) = event.openai_delta() {
                on_delta(&delta);
            }
            events.push(event);
        }
    }
    for event in decoder.finish() {
        if let Some(delta) = event.openai_delta() {
            on_delta(&delta);
        }
        events.push(event);
    }

    Ok(ExtractedContent::from_events(&events))
}
