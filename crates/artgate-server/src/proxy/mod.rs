//! Streaming proxy routes
//!
//! Two proxies share one shape: resolve the caller, decrypt the stored
//! credential, make one upstream call, and relay the body back unchanged.
//! - [`chat`]: OpenAI-compatible chat completions
//! - [`agent`]: the vendor agent endpoint, with client-threaded session ids

pub mod agent;
pub mod chat;
pub mod config_routes;
mod error;
pub mod relay;
pub mod server;
pub mod upstream;

pub use error::ProxyError;
pub use relay::{RelayStream, event_stream_response};
pub use server::{AppState, Authenticated, ProxyServer, create_router};
pub use upstream::{AgentUpstream, ChatUpstream};
