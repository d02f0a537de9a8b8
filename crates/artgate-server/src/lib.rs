//! Artgate - credential-holding streaming proxy for LLM and agent APIs
//!
//! The server keeps each principal's upstream API keys encrypted at rest,
//! resolves the caller from a bearer token, and relays OpenAI-compatible
//! chat completions and vendor agent turns back to the caller byte for byte.
//! The [`client`] module holds the decoders a caller needs to consume those
//! streams.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod store;
pub mod vault;

pub use error::ArtgateError;
