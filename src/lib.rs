//! # gemini-provider
//!
//! Adapter exposing Google's Gemini chat API through a generic host
//! "AI provider" contract.
//!
//! The adapter translates a host-side conversation (system/user/model turns)
//! into Gemini's content format, invokes the API, and hands back a normalized
//! chat result together with the raw provider response. Client construction
//! is lazy and authenticated; swapping the API key invalidates the cached
//! client so the next call rebuilds it under the new credential.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gemini_provider::{
//!     ChatInput, ChatMessage, ChatPayload, GeminiProvider, StaticKeys, StaticSettings,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_provider::Error> {
//!     let settings = Arc::new(StaticSettings::new([("api_key", "gemini_key")]));
//!     let keys = Arc::new(StaticKeys::new([("gemini_key", "AI...")]));
//!     let mut provider = GeminiProvider::new(reqwest::Client::new(), settings, keys);
//!
//!     let input = ChatInput::new(vec![ChatMessage::user("Hello")]);
//!     let output = provider
//!         .chat(ChatPayload::Conversation(input), "models/gemini-pro", &[])
//!         .await?;
//!     println!("{}", output.message.text);
//!     Ok(())
//! }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod client;
pub mod config;
pub mod definition;
pub mod provider;
pub mod types;
pub mod wire;

pub use auth::{EnvKeyRepository, KeyRepository, StaticKeys};
pub use client::GeminiClient;
pub use config::{GenerationOptions, SettingsStore, StaticSettings};
pub use definition::{ApiDefinition, api_defaults};
pub use provider::GeminiProvider;
pub use types::{ChatInput, ChatMessage, ChatOutput, ChatPayload, ChatRole, OperationType};

use thiserror::Error as ThisError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the adapter.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A conversation turn used a role the provider cannot accept.
    /// Raised before any network call is made.
    #[error("the role {0} is not supported by the Gemini provider")]
    UnsupportedRole(String),

    /// The vendor call failed: transport error, non-success status, or a
    /// malformed/unparsable payload. One kind for everything past the seam.
    #[error("provider response error: {0}")]
    Response(String),

    /// Authentication material could not be resolved.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn response(message: impl Into<String>) -> Self {
        Error::Response(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

// Vendor-call failures collapse into the single provider-response kind; the
// caller only ever branches on "the provider call failed", not on transport
// vs. decode.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Response(err.to_string())
    }
}
