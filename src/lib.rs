//! # openai-compat
//!
//! Streaming adapter for OpenAI-compatible chat completion APIs.
//!
//! One handler covers api.openai.com, Azure OpenAI deployments and
//! self-hosted or third-party servers that speak the chat-completions
//! protocol. Conversations go in as role-tagged [`Message`]s plus a system
//! prompt; replies come out as a stream of [`StreamEvent`]s carrying text,
//! reasoning and token usage.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use openai_compat::{ApiHandler, Message, OpenAiConfig, OpenAiHandler, StreamEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = OpenAiHandler::new(
//!         OpenAiConfig::from_env()?.with_model_id("gpt-4o-mini"),
//!     )?;
//!
//!     let mut stream = handler.create_message(
//!         "You are a helpful assistant.",
//!         &[Message::user("Explain SSE in one sentence.")],
//!     );
//!
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             StreamEvent::Text { text } => print!("{text}"),
//!             StreamEvent::Reasoning { .. } => {}
//!             StreamEvent::Usage { input_tokens, output_tokens } => {
//!                 eprintln!("\n[{input_tokens} in / {output_tokens} out]");
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! `create_message` retries rate-limited attempts according to the
//! configured [`RetryConfig`]. Use [`OpenAiHandler::stream_completion`] for a
//! single attempt.

pub mod completions;
pub mod core;
pub mod provider;

pub use crate::core::{
    ApiHandler, ApiStream, ChatRole, ContentBlock, HttpClientConfig, ImageSource,
    InspectorConfig, LlmError, Message, MessageContent, ModelInfo, ModelSelection, RetryConfig,
    SingleCompletionHandler, StreamEvent, ToolResultBlock, ToolResultContent, with_retry,
};
pub use completions::ReasoningEffort;
pub use provider::{ApiKey, ModelFamily, OpenAiConfig, OpenAiHandler, TransportKind};
