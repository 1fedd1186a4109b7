use async_trait::async_trait;

use super::{
    error::LlmError,
    types::{ApiStream, Message, ModelSelection},
};

/// A provider that turns a conversation into a stream of completion events.
pub trait ApiHandler: Send + Sync {
    /// Start a completion. No request is sent until the stream is polled.
    fn create_message(&self, system_prompt: &str, messages: &[Message]) -> ApiStream;

    fn get_model(&self) -> ModelSelection;
}

/// A provider that can answer a bare prompt without conversation context.
#[async_trait]
pub trait SingleCompletionHandler: Send + Sync {
    async fn complete_prompt(&self, prompt: &str) -> Result<String, LlmError>;
}
