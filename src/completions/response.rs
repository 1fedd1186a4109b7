//! Response shapes of the chat-completions endpoint.
//!
//! Everything the adapter reads is optional here: servers that implement the
//! API loosely are common, and missing fields normalize to empty values
//! rather than failing deserialization.

use serde::Deserialize;

use crate::core::{StreamEvent, http::ApiErrorDetail};

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, or an empty string.
    pub fn text(&self) -> String {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_default()
    }

    /// Usage event for this response; counts default to zero.
    pub fn usage_event(&self) -> StreamEvent {
        Usage::event(self.usage.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
}

impl Usage {
    pub fn event(usage: Option<&Usage>) -> StreamEvent {
        StreamEvent::Usage {
            input_tokens: usage.and_then(|u| u.prompt_tokens).unwrap_or(0),
            output_tokens: usage.and_then(|u| u.completion_tokens).unwrap_or(0),
        }
    }
}

/// One SSE frame of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Some servers report failures inside the stream instead of via status
    #[serde(default)]
    pub(crate) error: Option<ApiErrorDetail>,
}

impl ChatCompletionChunk {
    pub fn delta(&self) -> Option<&Delta> {
        self.choices.first().and_then(|choice| choice.delta.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<Delta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl Delta {
    /// Answer text carried by this delta, if any.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref().filter(|text| !text.is_empty())
    }

    /// Intermediate reasoning, only sent by providers that expose it
    /// separately from the answer (DeepSeek R1 and compatible servers).
    pub fn reasoning_content(&self) -> Option<&str> {
        self.reasoning_content
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}
