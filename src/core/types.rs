use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A conversation turn as the host application stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl Message {
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(value: Vec<ContentBlock>) -> Self {
        MessageContent::Blocks(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        ContentBlock::Image {
            source: ImageSource {
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Base64 encoded image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultBlock {
    Text { text: String },
    Image { source: ImageSource },
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Text {
        text: String,
    },
    Reasoning {
        reasoning: String,
    },
    /// Token accounting. A stream may carry zero or more of these.
    Usage {
        input_tokens: u32,
        output_tokens: u32,
    },
}

pub type ApiStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Static metadata for a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Maximum output tokens, `None` when the provider imposes no explicit limit
    #[serde(default)]
    pub max_tokens: Option<u32>,
    pub context_window: u32,
    pub supports_images: bool,
    #[serde(default)]
    pub supports_prompt_cache: bool,
    /// USD per million input tokens
    #[serde(default)]
    pub input_price: f64,
    /// USD per million output tokens
    #[serde(default)]
    pub output_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            max_tokens: None,
            context_window: 128_000,
            supports_images: true,
            supports_prompt_cache: false,
            input_price: 0.0,
            output_price: 0.0,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub id: String,
    pub info: ModelInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_content_accepts_plain_text_and_blocks() {
        let plain: Message = serde_json::from_value(json!({
            "role": "user",
            "content": "hello"
        }))
        .unwrap();
        assert_eq!(plain, Message::user("hello"));

        let blocks: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [
                { "type": "text", "text": "calling a tool" },
                { "type": "tool_use", "id": "t1", "name": "read", "input": { "path": "a.rs" } }
            ]
        }))
        .unwrap();
        match blocks.content {
            MessageContent::Blocks(ref b) => assert_eq!(b.len(), 2),
            MessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[test]
    fn stream_events_serialize_with_type_tag() {
        let event = StreamEvent::Usage {
            input_tokens: 3,
            output_tokens: 4,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "usage", "input_tokens": 3, "output_tokens": 4 })
        );
    }

    #[test]
    fn default_model_info_is_permissive() {
        let info = ModelInfo::default();
        assert_eq!(info.max_tokens, None);
        assert_eq!(info.context_window, 128_000);
        assert!(info.supports_images);
        assert!(!info.supports_prompt_cache);
        assert_eq!(info.input_price, 0.0);
    }
}
