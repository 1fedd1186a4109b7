//! Conversion from host messages to chat-completions messages.

use crate::core::{
    ChatRole, ContentBlock, Message, MessageContent, ToolResultBlock, ToolResultContent,
};

use super::request::{
    ChatContent, ChatMessage, ChatMessageRole, ContentPart, FunctionCall, ToolCall, ToolCallType,
};

const IMAGE_PLACEHOLDER: &str = "(see following user message for image)";

impl From<ChatRole> for ChatMessageRole {
    fn from(value: ChatRole) -> Self {
        match value {
            ChatRole::User => ChatMessageRole::User,
            ChatRole::Assistant => ChatMessageRole::Assistant,
        }
    }
}

/// Convert a conversation into OpenAI chat messages.
///
/// Tool results in a user turn become `tool` messages placed before the rest
/// of that turn. Tool uses in an assistant turn become `tool_calls`.
pub fn convert_to_openai_messages(messages: &[Message]) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len());

    for message in messages {
        match &message.content {
            MessageContent::Text(text) => {
                out.push(ChatMessage::text(message.role.into(), text.clone()));
            }
            MessageContent::Blocks(blocks) => match message.role {
                ChatRole::User => convert_user_blocks(blocks, &mut out),
                ChatRole::Assistant => out.push(convert_assistant_blocks(blocks)),
            },
        }
    }

    out
}

fn convert_user_blocks(blocks: &[ContentBlock], out: &mut Vec<ChatMessage>) {
    let mut parts = Vec::new();
    let mut forwarded_images = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => {
                let text = match content {
                    ToolResultContent::Text(text) => text.clone(),
                    ToolResultContent::Blocks(result_blocks) => result_blocks
                        .iter()
                        .map(|block| match block {
                            ToolResultBlock::Text { text } => text.clone(),
                            ToolResultBlock::Image { source } => {
                                forwarded_images.push(ContentPart::image_url(source.data_url()));
                                IMAGE_PLACEHOLDER.to_string()
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                };

                out.push(ChatMessage {
                    role: ChatMessageRole::Tool,
                    content: Some(ChatContent::Text(text)),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                });
            }
            ContentBlock::Text { text } => parts.push(ContentPart::text(text.clone())),
            ContentBlock::Image { source } => {
                parts.push(ContentPart::image_url(source.data_url()));
            }
            // a user turn cannot call tools
            ContentBlock::ToolUse { .. } => {}
        }
    }

    // images from tool results travel in the user message that follows
    parts.extend(forwarded_images);

    if !parts.is_empty() {
        out.push(ChatMessage::parts(ChatMessageRole::User, parts));
    }
}

fn convert_assistant_blocks(blocks: &[ContentBlock]) -> ChatMessage {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text.as_str()),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id: id.clone(),
                r#type: ToolCallType::Function,
                function: FunctionCall {
                    name: name.clone(),
                    arguments: input.to_string(),
                },
            }),
            // assistants cannot send images or tool results
            ContentBlock::Image { .. } | ContentBlock::ToolResult { .. } => {}
        }
    }

    let content = texts.join("\n");
    let content = if content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(ChatContent::Text(content))
    };

    ChatMessage {
        role: ChatMessageRole::Assistant,
        content,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageSource;
    use serde_json::json;

    #[test]
    fn plain_text_keeps_role_and_content() {
        let converted = convert_to_openai_messages(&[
            Message::user("hello"),
            Message::assistant("hi there"),
        ]);

        assert_eq!(
            serde_json::to_value(&converted).unwrap(),
            json!([
                { "role": "user", "content": "hello" },
                { "role": "assistant", "content": "hi there" }
            ])
        );
    }

    #[test]
    fn user_blocks_become_parts_with_data_urls() {
        let converted = convert_to_openai_messages(&[Message::user(vec![
            ContentBlock::text("what is this?"),
            ContentBlock::image("image/png", "iVBOR"),
        ])]);

        assert_eq!(
            serde_json::to_value(&converted).unwrap(),
            json!([{
                "role": "user",
                "content": [
                    { "type": "text", "text": "what is this?" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,iVBOR" } }
                ]
            }])
        );
    }

    #[test]
    fn tool_results_precede_the_user_message() {
        let converted = convert_to_openai_messages(&[Message::user(vec![
            ContentBlock::text("and then?"),
            ContentBlock::ToolResult {
                tool_use_id: "call_1".to_string(),
                content: ToolResultContent::Text("42".to_string()),
                is_error: None,
            },
        ])]);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, ChatMessageRole::Tool);
        assert_eq!(converted[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(converted[0].as_text(), Some("42"));
        assert_eq!(converted[1].role, ChatMessageRole::User);
    }

    #[test]
    fn tool_result_images_are_forwarded_to_user_message() {
        let converted = convert_to_openai_messages(&[Message::user(vec![
            ContentBlock::ToolResult {
                tool_use_id: "call_1".to_string(),
                content: ToolResultContent::Blocks(vec![
                    ToolResultBlock::Text {
                        text: "screenshot taken".to_string(),
                    },
                    ToolResultBlock::Image {
                        source: ImageSource {
                            media_type: "image/jpeg".to_string(),
                            data: "abc".to_string(),
                        },
                    },
                ]),
                is_error: None,
            },
        ])]);

        assert_eq!(converted.len(), 2);
        assert_eq!(
            converted[0].as_text(),
            Some("screenshot taken\n(see following user message for image)")
        );
        assert_eq!(
            converted[1].content,
            Some(ChatContent::Parts(vec![ContentPart::image_url(
                "data:image/jpeg;base64,abc"
            )]))
        );
    }

    #[test]
    fn assistant_tool_use_becomes_tool_calls() {
        let converted = convert_to_openai_messages(&[Message::assistant(vec![
            ContentBlock::text("Reading the file."),
            ContentBlock::ToolUse {
                id: "call_9".to_string(),
                name: "read_file".to_string(),
                input: json!({ "path": "src/lib.rs" }),
            },
        ])]);

        assert_eq!(
            serde_json::to_value(&converted).unwrap(),
            json!([{
                "role": "assistant",
                "content": "Reading the file.",
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": { "name": "read_file", "arguments": "{\"path\":\"src/lib.rs\"}" }
                }]
            }])
        );
    }

    #[test]
    fn assistant_with_only_tool_calls_has_no_content() {
        let converted = convert_to_openai_messages(&[Message::assistant(vec![
            ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "ls".to_string(),
                input: json!({}),
            },
        ])]);

        assert_eq!(converted[0].content, None);
        assert!(converted[0].tool_calls.is_some());
    }
}
