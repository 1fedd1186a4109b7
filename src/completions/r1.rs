//! Message shaping for DeepSeek R1 style models.
//!
//! These models take no independent system role and expect strictly
//! alternating turns, so consecutive messages from the same role are merged.

use crate::core::{ChatRole, ContentBlock, Message, MessageContent};

use super::request::{ChatContent, ChatMessage, ChatMessageRole, ContentPart};

pub fn convert_to_r1_format(messages: &[Message]) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        let role = ChatMessageRole::from(message.role);
        let content = flatten(&message.content);

        match merged.last_mut() {
            Some(last) if last.role == role => {
                let previous = last.content.take();
                last.content = Some(merge(previous, content));
            }
            _ => merged.push(ChatMessage {
                role,
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
            }),
        }
    }

    merged
}

fn flatten(content: &MessageContent) -> ChatContent {
    let blocks = match content {
        MessageContent::Text(text) => return ChatContent::Text(text.clone()),
        MessageContent::Blocks(blocks) => blocks,
    };

    let mut texts = Vec::new();
    let mut images = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text.clone()),
            ContentBlock::Image { source } => {
                images.push(ContentPart::image_url(source.data_url()));
            }
            ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. } => {}
        }
    }

    if images.is_empty() {
        return ChatContent::Text(texts.join("\n"));
    }

    let mut parts: Vec<ContentPart> = texts.into_iter().map(ContentPart::text).collect();
    parts.extend(images);
    ChatContent::Parts(parts)
}

fn merge(previous: Option<ChatContent>, next: ChatContent) -> ChatContent {
    match (previous, next) {
        (Some(ChatContent::Text(mut prev)), ChatContent::Text(next)) => {
            prev.push('\n');
            prev.push_str(&next);
            ChatContent::Text(prev)
        }
        (previous, next) => {
            let mut parts = into_parts(previous.unwrap_or(ChatContent::Text(String::new())));
            parts.extend(into_parts(next));
            ChatContent::Parts(parts)
        }
    }
}

fn into_parts(content: ChatContent) -> Vec<ContentPart> {
    match content {
        ChatContent::Text(text) => vec![ContentPart::text(text)],
        ChatContent::Parts(parts) => parts,
    }
}

/// Build the R1 message list with the system prompt folded into the first
/// user turn.
pub fn r1_messages_with_system(system_prompt: &str, messages: &[Message]) -> Vec<ChatMessage> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(Message {
        role: ChatRole::User,
        content: MessageContent::Text(system_prompt.to_string()),
    });
    all.extend_from_slice(messages);
    convert_to_r1_format(&all)
}
