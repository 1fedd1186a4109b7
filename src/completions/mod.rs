//! Wire format of the OpenAI chat-completions API and the converters that
//! produce it from host messages.

pub mod convert;
pub mod r1;
pub mod request;
pub mod response;

pub use convert::convert_to_openai_messages;
pub use r1::{convert_to_r1_format, r1_messages_with_system};
pub use request::{
    ChatCompletionRequest, ChatContent, ChatMessage, ChatMessageRole, ContentPart,
    ReasoningEffort,
};
pub use response::{ChatCompletionChunk, ChatCompletionResponse, Delta, Usage};
