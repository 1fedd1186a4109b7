pub mod error;
pub mod http;
pub mod retry;
pub mod sse;
pub mod traits;
pub mod types;

pub use error::{COMPLETION_ERROR_PREFIX, LlmError};
pub use http::{HttpClient, HttpClientConfig, InspectorConfig};
pub use retry::{RetryConfig, with_retry};
pub use traits::{ApiHandler, SingleCompletionHandler};
pub use types::{
    ApiStream, ChatRole, ContentBlock, ImageSource, Message, MessageContent, ModelInfo,
    ModelSelection, StreamEvent, ToolResultBlock, ToolResultContent,
};
