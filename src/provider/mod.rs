pub mod constants;
pub mod openai;
pub(crate) mod transport;

pub use openai::{ApiKey, ModelFamily, OpenAiConfig, OpenAiHandler};
pub use transport::TransportKind;
