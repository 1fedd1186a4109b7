//! OpenAI-compatible chat completion provider.
//!
//! Works against api.openai.com, Azure OpenAI deployments and any server that
//! speaks the chat-completions protocol (DeepSeek, vLLM, LM Studio, ...).
//! A few model families need special request shapes:
//!
//! - `o1`, `o1-preview`, `o1-mini` reject system messages and streaming, so the
//!   system prompt is sent as a user turn and the reply arrives in one piece.
//! - `o3-mini` takes its instructions through the `developer` role.
//! - `deepseek-reasoner` wants no system role and strictly alternating turns,
//!   and streams its chain of thought as `reasoning_content`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::completions::{
    ChatCompletionRequest, ChatMessage, ChatMessageRole, ReasoningEffort, Usage,
    convert_to_openai_messages, r1_messages_with_system,
};
use crate::core::{
    ApiHandler, ApiStream, HttpClientConfig, InspectorConfig, LlmError, Message, ModelInfo,
    ModelSelection, RetryConfig, SingleCompletionHandler, StreamEvent, with_retry,
};

use super::constants::{azure, models, openai};
use super::transport::{ChatTransport, TransportKind};

/// Where to take the API key from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    /// Read [`openai::API_KEY_ENV_VAR`] from the environment
    Default,
    Custom(String),
}

impl ApiKey {
    pub fn resolve(&self) -> Result<String, LlmError> {
        match self {
            ApiKey::Custom(key) => Ok(key.clone()),
            ApiKey::Default => std::env::var(openai::API_KEY_ENV_VAR).map_err(|_| {
                LlmError::ProviderConfiguration(format!("{} not set.", openai::API_KEY_ENV_VAR))
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Only used for Azure deployments
    pub azure_api_version: Option<String>,
    pub model_id: Option<String>,
    pub model_info: Option<ModelInfo>,
    /// Sent with `o3-mini` requests when set
    pub reasoning_effort: Option<ReasoningEffort>,
    pub http_config: HttpClientConfig,
    pub retry_config: RetryConfig,
    pub inspector_config: Option<InspectorConfig>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: openai::API_BASE.to_string(),
            azure_api_version: None,
            model_id: None,
            model_info: None,
            reasoning_effort: None,
            http_config: HttpClientConfig::default(),
            retry_config: RetryConfig::default(),
            inspector_config: None,
        }
    }

    pub fn with_api_key(api_key: ApiKey) -> Result<Self, LlmError> {
        Ok(Self::new(api_key.resolve()?))
    }

    /// Build a config from `OPENAI_API_KEY`, `OPENAI_BASE_URL`,
    /// `OPENAI_MODEL_ID` and `AZURE_OPENAI_API_VERSION`.
    pub fn from_env() -> Result<Self, LlmError> {
        let mut config = Self::with_api_key(ApiKey::Default)?;

        if let Ok(base_url) = std::env::var(openai::BASE_URL_ENV_VAR) {
            config = config.with_base_url(base_url);
        }
        if let Ok(model_id) = std::env::var(openai::MODEL_ID_ENV_VAR) {
            config = config.with_model_id(model_id);
        }
        if let Ok(version) = std::env::var(azure::API_VERSION_ENV_VAR) {
            config = config.with_azure_api_version(version);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_azure_api_version(mut self, version: impl Into<String>) -> Self {
        self.azure_api_version = Some(version.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_model_info(mut self, info: ModelInfo) -> Self {
        self.model_info = Some(info);
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn with_inspector(mut self, config: InspectorConfig) -> Self {
        self.inspector_config = Some(config);
        self
    }
}

/// Request shape required by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Non-streaming reasoning models without a system role
    O1,
    /// Instructions go through the `developer` role
    O3Mini,
    /// No system role, alternating turns, streams `reasoning_content`
    DeepSeekReasoner,
    Standard,
}

impl ModelFamily {
    pub fn from_model_id(model_id: &str) -> Self {
        match model_id {
            models::O1 | models::O1_PREVIEW | models::O1_MINI => ModelFamily::O1,
            models::O3_MINI => ModelFamily::O3Mini,
            id if id.contains(models::DEEPSEEK_REASONER) => ModelFamily::DeepSeekReasoner,
            _ => ModelFamily::Standard,
        }
    }
}

#[derive(Clone)]
pub struct OpenAiHandler {
    config: Arc<OpenAiConfig>,
    transport: Arc<ChatTransport>,
}

impl OpenAiHandler {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let transport = ChatTransport::new(
            &config.base_url,
            &config.api_key,
            config.azure_api_version.as_deref(),
            &config.http_config,
            config.inspector_config.clone(),
        )?;

        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        })
    }

    pub fn transport_kind(&self) -> &TransportKind {
        self.transport.kind()
    }

    fn model_id(&self) -> &str {
        self.config.model_id.as_deref().unwrap_or_default()
    }

    /// Stream a completion of `messages` under `system_prompt`.
    ///
    /// Nothing is sent until the returned stream is first polled, and dropping
    /// the stream aborts the underlying request. Each call is independent, so
    /// the whole operation can safely be re-run by a retry policy.
    pub fn stream_completion(&self, system_prompt: &str, messages: &[Message]) -> ApiStream {
        let model_id = self.model_id().to_string();
        let family = ModelFamily::from_model_id(&model_id);
        debug!(model = %model_id, ?family, "Preparing completion request");

        match family {
            ModelFamily::O1 => {
                let mut chat_messages =
                    vec![ChatMessage::text(ChatMessageRole::User, system_prompt)];
                chat_messages.extend(convert_to_openai_messages(messages));

                let request = ChatCompletionRequest::new(model_id, chat_messages);
                Box::pin(single_shot_events(self.transport.clone(), request))
            }
            ModelFamily::O3Mini => {
                let mut chat_messages =
                    vec![ChatMessage::text(ChatMessageRole::Developer, system_prompt)];
                chat_messages.extend(convert_to_openai_messages(messages));

                let request = ChatCompletionRequest::new(model_id, chat_messages)
                    .with_reasoning_effort(self.config.reasoning_effort)
                    .streaming();
                Box::pin(streamed_events(self.transport.clone(), request, false))
            }
            ModelFamily::DeepSeekReasoner => {
                let request = ChatCompletionRequest::new(
                    model_id,
                    r1_messages_with_system(system_prompt, messages),
                )
                .with_temperature(0.0)
                .streaming();
                Box::pin(streamed_events(self.transport.clone(), request, true))
            }
            ModelFamily::Standard => {
                let mut chat_messages =
                    vec![ChatMessage::text(ChatMessageRole::System, system_prompt)];
                chat_messages.extend(convert_to_openai_messages(messages));

                let request = ChatCompletionRequest::new(model_id, chat_messages)
                    .with_temperature(0.0)
                    .streaming();
                Box::pin(streamed_events(self.transport.clone(), request, true))
            }
        }
    }
}

/// One non-streaming request, replayed as a text event followed by usage.
fn single_shot_events(
    transport: Arc<ChatTransport>,
    request: ChatCompletionRequest,
) -> impl Stream<Item = Result<StreamEvent, LlmError>> + Send {
    async_stream::try_stream! {
        let response = transport.create(&request).await?;
        debug!(model = %request.model, "Received single-shot completion");

        yield StreamEvent::Text { text: response.text() };
        yield response.usage_event();
    }
}

fn streamed_events(
    transport: Arc<ChatTransport>,
    request: ChatCompletionRequest,
    include_reasoning: bool,
) -> impl Stream<Item = Result<StreamEvent, LlmError>> + Send {
    async_stream::try_stream! {
        let chunks = transport.create_stream(&request).await?;
        let mut chunks = std::pin::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;

            if let Some(delta) = chunk.delta() {
                if let Some(text) = delta.content() {
                    yield StreamEvent::Text { text: text.to_string() };
                }
                if include_reasoning {
                    if let Some(reasoning) = delta.reasoning_content() {
                        yield StreamEvent::Reasoning { reasoning: reasoning.to_string() };
                    }
                }
            }

            if chunk.usage.is_some() {
                yield Usage::event(chunk.usage.as_ref());
            }
        }

        debug!(model = %request.model, "Completion stream finished");
    }
}

impl ApiHandler for OpenAiHandler {
    fn create_message(&self, system_prompt: &str, messages: &[Message]) -> ApiStream {
        let handler = self.clone();
        let system_prompt = system_prompt.to_string();
        let messages = messages.to_vec();

        with_retry(
            move || handler.stream_completion(&system_prompt, &messages),
            self.config.retry_config.clone(),
        )
    }

    fn get_model(&self) -> ModelSelection {
        ModelSelection {
            id: self.model_id().to_string(),
            info: self.config.model_info.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SingleCompletionHandler for OpenAiHandler {
    #[tracing::instrument(name = "complete_prompt", skip(self, prompt), err)]
    async fn complete_prompt(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model_id(), "Sending single-shot prompt");
        let request = ChatCompletionRequest::new(
            self.model_id(),
            vec![ChatMessage::text(ChatMessageRole::User, prompt)],
        );

        let response = self
            .transport
            .create(&request)
            .await
            .map_err(LlmError::completion)?;

        Ok(response.text())
    }
}
