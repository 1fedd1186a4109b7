//! HTTP transport for the chat-completions endpoint.
//!
//! Two variants exist: the standard OpenAI-style API and Azure OpenAI
//! deployments. They differ only in URL layout and authentication.

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::completions::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use crate::core::{HttpClient, HttpClientConfig, InspectorConfig, LlmError, sse};

use super::constants::{azure, openai};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Standard,
    Azure { api_version: String },
}

impl TransportKind {
    /// Pick the variant for `base_url`. Azure deployments are recognised by
    /// their host name.
    pub fn detect(base_url: &str, api_version: Option<&str>) -> Self {
        if base_url.to_lowercase().contains(azure::HOST_MARKER) {
            TransportKind::Azure {
                api_version: api_version
                    .unwrap_or(azure::DEFAULT_API_VERSION)
                    .to_string(),
            }
        } else {
            TransportKind::Standard
        }
    }
}

#[derive(Clone)]
pub struct ChatTransport {
    kind: TransportKind,
    base_url: String,
    api_key: String,
    http: HttpClient,
}

impl ChatTransport {
    pub fn new(
        base_url: &str,
        api_key: &str,
        api_version: Option<&str>,
        http_config: &HttpClientConfig,
        inspector_config: Option<InspectorConfig>,
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::ProviderConfiguration(format!(
                "Missing API key. Set {} or pass one explicitly.",
                openai::API_KEY_ENV_VAR
            )));
        }

        reqwest::Url::parse(base_url).map_err(|e| {
            LlmError::ProviderConfiguration(format!("Invalid base URL '{base_url}': {e}"))
        })?;

        let kind = TransportKind::detect(base_url, api_version);
        debug!(?kind, base_url, "Configured chat transport");

        Ok(Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: HttpClient::new(http_config, inspector_config)?,
        })
    }

    pub fn kind(&self) -> &TransportKind {
        &self.kind
    }

    fn url(&self, model: &str) -> String {
        match &self.kind {
            TransportKind::Standard => {
                format!("{}{}", self.base_url, openai::CHAT_COMPLETIONS_ENDPOINT)
            }
            TransportKind::Azure { api_version } => {
                // a base URL may already name its deployment
                let deployment = if self.base_url.contains(azure::DEPLOYMENTS_SEGMENT) {
                    String::new()
                } else {
                    format!("{}/{}", azure::DEPLOYMENTS_SEGMENT, model)
                };
                format!(
                    "{}{}{}?api-version={}",
                    self.base_url,
                    deployment,
                    openai::CHAT_COMPLETIONS_ENDPOINT,
                    api_version
                )
            }
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.kind {
            TransportKind::Standard => vec![(
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            )],
            TransportKind::Azure { .. } => {
                vec![(azure::API_KEY_HEADER.to_string(), self.api_key.clone())]
            }
        }
    }

    /// Send a non-streaming request.
    pub async fn create(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = self.url(&request.model);
        self.http.post_json(&url, &self.headers(), request).await
    }

    /// Send a streaming request and decode the reply frame by frame.
    pub async fn create_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<impl Stream<Item = Result<ChatCompletionChunk, LlmError>> + Send, LlmError>
    {
        let url = self.url(&request.model);
        let response = self.http.post_stream(&url, &self.headers(), request).await?;

        Ok(sse::data_stream(response).map(|payload| payload.and_then(|p| parse_chunk(&p))))
    }
}

fn parse_chunk(payload: &str) -> Result<ChatCompletionChunk, LlmError> {
    let chunk: ChatCompletionChunk =
        serde_json::from_str(payload).map_err(|e| LlmError::Parse {
            message: format!("Failed to parse stream chunk: {payload}"),
            source: Box::new(e),
        })?;

    if let Some(error) = &chunk.error {
        return Err(LlmError::Api {
            message: error.describe(),
            status_code: None,
            retry_after: None,
            source: None,
        });
    }

    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str, api_version: Option<&str>) -> ChatTransport {
        ChatTransport::new(
            base_url,
            "sk-test",
            api_version,
            &HttpClientConfig::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn azure_is_detected_case_insensitively() {
        assert_eq!(
            TransportKind::detect("https://MyRes.OpenAI.Azure.COM/openai", None),
            TransportKind::Azure {
                api_version: azure::DEFAULT_API_VERSION.to_string()
            }
        );
        assert_eq!(
            TransportKind::detect("https://api.deepseek.com/v1", Some("2024-06-01")),
            TransportKind::Standard
        );
    }

    #[test]
    fn explicit_api_version_overrides_default() {
        let t = transport("https://x.openai.azure.com/openai", Some("2024-06-01"));
        assert_eq!(
            t.kind(),
            &TransportKind::Azure {
                api_version: "2024-06-01".to_string()
            }
        );
    }

    #[test]
    fn standard_urls_and_auth() {
        let t = transport("https://api.openai.com/v1/", None);
        assert_eq!(t.url("gpt-4o"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            t.headers(),
            vec![("Authorization".to_string(), "Bearer sk-test".to_string())]
        );
    }

    #[test]
    fn azure_routes_through_deployment() {
        let t = transport("https://x.openai.azure.com/openai", None);
        assert_eq!(
            t.url("gpt-4o"),
            "https://x.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview"
        );
        assert_eq!(
            t.headers(),
            vec![("api-key".to_string(), "sk-test".to_string())]
        );
    }

    #[test]
    fn azure_base_url_naming_a_deployment_is_used_as_is() {
        let t = transport("https://x.openai.azure.com/openai/deployments/my-gpt4o/", None);
        let url = t.url("gpt-4o");

        assert_eq!(
            url,
            "https://x.openai.azure.com/openai/deployments/my-gpt4o/chat/completions?api-version=2024-08-01-preview"
        );
        assert_eq!(url.matches("/deployments/").count(), 1);
        assert_eq!(t.url(""), url);
    }

    #[test]
    fn construction_rejects_missing_key_and_bad_url() {
        let missing_key = ChatTransport::new(
            "https://api.openai.com/v1",
            "  ",
            None,
            &HttpClientConfig::default(),
            None,
        );
        assert!(matches!(
            missing_key,
            Err(LlmError::ProviderConfiguration(_))
        ));

        let bad_url = ChatTransport::new(
            "not a url",
            "sk-test",
            None,
            &HttpClientConfig::default(),
            None,
        );
        assert!(matches!(bad_url, Err(LlmError::ProviderConfiguration(_))));
    }

    #[test]
    fn error_frames_become_api_errors() {
        let err = parse_chunk(r#"{"error":{"message":"overloaded"}}"#).unwrap_err();
        assert!(matches!(err, LlmError::Api { ref message, .. } if message == "overloaded"));

        let err = parse_chunk("{not json").unwrap_err();
        assert!(matches!(err, LlmError::Parse { .. }));
    }
}
