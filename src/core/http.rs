//! Shared HTTP client for all transports.
//!
//! Every call is a single attempt. Re-invocation on failure belongs to
//! [`super::retry`], which wraps whole completions rather than single requests.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::LlmError;

/// Configuration for the underlying reqwest client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: None,
        }
    }
}

pub type Inspector = Arc<dyn Fn(&Value) + Send + Sync>;

/// Optional hooks that observe request and response bodies.
///
/// Streaming responses are only visible to the request inspector.
#[derive(Clone, Default)]
pub struct InspectorConfig {
    pub request_inspector: Option<Inspector>,
    pub response_inspector: Option<Inspector>,
}

impl InspectorConfig {
    pub fn with_request_inspector(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.request_inspector = Some(Arc::new(f));
        self
    }

    pub fn with_response_inspector(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.response_inspector = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for InspectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorConfig")
            .field("request_inspector", &self.request_inspector.is_some())
            .field("response_inspector", &self.response_inspector.is_some())
            .finish()
    }
}

/// Error envelope returned by OpenAI-compatible servers, both as an HTTP body
/// and inside SSE frames.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ApiErrorDetail {
    pub fn describe(&self) -> String {
        match (&self.message, &self.kind) {
            (Some(message), _) => message.clone(),
            (None, Some(kind)) => kind.clone(),
            (None, None) => "Unknown error".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    inspector_config: Option<InspectorConfig>,
}

impl HttpClient {
    pub fn new(
        config: &HttpClientConfig,
        inspector_config: Option<InspectorConfig>,
    ) -> Result<Self, LlmError> {
        let default_ua = format!("openai-compat/{}", env!("CARGO_PKG_VERSION"));
        let ua = config.user_agent.as_deref().unwrap_or(&default_ua);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(ua)
            .build()
            .map_err(|e| {
                LlmError::ProviderConfiguration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self {
            client,
            inspector_config,
        })
    }

    /// POST a JSON body and deserialize the JSON reply.
    #[tracing::instrument(
        name = "http_post_json",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub async fn post_json<Req, Res>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<Res, LlmError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let res = self.send(url, headers, body).await?;

        let response_text = res.text().await.map_err(|e| LlmError::Network {
            message: "Failed to read response body".to_string(),
            source: Box::new(e),
        })?;

        let response_value: Value =
            serde_json::from_str(&response_text).map_err(|e| LlmError::Parse {
                message: "Failed to parse response as JSON".to_string(),
                source: Box::new(e),
            })?;

        if let Some(inspector) = self
            .inspector_config
            .as_ref()
            .and_then(|config| config.response_inspector.as_ref())
        {
            inspector(&response_value);
        }

        serde_json::from_value(response_value).map_err(|e| LlmError::Parse {
            message: "Failed to parse API response".to_string(),
            source: Box::new(e),
        })
    }

    /// POST a JSON body and hand back the successful response unread, for
    /// callers that consume the body incrementally.
    #[tracing::instrument(
        name = "http_post_stream",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub async fn post_stream<Req>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<reqwest::Response, LlmError>
    where
        Req: Serialize,
    {
        self.send(url, headers, body).await
    }

    async fn send<Req>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<reqwest::Response, LlmError>
    where
        Req: Serialize,
    {
        let body_value = serde_json::to_value(body).map_err(|e| LlmError::Parse {
            message: "Failed to serialize request".to_string(),
            source: Box::new(e),
        })?;

        if let Some(inspector) = self
            .inspector_config
            .as_ref()
            .and_then(|config| config.request_inspector.as_ref())
        {
            inspector(&body_value);
        }

        let mut req_builder = self.client.post(url).json(&body_value);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }

        let res = req_builder.send().await.map_err(|e| LlmError::Network {
            message: "Request failed".to_string(),
            source: Box::new(e),
        })?;

        let status = res.status();
        if status.is_success() {
            debug!(status = %status, "HTTP request successful");
            return Ok(res);
        }

        warn!(status = %status, "API returned error status");
        Err(error_from_response(res).await)
    }
}

async fn error_from_response(res: reqwest::Response) -> LlmError {
    let status = res.status();
    let retry_after = parse_retry_after(res.headers(), SystemTime::now());
    let error_text = res
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = serde_json::from_str::<ApiErrorBody>(&error_text)
        .map(|body| body.error.describe())
        .unwrap_or(error_text);

    LlmError::Api {
        message: format!("{status}: {message}"),
        status_code: Some(status.as_u16()),
        retry_after,
        source: None,
    }
}

const RETRY_AFTER_HEADERS: [&str; 3] = ["retry-after", "x-ratelimit-reset", "ratelimit-reset"];

/// Read the server's back-off hint.
///
/// Values beyond the current unix time in milliseconds are reset timestamps
/// in milliseconds, values beyond it in seconds are reset timestamps in
/// seconds, anything else is a delay in seconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let raw = RETRY_AFTER_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())?;
    let value: u64 = raw.trim().parse().ok()?;

    let now = now.duration_since(UNIX_EPOCH).ok()?;
    let now_secs = now.as_secs();
    let now_millis = u64::try_from(now.as_millis()).ok()?;

    if value > now_secs.saturating_mul(1000) {
        Some(Duration::from_millis(value.saturating_sub(now_millis)))
    } else if value > now_secs {
        Some(Duration::from_secs(value - now_secs))
    } else {
        Some(Duration::from_secs(value))
    }
}
