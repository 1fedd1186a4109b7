#![allow(dead_code)]

use futures::StreamExt;
use openai_compat::{
    ApiStream, LlmError, OpenAiConfig, OpenAiHandler, RetryConfig, StreamEvent,
};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiremock::{MockServer, Request as WiremockRequest, ResponseTemplate};

pub const CHAT_PATH: &str = "/v1/chat/completions";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config_for(server: &MockServer, model_id: &str) -> OpenAiConfig {
    OpenAiConfig::new("sk-test")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_model_id(model_id)
        .with_retry_config(fast_retry())
}

pub fn handler_for(server: &MockServer, model_id: &str) -> OpenAiHandler {
    init_tracing();
    OpenAiHandler::new(config_for(server, model_id)).expect("handler")
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_retry_delay: Duration::from_millis(5),
        max_retry_delay: Duration::from_millis(20),
        retry_all_errors: false,
    }
}

/// Serve `chunks` as an SSE body terminated by `[DONE]`.
pub fn sse_response(chunks: &[Value]) -> ResponseTemplate {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");

    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

pub fn text_chunk(text: &str) -> Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": { "content": text }, "finish_reason": null }]
    })
}

pub fn reasoning_chunk(reasoning: &str) -> Value {
    serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": null, "reasoning_content": reasoning } }]
    })
}

pub fn usage_chunk(prompt_tokens: u32, completion_tokens: u32) -> Value {
    serde_json::json!({
        "choices": [],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

pub async fn collect(stream: ApiStream) -> Vec<Result<StreamEvent, LlmError>> {
    stream.collect().await
}

pub async fn collect_ok(stream: ApiStream) -> Vec<StreamEvent> {
    collect(stream)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("stream should succeed")
}

pub fn body_json(request: &WiremockRequest) -> Value {
    serde_json::from_slice(&request.body).expect("request body should be JSON")
}

pub fn text(s: &str) -> StreamEvent {
    StreamEvent::Text {
        text: s.to_string(),
    }
}

pub fn reasoning(s: &str) -> StreamEvent {
    StreamEvent::Reasoning {
        reasoning: s.to_string(),
    }
}

pub fn usage(input_tokens: u32, output_tokens: u32) -> StreamEvent {
    StreamEvent::Usage {
        input_tokens,
        output_tokens,
    }
}
