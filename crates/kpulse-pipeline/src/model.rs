//! HTTP client for an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::ports::{ModelClient, ModelRequest};
use crate::PipelineError;

pub struct HttpModelClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

impl HttpModelClient {
    /// # Errors
    ///
    /// Returns [`PipelineError::Model`] if the HTTP client cannot be built.
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Model(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, request: &ModelRequest) -> Result<String, PipelineError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut builder = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PipelineError::Model(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Model(format!(
                "model returned status {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Model(format!("response parse error: {e}")))?;

        response_text(&payload)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Model("unrecognized response shape".to_string()))
    }
}

/// Text of a completion in any of the shapes hosted endpoints return:
/// `choices[0].message.content`, `result.response`, `response`, or a bare string.
fn response_text(payload: &Value) -> Option<&str> {
    payload
        .pointer("/choices/0/message/content")
        .or_else(|| payload.pointer("/result/response"))
        .or_else(|| payload.get("response"))
        .unwrap_or(payload)
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_chat_completion_shape() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(response_text(&payload), Some("hi"));
    }

    #[test]
    fn reads_workers_ai_shapes() {
        assert_eq!(
            response_text(&json!({"result": {"response": "a"}, "success": true})),
            Some("a")
        );
        assert_eq!(response_text(&json!({"response": "b"})), Some("b"));
        assert_eq!(response_text(&json!("c")), Some("c"));
    }

    #[test]
    fn unknown_shape_yields_none() {
        assert_eq!(response_text(&json!({"output": 1})), None);
    }
}
