//! Chat completion seam used for classification and candidate summaries.

use crate::openai::client::OpenAiClient;
use crate::openai::types::{ChatCompletionResponse, OpenAiError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

/// Strict structured output: the completion must validate against `schema`.
///
/// Strict mode requires every property to be listed in `required` and
/// `additionalProperties: false` on each object.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    /// Schema name reported to the provider.
    pub name: String,
    /// JSON schema document.
    pub schema: Value,
}

impl ResponseFormat {
    fn to_wire(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": { "name": self.name, "strict": true, "schema": self.schema }
        })
    }
}

/// Single-turn completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system message sent before the prompt.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Optional structured output constraint.
    pub response_format: Option<ResponseFormat>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Plain prompt for `model` with no system message or constraints.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            response_format: None,
            max_tokens: None,
        }
    }

    /// Prepend a system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Constrain the output shape.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Cap completion tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn to_wire(&self) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": self.prompt }));

        let mut body = json!({ "model": self.model, "messages": messages });
        if let Value::Object(map) = &mut body {
            if let Some(max_tokens) = self.max_tokens {
                map.insert("max_tokens".into(), Value::from(max_tokens));
            }
            if let Some(format) = &self.response_format {
                map.insert("response_format".into(), format.to_wire());
            }
        }
        body
    }
}

/// Interface implemented by chat completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Return the text content of the first completion choice.
    async fn complete(&self, request: ChatRequest) -> Result<String, OpenAiError>;
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, OpenAiError> {
        tracing::debug!(
            model = %request.model,
            structured = request.response_format.is_some(),
            "Requesting chat completion"
        );
        let response: ChatCompletionResponse = self
            .send_json(
                self.request(Method::POST, "chat/completions")
                    .json(&request.to_wire()),
            )
            .await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| OpenAiError::InvalidResponse("completion had no choices".into()))?;

        match (message.content, message.refusal) {
            (Some(content), _) => Ok(content.trim().to_string()),
            (None, Some(refusal)) => Err(OpenAiError::InvalidResponse(format!(
                "model refused: {refusal}"
            ))),
            (None, None) => Err(OpenAiError::InvalidResponse(
                "completion had no content".into(),
            )),
        }
    }
}
