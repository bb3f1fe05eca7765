//! HTTP transport shared by every provider endpoint.

use crate::config::Config;
use crate::openai::types::{EmbeddingResponse, OpenAiError};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Upper bound on a single provider round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Lightweight authenticated client for the provider REST API.
#[derive(Clone)]
pub struct OpenAiClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl OpenAiClient {
    /// Construct a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        Self::with_request_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Like [`OpenAiClient::new`], aborting any request that takes longer than `timeout`.
    pub fn with_request_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OpenAiError> {
        let client = Client::builder()
            .user_agent("ai-relay/0.1")
            .timeout(timeout)
            .build()?;
        let base_url = normalize_base_url(base_url).map_err(OpenAiError::InvalidUrl)?;
        tracing::debug!(url = %base_url, ?timeout, "Initialized provider HTTP client");
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, OpenAiError> {
        Self::new(&config.openai_base_url, config.openai_api_key.clone())
    }

    /// Request one embedding per input text, returned in input order.
    pub async fn create_embeddings(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, OpenAiError> {
        let body = json!({ "model": model, "input": texts });
        let response: EmbeddingResponse = self
            .send_json(self.request(Method::POST, "embeddings").json(&body))
            .await?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(OpenAiError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|datum| datum.index);
        Ok(data.into_iter().map(|datum| datum.embedding).collect())
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Send a request and decode a successful JSON body.
    pub(crate) async fn send_json<T>(&self, request: RequestBuilder) -> Result<T, OpenAiError>
    where
        T: DeserializeOwned,
    {
        let response = ensure_success(request.send().await?).await?;
        response.json().await.map_err(OpenAiError::from)
    }
}

async fn ensure_success(response: Response) -> Result<Response, OpenAiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = OpenAiError::UnexpectedStatus { status, body };
    tracing::error!(error = %error, "Provider request failed");
    Err(error)
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
