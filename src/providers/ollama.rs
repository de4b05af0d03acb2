use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::providers::{BackendSettings, TranslationBackend, status_error, transport_error, with_retries};

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for translation
    model: String,
    /// System prompt sent with every request
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a client for the given endpoint
    pub fn from_config(config: &ProviderConfig, settings: &BackendSettings) -> Result<Self, ProviderError> {
        let endpoint = config.endpoint_or_default();
        url::Url::parse(&endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("invalid Ollama endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            client,
            model: config.model_or_default(),
            system_prompt: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_retries: settings.retry_count,
            backoff_base_ms: settings.retry_backoff_ms,
        })
    }

    /// Generate text, retrying server and network errors with exponential backoff
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        with_retries("Ollama", self.max_retries, self.backoff_base_ms, || {
            self.generate_once(&url, request)
        })
        .await
    }

    async fn generate_once(&self, url: &str, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("failed to read Ollama response: {}", e)))?;
        parse_generation_body(&body)
    }

    /// Get the server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "version check failed".to_string()));
        }
        response
            .json::<VersionResponse>()
            .await
            .map(|v| v.version)
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

/// Parse a generate response body.
///
/// Servers that ignore `stream: false` answer with one JSON object per line;
/// the `response` pieces are concatenated in that case.
fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(parsed) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(parsed);
    }

    let pieces: Vec<GenerationResponse> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<GenerationResponse>(line).ok())
        .collect();

    if pieces.is_empty() {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError("unrecognized Ollama response body".to_string()));
    }

    debug!("Ollama answered with {} streamed pieces", pieces.len());
    let model = pieces[0].model.clone();
    let done = pieces.iter().any(|p| p.done);
    let response = pieces.into_iter().map(|p| p.response).collect();
    Ok(GenerationResponse { model, response, done })
}

#[async_trait]
impl TranslationBackend for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(&self.system_prompt)
            .temperature(self.temperature);
        let response = self.generate(&request).await?;
        let translated = response.response.trim();
        if translated.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(translated.to_string())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }
}
