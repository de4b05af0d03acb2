/*!
 * Translation backends.
 *
 * A backend turns a piece of text into its translation, or fails with a
 * `ProviderError`. The pipeline never talks to a concrete client directly:
 * it holds `Arc<dyn TranslationBackend>` values built once per run by
 * `BackendSet::from_config`.
 *
 * - `ollama`: local Ollama server
 * - `anthropic`: Anthropic messages API
 * - `mock`: scripted backend for tests and dry runs
 */

use async_trait::async_trait;
use log::{error, info, warn};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{BackendKind, ProviderConfig, TranslationConfig, TranslatorType};
use crate::errors::{AppError, ProviderError};
use crate::language_utils;

pub mod anthropic;
pub mod mock;
pub mod ollama;

/// Common trait for all translation backends
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Translate `text` into the run's target language
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Settings shared by every HTTP backend of a run
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Rendered system prompt
    pub system_prompt: String,
    pub temperature: f32,
    pub retry_count: u32,
    pub retry_backoff_ms: u64,
}

impl BackendSettings {
    pub fn from_config(config: &TranslationConfig, target_language: &str) -> Self {
        let language_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());
        Self {
            system_prompt: config
                .common
                .system_prompt
                .replace("{target_language}", &language_name),
            temperature: config.common.temperature,
            retry_count: config.common.retry_count,
            retry_backoff_ms: config.common.retry_backoff_ms,
        }
    }
}

/// Backends used by one run
#[derive(Debug, Clone)]
pub struct BackendSet {
    /// Backend used for direct, micro-chunk and masked attempts
    pub main: Arc<dyn TranslationBackend>,
    /// Backend tried once when the main backend fails
    pub alternate: Option<Arc<dyn TranslationBackend>>,
}

impl BackendSet {
    pub fn new(main: Arc<dyn TranslationBackend>) -> Self {
        Self {
            main,
            alternate: None,
        }
    }

    pub fn with_alternate(mut self, alternate: Arc<dyn TranslationBackend>) -> Self {
        self.alternate = Some(alternate);
        self
    }

    /// Build the backends named by `translator_type`.
    ///
    /// In hybrid mode the primary backend is built first. If it cannot be
    /// built the secondary backend becomes the main one and there is no
    /// alternate. Failing to build any backend is fatal.
    pub fn from_config(config: &TranslationConfig, target_language: &str) -> Result<Self, AppError> {
        let settings = BackendSettings::from_config(config, target_language);

        match config.translator_type {
            TranslatorType::Primary => build_backend(&config.primary, &settings)
                .map(Self::new)
                .map_err(|e| init_failure("primary", e)),
            TranslatorType::Secondary => build_backend(&config.secondary, &settings)
                .map(Self::new)
                .map_err(|e| init_failure("secondary", e)),
            TranslatorType::Hybrid => {
                let primary = build_backend(&config.primary, &settings);
                let secondary = build_backend(&config.secondary, &settings);
                match (primary, secondary) {
                    (Ok(main), Ok(alternate)) => {
                        info!("Using {} with {} as alternate", main.name(), alternate.name());
                        Ok(Self::new(main).with_alternate(alternate))
                    }
                    (Ok(main), Err(e)) => {
                        warn!("Secondary backend unavailable, continuing without alternate: {}", e);
                        Ok(Self::new(main))
                    }
                    (Err(e), Ok(main)) => {
                        warn!("Primary backend unavailable, using secondary instead: {}", e);
                        Ok(Self::new(main))
                    }
                    (Err(primary_err), Err(secondary_err)) => {
                        error!("Primary backend failed to initialize: {}", primary_err);
                        Err(AppError::BackendInitFailure(format!(
                            "no translation backend could be created (primary: {}; secondary: {})",
                            primary_err, secondary_err
                        )))
                    }
                }
            }
        }
    }
}

fn init_failure(slot: &str, e: ProviderError) -> AppError {
    AppError::BackendInitFailure(format!("{} backend: {}", slot, e))
}

/// Construct one backend from its slot configuration
pub fn build_backend(
    config: &ProviderConfig,
    settings: &BackendSettings,
) -> Result<Arc<dyn TranslationBackend>, ProviderError> {
    match config.provider {
        BackendKind::Ollama => Ok(Arc::new(ollama::Ollama::from_config(config, settings)?)),
        BackendKind::Anthropic => Ok(Arc::new(anthropic::Anthropic::from_config(config, settings)?)),
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. The wait before retry `n` is
/// `backoff_base_ms * 2^(n-1)`.
pub(crate) async fn with_retries<T, F, Fut>(
    label: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!("{} request failed: {} - attempt {}/{}", label, e, attempt, max_retries + 1);
                let backoff_ms = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Map an HTTP failure status to the matching error variant
pub(crate) fn status_error(status: reqwest::StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        code => ProviderError::ApiError {
            status_code: code,
            message,
        },
    }
}

/// Map a transport failure to the matching error variant
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_connect() || e.is_timeout() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}
