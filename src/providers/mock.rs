/*!
 * Mock backend implementations for testing.
 *
 * `MockProvider` simulates the failure modes the fallback cascade has to
 * survive:
 * - `MockProvider::working()` - always succeeds with `[TRANSLATED] <text>`
 * - `MockProvider::intermittent(n)` - every n-th call fails
 * - `MockProvider::failing()` - always fails
 * - `MockProvider::empty()` - answers with an empty string
 * - `with_rejected_terms(..)` - content filter refusing texts with given words
 *
 * Clones share their call counter and call log.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::TranslationBackend;

/// Custom response generator
pub type ResponseFn = Arc<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
    rejected_terms: Vec<String>,
    custom_response: Option<ResponseFn>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("behavior", &self.behavior)
            .field("requests", &self.request_count())
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            rejected_terms: Vec::new(),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Refuse any text containing one of `terms` (case-insensitive)
    pub fn with_rejected_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected_terms = terms.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    /// Set a custom response generator used by `Working` and `Intermittent`
    pub fn with_custom_response<F>(mut self, generator: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        self.custom_response = Some(Arc::new(generator));
        self
    }

    /// Number of `translate` calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn respond(&self, text: &str) -> Result<String, ProviderError> {
        match &self.custom_response {
            Some(generator) => generator(text),
            None => Ok(format!("[TRANSLATED] {}", text)),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(text.to_string());

        let lowered = text.to_lowercase();
        if let Some(term) = self.rejected_terms.iter().find(|t| lowered.contains(t.as_str())) {
            return Err(ProviderError::ApiError {
                status_code: 400,
                message: format!("content rejected: '{}'", term),
            });
        }

        match self.behavior {
            MockBehavior::Working => self.respond(text),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.respond(text)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock is down".to_string())),
            _ => Ok(()),
        }
    }
}
