/*!
 * Layered fallback around translation backends.
 *
 * `FallbackOrchestrator::translate` never fails. It walks an ordered list of
 * strategies and returns the first usable translation; when every strategy
 * fails the input is returned unchanged. A pause follows every backend call,
 * successful or not.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

use crate::errors::ProviderError;
use crate::providers::{BackendSet, TranslationBackend};
use crate::translation::cache::TranslationCache;
use crate::translation::masking::{PlaceholderMismatch, TermMasker};

static MICRO_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+|\s+").unwrap_or_else(|e| panic!("invalid token regex: {}", e)));

/// One step of the fallback cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Main backend, whole text
    Direct,
    /// Alternate backend, whole text
    Alternate,
    /// Main backend, small whitespace-bounded pieces
    MicroChunks,
    /// Main backend, sensitive terms replaced by placeholders
    Masking,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::Alternate,
        Strategy::MicroChunks,
        Strategy::Masking,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Alternate => "alternate",
            Self::MicroChunks => "micro-chunks",
            Self::Masking => "masking",
        }
    }
}

/// Result of one cascade run
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    pub text: String,
    /// Strategy that produced `text`; `None` when the input came back unchanged
    pub strategy: Option<Strategy>,
    /// Served from the cache without a backend call
    pub cached: bool,
}

impl FallbackOutcome {
    fn passthrough(text: &str) -> Self {
        Self {
            text: text.to_string(),
            strategy: None,
            cached: false,
        }
    }

    pub fn is_translated(&self) -> bool {
        self.strategy.is_some()
    }
}

#[derive(Error, Debug)]
enum StrategyError {
    #[error("not configured")]
    NotConfigured,

    #[error(transparent)]
    Backend(#[from] ProviderError),

    #[error("no piece could be translated")]
    NothingTranslated,

    #[error("no sensitive terms present")]
    NothingToMask,

    #[error("restoring masked terms failed: {0}")]
    Restore(#[from] PlaceholderMismatch),
}

/// Wraps backends with ordered retry and degradation strategies
#[derive(Debug)]
pub struct FallbackOrchestrator {
    backends: BackendSet,
    strategies: Vec<Strategy>,
    delay: Duration,
    micro_chunk_chars: usize,
    masker: TermMasker,
    cache: TranslationCache,
    target_language: String,
}

impl FallbackOrchestrator {
    pub fn new(backends: BackendSet, target_language: impl Into<String>) -> Self {
        Self {
            backends,
            strategies: Strategy::DEFAULT_ORDER.to_vec(),
            delay: Duration::ZERO,
            micro_chunk_chars: 100,
            masker: TermMasker::new(&crate::app_config::default_sensitive_terms()),
            cache: TranslationCache::new(false),
            target_language: target_language.into(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_micro_chunk_chars(mut self, chars: usize) -> Self {
        self.micro_chunk_chars = chars.max(1);
        self
    }

    pub fn with_sensitive_terms<S: AsRef<str>>(mut self, terms: &[S]) -> Self {
        self.masker = TermMasker::new(terms);
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    /// Translate `text`, falling back to the input itself
    pub async fn translate(&self, text: &str) -> String {
        self.translate_with_outcome(text).await.text
    }

    pub async fn translate_with_outcome(&self, text: &str) -> FallbackOutcome {
        if text.trim().is_empty() {
            return FallbackOutcome::passthrough(text);
        }

        if let Some(hit) = self.cache.get(text, &self.target_language) {
            return FallbackOutcome {
                text: hit,
                strategy: Some(Strategy::Direct),
                cached: true,
            };
        }

        for (position, strategy) in self.strategies.iter().enumerate() {
            match self.attempt(*strategy, text).await {
                Ok(translated) => {
                    if position > 0 {
                        info!("Recovered translation with {} strategy", strategy.label());
                    }
                    self.cache.store(text, &self.target_language, &translated);
                    return FallbackOutcome {
                        text: translated,
                        strategy: Some(*strategy),
                        cached: false,
                    };
                }
                Err(StrategyError::NotConfigured) => {
                    debug!("Skipping {} strategy: not configured", strategy.label());
                }
                Err(e) => warn!("{} translation failed: {}", strategy.label(), e),
            }
        }

        warn!(
            "All translation strategies failed, keeping original text ({} chars)",
            text.chars().count()
        );
        FallbackOutcome::passthrough(text)
    }

    async fn attempt(&self, strategy: Strategy, text: &str) -> Result<String, StrategyError> {
        match strategy {
            Strategy::Direct => self.call(self.backends.main.as_ref(), text, self.delay).await,
            Strategy::Alternate => match &self.backends.alternate {
                Some(alternate) => self.call(alternate.as_ref(), text, self.delay).await,
                None => Err(StrategyError::NotConfigured),
            },
            Strategy::MicroChunks => self.translate_micro_chunks(text).await,
            Strategy::Masking => self.translate_masked(text).await,
        }
    }

    /// One backend call followed by the pause; blank answers count as failures
    async fn call(
        &self,
        backend: &dyn TranslationBackend,
        text: &str,
        pause: Duration,
    ) -> Result<String, StrategyError> {
        let result = backend.translate(text).await;
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        match result {
            Ok(translated) if translated.trim().is_empty() => {
                Err(StrategyError::Backend(ProviderError::EmptyResponse))
            }
            Ok(translated) => Ok(translated),
            Err(e) => Err(StrategyError::Backend(e)),
        }
    }

    async fn translate_micro_chunks(&self, text: &str) -> Result<String, StrategyError> {
        let pieces = micro_chunks(text, self.micro_chunk_chars);
        let half_delay = self.delay / 2;
        let mut out = String::with_capacity(text.len());
        let mut translated_any = false;

        for piece in pieces {
            let (lead, core, trail) = split_padding(piece);
            if core.is_empty() {
                out.push_str(piece);
                continue;
            }
            match self.call(self.backends.main.as_ref(), core, half_delay).await {
                Ok(translated) => {
                    translated_any = true;
                    out.push_str(lead);
                    out.push_str(translated.trim());
                    out.push_str(trail);
                }
                Err(e) => {
                    debug!("Micro-chunk kept untranslated: {}", e);
                    out.push_str(piece);
                }
            }
        }

        if translated_any {
            Ok(out)
        } else {
            Err(StrategyError::NothingTranslated)
        }
    }

    async fn translate_masked(&self, text: &str) -> Result<String, StrategyError> {
        let masked = self.masker.mask(text);
        if !masked.is_masked() {
            return Err(StrategyError::NothingToMask);
        }
        debug!("Masked {} sensitive term occurrence(s)", masked.masked_count());

        let translated = self
            .call(self.backends.main.as_ref(), &masked.text, self.delay)
            .await?;
        self.masker
            .restore(&masked, &translated)
            .map_err(StrategyError::Restore)
    }
}

/// Split `text` into whitespace-bounded pieces of at most `max_chars`
/// characters; a single token longer than that stays whole.
pub fn micro_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut end = 0;
    let mut len = 0;

    for token in MICRO_TOKENS.find_iter(text) {
        let token_chars = token.as_str().chars().count();
        if len > 0 && len + token_chars > max_chars {
            pieces.push(&text[start..end]);
            start = token.start();
            len = 0;
        }
        end = token.end();
        len += token_chars;
    }

    if end > start {
        pieces.push(&text[start..end]);
    }
    pieces
}

/// (leading whitespace, content, trailing whitespace)
pub fn split_padding(text: &str) -> (&str, &str, &str) {
    let core_start = text.len() - text.trim_start().len();
    let core_end = text.trim_end().len().max(core_start);
    (&text[..core_start], &text[core_start..core_end], &text[core_end..])
}
