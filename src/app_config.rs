use anyhow::{Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::text::{ClassifierThresholds, ThresholdProfile};

/// Application configuration module
/// This module handles loading, validating and defaulting the settings of a
/// translation run. Every section has serde defaults so a partial `conf.json`
/// is always accepted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language code (ISO 639-1 or 639-2)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Backend selection and call settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Language classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Segmenter settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Fallback cascade settings
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Path of the per-run journal file
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
}

/// Which backends a run uses
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorType {
    /// Only the primary backend
    Primary,
    /// Only the secondary backend
    Secondary,
    /// Primary backend with the secondary as alternate
    #[default]
    Hybrid,
}

impl std::fmt::Display for TranslatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Hybrid => "hybrid",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for TranslatorType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "hybrid" | "combo" => Ok(Self::Hybrid),
            _ => Err(anyhow!("Invalid translator type: {}", s)),
        }
    }
}

/// Translation backend kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: Anthropic
    Anthropic,
}

impl BackendKind {
    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Settings of one backend slot
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Backend kind
    #[serde(default)]
    pub provider: BackendKind,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param kind: Backend kind
    // @returns: Provider config with defaults
    pub fn new(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Ollama => Self {
                provider: kind,
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            BackendKind::Anthropic => Self {
                provider: kind,
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }

    /// Model, falling back to the kind's default when unset
    pub fn model_or_default(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        match self.provider {
            BackendKind::Ollama => default_ollama_model(),
            BackendKind::Anthropic => default_anthropic_model(),
        }
    }

    /// Endpoint, falling back to the kind's default when unset
    pub fn endpoint_or_default(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        match self.provider {
            BackendKind::Ollama => default_ollama_endpoint(),
            BackendKind::Anthropic => default_anthropic_endpoint(),
        }
    }

    fn validate(&self, slot: &str) -> Result<()> {
        url::Url::parse(&self.endpoint_or_default())
            .map_err(|e| anyhow!("Invalid endpoint for {} backend: {}", slot, e))?;
        if self.provider == BackendKind::Anthropic && self.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required for Anthropic {} backend", slot));
        }
        Ok(())
    }
}

/// Translation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Which backend slots are used
    #[serde(default)]
    pub translator_type: TranslatorType,

    /// Primary backend
    #[serde(default = "default_primary")]
    pub primary: ProviderConfig,

    /// Secondary backend, also the alternate in hybrid mode
    #[serde(default = "default_secondary")]
    pub secondary: ProviderConfig,

    /// Settings shared by all backends
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            translator_type: TranslatorType::default(),
            primary: default_primary(),
            secondary: default_secondary(),
            common: TranslationCommonConfig::default(),
        }
    }
}

/// Common translation settings applicable to all backends
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholder: {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Pause after every backend call, in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    /// Retry count for failed HTTP requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Keep successful translations in memory for the duration of the run
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            delay_secs: default_delay_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            cache_enabled: true,
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum characters per backend request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Record fields to translate, in order
    #[serde(default = "default_fields")]
    pub fields_to_translate: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            fields_to_translate: default_fields(),
        }
    }
}

impl BatchConfig {
    /// Configured fields with duplicates removed, first occurrence wins
    pub fn unique_fields(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.fields_to_translate
            .iter()
            .filter(|f| seen.insert(f.as_str()))
            .cloned()
            .collect()
    }
}

/// Statistical detector used by the classifier
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// `whatlang`, falling back to heuristics on low confidence
    #[default]
    Whatlang,
    /// Heuristics only
    Heuristic,
}

/// Language classifier configuration
///
/// `profile` picks a preset; any field set here overrides that preset.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub detector: DetectorKind,

    #[serde(default)]
    pub profile: ThresholdProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_text_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_words: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_target_script_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_words: Option<Vec<String>>,
}

impl ClassifierConfig {
    /// Effective thresholds: the profile preset with overrides applied
    pub fn thresholds(&self) -> ClassifierThresholds {
        let mut t = ClassifierThresholds::for_profile(self.profile);
        if let Some(v) = self.min_length {
            t.min_length = v;
        }
        if let Some(v) = self.short_text_ratio {
            t.short_text_ratio = v;
        }
        if let Some(v) = self.min_words {
            t.min_words = v;
        }
        if let Some(v) = self.word_ratio {
            t.word_ratio = v;
        }
        if let Some(v) = self.non_target_script_ratio {
            t.non_target_script_ratio = v;
        }
        if let Some(words) = &self.common_words {
            t.common_words = words.clone();
        }
        t
    }
}

/// Segmenter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmenterConfig {
    #[serde(default = "default_single_run_below")]
    pub single_run_below: usize,

    #[serde(default = "default_max_run_chars")]
    pub max_run_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            single_run_below: default_single_run_below(),
            max_run_chars: default_max_run_chars(),
        }
    }
}

/// Fallback cascade configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Upper bound for micro-chunk size, in characters
    #[serde(default = "default_micro_chunk_chars")]
    pub micro_chunk_chars: usize,

    /// Terms masked before the last backend attempt
    #[serde(default = "default_sensitive_terms")]
    pub sensitive_terms: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            micro_chunk_chars: default_micro_chunk_chars(),
            sensitive_terms: default_sensitive_terms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_journal_path() -> String {
    "translation_log.txt".to_string()
}

fn default_primary() -> ProviderConfig {
    ProviderConfig::new(BackendKind::Ollama)
}

fn default_secondary() -> ProviderConfig {
    ProviderConfig::new(BackendKind::Anthropic)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_delay_secs() -> f64 {
    2.0
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    4500
}

fn default_fields() -> Vec<String> {
    vec!["response".to_string()]
}

fn default_single_run_below() -> usize {
    100
}

fn default_max_run_chars() -> usize {
    4000
}

fn default_micro_chunk_chars() -> usize {
    100
}

pub fn default_sensitive_terms() -> Vec<String> {
    [
        "bomb", "explosive", "weapon", "poison", "kill", "attack", "terrorist", "suicide", "hack",
        "virus", "illegal", "drug", "murder", "torture", "violence", "molest", "harm", "theft",
        "steal", "dangerous", "harmful", "death", "deadly",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the user's text into {target_language}. \
     Reply with the translation only. Preserve formatting, line breaks and tone."
        .to_string()
}

/// Longest accepted pause after a backend call, in seconds
pub const MAX_DELAY_SECS: f64 = 86_400.0;

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.target_language)?;

        if self.batch.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be greater than zero"));
        }
        if self.batch.unique_fields().is_empty() {
            return Err(anyhow!("fields_to_translate must name at least one field"));
        }

        let delay = self.translation.common.delay_secs;
        if !delay.is_finite() || delay < 0.0 {
            return Err(anyhow!("delay must be a non-negative number of seconds, got {}", delay));
        }
        if delay > MAX_DELAY_SECS {
            return Err(anyhow!("delay must not exceed {} seconds, got {}", MAX_DELAY_SECS, delay));
        }

        if self.fallback.micro_chunk_chars == 0 {
            return Err(anyhow!("micro_chunk_chars must be greater than zero"));
        }

        let t = self.classifier.thresholds();
        for (name, value) in [
            ("short_text_ratio", t.short_text_ratio),
            ("word_ratio", t.word_ratio),
            ("non_target_script_ratio", t.non_target_script_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be between 0 and 1, got {}", name, value));
            }
        }

        match self.translation.translator_type {
            TranslatorType::Primary => self.translation.primary.validate("primary")?,
            TranslatorType::Secondary => self.translation.secondary.validate("secondary")?,
            // Hybrid survives one unusable slot; the factory reports what it skipped
            TranslatorType::Hybrid => {
                let primary = self.translation.primary.validate("primary");
                let secondary = self.translation.secondary.validate("secondary");
                if let (Err(e), Err(_)) = (primary, secondary) {
                    return Err(e);
                }
            }
        }

        for warning in self.warnings() {
            warn!("{}", warning);
        }
        Ok(())
    }

    /// Settings that are valid but will likely classify text poorly
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let target = &self.target_language;

        if self.classifier.detector == DetectorKind::Whatlang
            && crate::language_utils::to_detector_language(target).is_none()
        {
            warnings.push(format!(
                "The language detector does not know '{}'; only the heuristics will classify text",
                target
            ));
        }

        if !crate::language_utils::language_codes_match(target, "en") && self.classifier.common_words.is_none() {
            warnings.push(format!(
                "Target language '{}' uses the built-in English common-word list and ASCII script check; \
                 set classifier.common_words for better results",
                target
            ));
        }

        warnings
    }

    /// Delay after each backend call
    pub fn delay(&self) -> std::time::Duration {
        let secs = self.translation.common.delay_secs;
        if secs.is_finite() && secs > 0.0 {
            std::time::Duration::try_from_secs_f64(secs.min(MAX_DELAY_SECS)).unwrap_or_default()
        } else {
            std::time::Duration::ZERO
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            classifier: ClassifierConfig::default(),
            segmenter: SegmenterConfig::default(),
            fallback: FallbackConfig::default(),
            log_level: LogLevel::default(),
            journal_path: default_journal_path(),
        }
    }
}
