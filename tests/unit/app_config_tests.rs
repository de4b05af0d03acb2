/*!
 * Tests for configuration defaults, parsing and validation
 */

use polytrans::app_config::{BackendKind, Config, DetectorKind, MAX_DELAY_SECS, TranslatorType};
use polytrans::text::ThresholdProfile;
use std::str::FromStr;

#[test]
fn test_default_shouldUseDocumentedValues() {
    let config = Config::default();
    assert_eq!(config.target_language, "en");
    assert_eq!(config.translation.translator_type, TranslatorType::Hybrid);
    assert_eq!(config.translation.primary.provider, BackendKind::Ollama);
    assert_eq!(config.translation.secondary.provider, BackendKind::Anthropic);
    assert_eq!(config.batch.chunk_size, 4500);
    assert_eq!(config.batch.fields_to_translate, vec!["response".to_string()]);
    assert_eq!(config.fallback.micro_chunk_chars, 100);
    assert_eq!(config.segmenter.max_run_chars, 4000);
    assert_eq!(config.journal_path, "translation_log.txt");
}

#[test]
fn test_default_withHybridAndNoApiKey_shouldStillValidate() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "target_language": "fr",
        "batch": { "fields_to_translate": ["prompt", "response"] },
        "classifier": { "profile": "conservative", "word_ratio": 0.3 }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.batch.chunk_size, 4500);
    assert_eq!(config.classifier.profile, ThresholdProfile::Conservative);
    assert_eq!(config.classifier.detector, DetectorKind::Whatlang);

    let thresholds = config.classifier.thresholds();
    assert_eq!(thresholds.word_ratio, 0.3);
    assert_eq!(thresholds.min_words, 5);
    assert_eq!(thresholds.non_target_script_ratio, 0.2);
}

#[test]
fn test_serialize_thenDeserialize_shouldKeepSettings() {
    let mut config = Config::default();
    config.translation.common.delay_secs = 0.25;
    config.fallback.sensitive_terms = vec!["secret".to_string()];

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.translation.common.delay_secs, 0.25);
    assert_eq!(parsed.fallback.sensitive_terms, vec!["secret".to_string()]);
}

#[test]
fn test_validate_withZeroChunkSize_shouldFail() {
    let mut config = Config::default();
    config.batch.chunk_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withNegativeOrNanDelay_shouldFail() {
    let mut config = Config::default();
    config.translation.common.delay_secs = -1.0;
    assert!(config.validate().is_err());

    config.translation.common.delay_secs = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withEmptyFieldList_shouldFail() {
    let mut config = Config::default();
    config.batch.fields_to_translate.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withUnknownLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "zz".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withSecondaryOnlyAndNoApiKey_shouldFail() {
    let mut config = Config::default();
    config.translation.translator_type = TranslatorType::Secondary;
    assert!(config.validate().is_err());

    config.translation.secondary.api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withRatioOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.classifier.short_text_ratio = Some(1.5);
    assert!(config.validate().is_err());
}

#[test]
fn test_uniqueFields_shouldDropDuplicatesKeepingOrder() {
    let mut config = Config::default();
    config.batch.fields_to_translate = vec!["b".into(), "a".into(), "b".into()];
    assert_eq!(config.batch.unique_fields(), vec!["b".to_string(), "a".to_string()]);
}

#[test]
fn test_delay_shouldConvertFractionalSeconds() {
    let mut config = Config::default();
    config.translation.common.delay_secs = 0.5;
    assert_eq!(config.delay(), std::time::Duration::from_millis(500));
    config.translation.common.delay_secs = 0.0;
    assert!(config.delay().is_zero());
}

#[test]
fn test_translatorType_fromStr_shouldAcceptComboAlias() {
    assert_eq!(TranslatorType::from_str("combo").unwrap(), TranslatorType::Hybrid);
    assert_eq!(TranslatorType::from_str("primary").unwrap(), TranslatorType::Primary);
    assert!(TranslatorType::from_str("tertiary").is_err());
}

#[test]
fn test_validate_withHugeDelay_shouldFailInsteadOfPanicking() {
    let mut config = Config::default();
    config.translation.common.delay_secs = 1e20;
    assert!(config.validate().is_err());

    // delay() stays total even for configs that skipped validation
    assert_eq!(config.delay(), std::time::Duration::from_secs_f64(MAX_DELAY_SECS));

    config.translation.common.delay_secs = MAX_DELAY_SECS;
    assert!(config.validate().is_ok());
}

#[test]
fn test_warnings_withEnglishTarget_shouldBeEmpty() {
    assert!(Config::default().warnings().is_empty());
}

#[test]
fn test_warnings_withFrenchTargetAndNoCommonWords_shouldWarn() {
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    let warnings = config.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("classifier.common_words"));

    config.classifier.common_words = Some(vec!["le".to_string(), "la".to_string(), "et".to_string()]);
    assert!(config.warnings().is_empty());
}

#[test]
fn test_warnings_withLanguageUnknownToDetector_shouldWarn() {
    let mut config = Config::default();
    // Basque is a valid ISO code that whatlang does not detect
    config.target_language = "eu".to_string();
    config.classifier.common_words = Some(vec!["eta".to_string()]);
    let warnings = config.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("detector does not know 'eu'"));

    config.classifier.detector = DetectorKind::Heuristic;
    assert!(config.warnings().is_empty());
}
