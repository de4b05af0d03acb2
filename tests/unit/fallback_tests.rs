/*!
 * Tests for the fallback cascade
 */

use polytrans::errors::ProviderError;
use polytrans::providers::BackendSet;
use polytrans::translation::fallback::{FallbackOrchestrator, Strategy};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::MockProvider;

fn single(backend: MockProvider) -> FallbackOrchestrator {
    FallbackOrchestrator::new(BackendSet::new(Arc::new(backend)), "en")
}

#[tokio::test]
async fn test_translate_withAnyBackend_shouldNeverReturnEmpty() {
    let backends = vec![
        MockProvider::working(),
        MockProvider::failing(),
        MockProvider::empty(),
        MockProvider::intermittent(2),
        MockProvider::working().with_custom_response(|_| Ok("   ".to_string())),
    ];
    for backend in backends {
        let o = single(backend);
        for text in ["Bonjour", "Hola amigos, ¿qué tal?", "x"] {
            assert!(!o.translate(text).await.trim().is_empty());
        }
    }
}

#[tokio::test]
async fn test_translate_shouldTryStrategiesInOrder() {
    let main = MockProvider::failing().named("main");
    let alternate = MockProvider::failing().named("alternate");
    let set = BackendSet::new(Arc::new(main.clone())).with_alternate(Arc::new(alternate.clone()));
    let o = FallbackOrchestrator::new(set, "en").with_sensitive_terms(&["bomba"]);

    let outcome = o.translate_with_outcome("la bomba").await;
    assert_eq!(outcome.text, "la bomba");
    assert_eq!(outcome.strategy, None);

    // direct, micro-chunk ("la bomba" is one piece), masked
    assert_eq!(main.calls(), vec!["la bomba", "la bomba", "la TERM_0"]);
    assert_eq!(alternate.calls(), vec!["la bomba"]);
}

#[tokio::test]
async fn test_translate_withCustomStrategyList_shouldOnlyUseListed() {
    let backend = MockProvider::failing();
    let o = single(backend.clone()).with_strategies(vec![Strategy::Direct]);
    o.translate("Guten Morgen").await;
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_translate_shouldPauseAfterFailedCalls() {
    let o = single(MockProvider::failing())
        .with_strategies(vec![Strategy::Direct])
        .with_delay(Duration::from_millis(40));
    let start = Instant::now();
    o.translate("Guten Morgen").await;
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_translate_withMicroChunks_shouldPauseHalfDelayPerPiece() {
    let backend = MockProvider::working().with_custom_response(|t| {
        if t.len() > 5 {
            Err(ProviderError::ApiError { status_code: 400, message: "too long".into() })
        } else {
            Ok(t.to_string())
        }
    });
    let o = single(backend.clone())
        .with_strategies(vec![Strategy::MicroChunks])
        .with_micro_chunk_chars(5)
        .with_delay(Duration::from_millis(40));

    let start = Instant::now();
    let outcome = o.translate_with_outcome("uno dos tres").await;
    assert_eq!(outcome.strategy, Some(Strategy::MicroChunks));
    assert_eq!(backend.request_count(), 3);
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_translate_withMicroChunks_shouldKeepFailedPiecesAndWhitespace() {
    let backend = MockProvider::working().with_custom_response(|t| {
        if t.contains("zwei") {
            Err(ProviderError::ApiError { status_code: 400, message: "no".into() })
        } else {
            Ok(t.to_uppercase())
        }
    });
    let o = single(backend)
        .with_strategies(vec![Strategy::MicroChunks])
        .with_micro_chunk_chars(5);
    let outcome = o.translate_with_outcome("eins\n\nzwei  drei").await;
    assert_eq!(outcome.text, "EINS\n\nzwei  DREI");
}

#[tokio::test]
async fn test_translate_withMasking_shouldRestoreTermsInOriginalOrder() {
    let backend = MockProvider::working()
        .with_rejected_terms(["poison", "attack"])
        .with_custom_response(|t| {
            let mut words: Vec<&str> = t.split(' ').collect();
            words.reverse();
            Ok(words.join(" "))
        });
    let o = single(backend).with_strategies(vec![Strategy::Direct, Strategy::Masking]);

    let outcome = o.translate_with_outcome("Poison avant attack puis poison").await;
    assert_eq!(outcome.strategy, Some(Strategy::Masking));
    assert_eq!(outcome.text, "Poison puis attack avant poison");
}

#[tokio::test]
async fn test_translate_withMaskingAndLostPlaceholder_shouldReturnOriginal() {
    let backend = MockProvider::working()
        .with_rejected_terms(["poison"])
        .with_custom_response(|_| Ok("The stuff is here".to_string()));
    let o = single(backend).with_strategies(vec![Strategy::Direct, Strategy::Masking]);

    let outcome = o.translate_with_outcome("Le poison est là").await;
    assert_eq!(outcome.text, "Le poison est là");
    assert!(!outcome.is_translated());
}
