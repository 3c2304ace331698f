//! Fuzz target for the response adapter feeding the ranking engine.
//!
//! Arbitrary bytes are read as a raw vector-store response (or, failing that,
//! a plain hit array) and ranked under both strategies. Parsing may fail;
//! ranking must not panic, and every emitted score must be finite and
//! ordered.

#![no_main]

use libfuzzer_sys::fuzz_target;
use savant_core::{RankingConfig, SentenceHit, StrategyKind};
use savant_rank::RankingEngine;
use savant_rank::weaviate::parse_response;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    let hits = match parse_response(body, None) {
        Ok(parsed) => parsed.hits,
        Err(_) => match serde_json::from_str::<Vec<SentenceHit>>(body) {
            Ok(hits) => hits,
            Err(_) => return,
        },
    };

    for (strategy, precision) in [(StrategyKind::Threshold, 0.5), (StrategyKind::Relative, 2.0)] {
        let engine = RankingEngine::new(&RankingConfig::with_strategy(strategy, precision))
            .expect("finite precision");

        let first = engine.rank(&hits);
        let second = engine.rank(&hits);
        assert_eq!(first, second, "ranking is not deterministic");

        for expert in &first {
            assert!(expert.score.is_finite() && expert.score > 0.0);
        }
        for pair in first.windows(2) {
            assert!(pair[0].score >= pair[1].score, "experts out of order");
        }
    }
});
