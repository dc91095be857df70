use embedding::EmbeddingResult;
use heuristic::{merge_and_sort_spans, SignalResult};

use crate::config::FusionConfig;
use crate::types::FusionResult;

/// Minimum confidence the fusion step may ever report (spec §4.D): a
/// missing-signal result must never appear more confident than random.
const CONFIDENCE_FLOOR: f64 = 0.5;

struct WeightedSignal {
    score: f64,
    weight: f64,
    available: bool,
}

/// Combine the heuristic, embedding, and Unicode signals into a single risk
/// decision (spec §4.D). `embedding` is treated as unavailable when its
/// reasons contain `"embedding_unavailable"`, in which case its weight is
/// dropped and the remaining weights are renormalized.
pub fn fuse(
    heuristic_result: &SignalResult,
    embedding_result: &EmbeddingResult,
    unicode_result: &SignalResult,
    cfg: &FusionConfig,
) -> FusionResult {
    let embedding_available = !embedding_result
        .reasons
        .iter()
        .any(|r| r == "embedding_unavailable");

    let mut signals = vec![
        WeightedSignal { score: heuristic_result.score, weight: cfg.w_h, available: true },
        WeightedSignal {
            score: embedding_result.score,
            weight: cfg.w_e,
            available: embedding_available,
        },
    ];
    if cfg.w_u > 0.0 {
        signals.push(WeightedSignal { score: unicode_result.score, weight: cfg.w_u, available: true });
    }

    let available_weight_sum: f64 = signals.iter().filter(|s| s.available).map(|s| s.weight).sum();
    let risk_raw = if available_weight_sum > 0.0 {
        signals
            .iter()
            .filter(|s| s.available)
            .map(|s| s.score * (s.weight / available_weight_sum))
            .sum::<f64>()
    } else {
        0.0
    };

    let risk = (risk_raw * 100.0).round().clamp(0.0, 100.0) as u8;
    let quarantine = risk >= cfg.quarantine_threshold;
    let action = if quarantine { "quarantine" } else { "allow" }.to_string();

    let available_scores: Vec<f64> = signals.iter().filter(|s| s.available).map(|s| s.score).collect();
    let confidence = compute_confidence(&available_scores);

    let mut reasons = Vec::new();
    for reason in heuristic_result
        .reasons
        .iter()
        .chain(embedding_result.reasons.iter())
        .chain(unicode_result.reasons.iter())
    {
        if !reasons.contains(reason) {
            reasons.push(reason.clone());
        }
    }

    let mut spans = heuristic_result.spans.clone();
    spans.extend(unicode_result.spans.clone());
    let spans = merge_and_sort_spans(spans);

    FusionResult { risk, quarantine, action, confidence, reasons, spans }
}

/// `confidence = clamp(0.5, 1.0, 1.0 − min(1.0, 2·variance))`, or
/// `0.5 + 0.4·score` when only one signal is available (spec §4.D).
fn compute_confidence(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return CONFIDENCE_FLOOR;
    }
    if scores.len() == 1 {
        return (CONFIDENCE_FLOOR + 0.4 * scores[0]).clamp(CONFIDENCE_FLOOR, 1.0);
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    (1.0 - (2.0 * variance).min(1.0)).clamp(CONFIDENCE_FLOOR, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn signal(score: f64) -> SignalResult {
        SignalResult {
            score,
            reasons: Vec::new(),
            spans: Vec::new(),
            features: BTreeMap::new(),
            detector_version: "test",
        }
    }

    fn embed(score: f64, reasons: Vec<String>) -> EmbeddingResult {
        EmbeddingResult { score, reasons, model_id: "test", model_version: "test" }
    }

    #[test]
    fn default_weights_combine_heuristic_and_embedding_only() {
        let cfg = FusionConfig::default();
        let result = fuse(&signal(0.8), &embed(0.2, vec![]), &signal(0.0), &cfg);
        assert_eq!(result.risk, ((0.8 * 0.4 + 0.2 * 0.6) * 100.0).round() as u8);
    }

    #[test]
    fn quarantine_threshold_respected() {
        let cfg = FusionConfig::default();
        let high = fuse(&signal(0.95), &embed(0.95, vec![]), &signal(0.0), &cfg);
        assert!(high.quarantine);
        assert_eq!(high.action, "quarantine");

        let low = fuse(&signal(0.05), &embed(0.05, vec![]), &signal(0.0), &cfg);
        assert!(!low.quarantine);
        assert_eq!(low.action, "allow");
    }

    #[test]
    fn embedding_unavailable_renormalizes_to_heuristic_only() {
        let cfg = FusionConfig::default();
        let result = fuse(
            &signal(0.5),
            &embed(0.0, vec!["embedding_unavailable".to_string()]),
            &signal(0.0),
            &cfg,
        );
        assert_eq!(result.risk, 50);
        assert!(result.reasons.contains(&"embedding_unavailable".to_string()));
    }

    #[test]
    fn confidence_floor_is_respected() {
        let cfg = FusionConfig::default();
        let result = fuse(
            &signal(0.5),
            &embed(0.0, vec!["embedding_unavailable".to_string()]),
            &signal(0.0),
            &cfg,
        );
        assert!(result.confidence >= 0.5);
    }

    #[test]
    fn agreeing_signals_yield_higher_confidence_than_disagreeing() {
        let cfg = FusionConfig::default();
        let agree = fuse(&signal(0.9), &embed(0.9, vec![]), &signal(0.0), &cfg);
        let disagree = fuse(&signal(0.9), &embed(0.1, vec![]), &signal(0.0), &cfg);
        assert!(agree.confidence >= disagree.confidence);
    }

    #[test]
    fn reasons_are_deduplicated_preserving_first_occurrence() {
        let cfg = FusionConfig::default();
        let mut h = signal(0.5);
        h.reasons = vec!["dup".to_string(), "only_in_heuristic".to_string()];
        let mut e = embed(0.5, vec!["dup".to_string()]);
        e.reasons.push("only_in_embedding".to_string());
        let result = fuse(&h, &e, &signal(0.0), &cfg);
        assert_eq!(
            result.reasons,
            vec![
                "dup".to_string(),
                "only_in_heuristic".to_string(),
                "only_in_embedding".to_string()
            ]
        );
    }
}
