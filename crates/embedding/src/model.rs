use once_cell::sync::OnceLock;

use crate::calibration::Calibration;
use crate::forest::IsolationForest;
use crate::seed_corpus::SEED_CORPUS;
use crate::vector::make_stub_embedding;

const NUM_TREES: usize = 100;
const SAMPLE_SIZE: usize = 32;
const FOREST_SEED: u64 = 0xC0FFEE;

struct Model {
    forest: IsolationForest,
    calibration: Calibration,
}

static MODEL: OnceLock<Model> = OnceLock::new();

fn model() -> &'static Model {
    MODEL.get_or_init(|| {
        let corpus: Vec<Vec<f32>> = SEED_CORPUS.iter().map(|s| make_stub_embedding(s)).collect();
        let forest = IsolationForest::fit(&corpus, NUM_TREES, SAMPLE_SIZE, FOREST_SEED);
        let mut benign_scores: Vec<f64> = corpus.iter().map(|v| forest.anomaly_score(v)).collect();
        benign_scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let calibration = Calibration::fit(&benign_scores);
        Model { forest, calibration }
    })
}

/// Raw anomaly score in [0,1], fit-once against the bundled seed corpus.
pub fn raw_anomaly_score(vector: &[f32]) -> f64 {
    model().forest.anomaly_score(vector)
}

/// Calibrated anomaly score, pinned to the spec's (0.2, 0.7, 0.95) anchors.
pub fn calibrated_score(vector: &[f32]) -> f64 {
    let raw = raw_anomaly_score(vector);
    model().calibration.map(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_corpus_texts_score_low_on_average() {
        let scores: Vec<f64> = SEED_CORPUS
            .iter()
            .map(|s| calibrated_score(&make_stub_embedding(s)))
            .collect();
        let mean: f64 = scores.iter().sum::<f64>() / scores.len() as f64;
        assert!(mean < 0.6, "seed corpus mean calibrated score was {mean}");
    }
}
