/// Pins raw isolation-forest anomaly scores to the calibrated [0,1] risk
/// scale using three percentile anchors computed once against the seed
/// corpus (spec §4.C): the 50th percentile of benign scores maps to 0.2, the
/// 95th to 0.7, the 99th to 0.95. Piecewise-linear interpolation outside
/// those anchors, clamped to [0,1].
pub struct Calibration {
    anchors: [(f64, f64); 3],
}

impl Calibration {
    /// `benign_scores` must be the raw anomaly scores of the same seed
    /// corpus the forest was fit on, already sorted ascending.
    pub fn fit(benign_scores: &[f64]) -> Self {
        let p50 = percentile(benign_scores, 0.50);
        let p95 = percentile(benign_scores, 0.95);
        let p99 = percentile(benign_scores, 0.99);
        Calibration {
            anchors: [(p50, 0.2), (p95, 0.7), (p99, 0.95)],
        }
    }

    pub fn map(&self, raw: f64) -> f64 {
        let (x0, y0) = self.anchors[0];
        let (x1, y1) = self.anchors[1];
        let (x2, y2) = self.anchors[2];

        let mapped = if raw <= x0 {
            if (x0 - 0.0).abs() < f64::EPSILON {
                y0
            } else {
                interpolate(0.0, 0.0, x0, y0, raw)
            }
        } else if raw <= x1 {
            interpolate(x0, y0, x1, y1, raw)
        } else if raw <= x2 {
            interpolate(x1, y1, x2, y2, raw)
        } else {
            interpolate(x2, y2, 1.0, 1.0, raw)
        };
        mapped.clamp(0.0, 1.0)
    }
}

fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < f64::EPSILON {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_map_exactly() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let cal = Calibration::fit(&scores);
        assert!((cal.map(cal.anchors[0].0) - 0.2).abs() < 1e-9);
        assert!((cal.map(cal.anchors[1].0) - 0.7).abs() < 1e-9);
        assert!((cal.map(cal.anchors[2].0) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn output_always_clamped() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let cal = Calibration::fit(&scores);
        assert!(cal.map(-5.0) >= 0.0);
        assert!(cal.map(5.0) <= 1.0);
    }

    #[test]
    fn monotonic_increasing() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let cal = Calibration::fit(&scores);
        let mut prev = cal.map(0.0);
        for i in 1..=20 {
            let cur = cal.map(i as f64 / 20.0);
            assert!(cur >= prev - 1e-9);
            prev = cur;
        }
    }
}
