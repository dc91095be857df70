use fxhash::hash64;

/// Canonical embedding width (spec §4.C design default `d=384`).
pub const EMBEDDING_DIM: usize = 384;

/// Deterministic stub embedding: a 64-bit hash of the canonical text seeds a
/// sine wave per dimension. Bitwise-identical across runs for identical
/// input, matching the determinism contract in spec §4.C. Adapted from the
/// teacher's `semantic::stub::make_stub_embedding`, generalized to always run
/// in this mode (SentinelDF has no remote/ONNX tier) and always L2-normalized.
pub fn make_stub_embedding(canonical: &str) -> Vec<f32> {
    let h = hash64(canonical.as_bytes());
    let mut v = vec![0f32; EMBEDDING_DIM];
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    l2_normalize_in_place(&mut v);
    v
}

pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let a = make_stub_embedding("same text");
        let b = make_stub_embedding("same text");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = make_stub_embedding("hello");
        let b = make_stub_embedding("world");
        assert_ne!(a, b);
    }

    #[test]
    fn has_expected_dimension() {
        let v = make_stub_embedding("anything");
        assert_eq!(v.len(), EMBEDDING_DIM);
    }

    #[test]
    fn is_l2_normalized() {
        let v = make_stub_embedding("normalize me please");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
