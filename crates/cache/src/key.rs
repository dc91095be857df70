/// Composite key for the embeddings namespace: `sha256(normalized_bytes) ||
/// model_id || model_version` (spec §3 Cache Entry (embedding namespace)).
pub fn embedding_key(hash_hex: &str, model_id: &str, model_version: &str) -> String {
    format!("{hash_hex}:{model_id}:{model_version}")
}

/// Composite key for the heuristics namespace: `sha256(normalized_bytes) ||
/// detector_version`.
pub fn heuristic_key(hash_hex: &str, detector_version: &str) -> String {
    format!("{hash_hex}:{detector_version}")
}
