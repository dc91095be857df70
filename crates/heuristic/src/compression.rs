use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

/// Minimum input size (spec class 15) before the compression-bomb feature is
/// even evaluated; short texts compress poorly regardless of structure.
const MIN_SIZE_FOR_CHECK: usize = 200;

/// Ratio threshold below which a text is flagged as anomalously compressible.
const COMPRESSION_BOMB_RATIO: f64 = 0.10;

/// Deflate `content` and return `compressed_size / original_size`, or `None`
/// if the content is too short to evaluate (spec class 15).
pub fn compression_ratio(content: &[u8]) -> Option<f64> {
    if content.len() < MIN_SIZE_FOR_CHECK {
        return None;
    }
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).ok()?;
    let compressed = encoder.finish().ok()?;
    Some(compressed.len() as f64 / content.len() as f64)
}

pub fn is_compression_bomb(content: &[u8]) -> bool {
    compression_ratio(content)
        .map(|ratio| ratio < COMPRESSION_BOMB_RATIO)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_not_checked() {
        assert_eq!(compression_ratio(b"short"), None);
    }

    #[test]
    fn highly_repetitive_text_flagged() {
        let content = "a".repeat(2000);
        assert!(is_compression_bomb(content.as_bytes()));
    }

    #[test]
    fn natural_language_not_flagged() {
        let content = "The quick brown fox jumps over the lazy dog near the riverbank while birds sing in the early morning light, scattering leaves across the quiet path.".repeat(2);
        assert!(!is_compression_bomb(content.as_bytes()));
    }
}
