use serde::{Deserialize, Serialize};

/// The result of normalizing a document.
///
/// `raw` is preserved verbatim (modulo UTF-8 replacement-character
/// substitution for invalid byte sequences) so that span offsets reported by
/// downstream detectors always index into the content the caller actually
/// sent. `canonical` is the NFKD/ASCII-folded/lowercased/whitespace-collapsed
/// form used only for hashing and detection, never for span offsets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedForm {
    pub raw: String,
    pub canonical: String,
    pub hash_hex: String,
    pub version: u32,
    /// True if the raw input contained invalid UTF-8 byte sequences that were
    /// replaced with U+FFFD.
    pub invalid_utf8_replaced: bool,
}

impl NormalizedForm {
    pub fn hash_bytes(&self) -> Vec<u8> {
        hex::decode(&self.hash_hex).unwrap_or_default()
    }
}
