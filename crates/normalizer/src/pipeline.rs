use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;
use crate::document::NormalizedForm;
use crate::error::NormalizerError;
use crate::hash::hash_canonical_bytes;

/// Normalize raw bytes into a [`NormalizedForm`].
///
/// Invalid UTF-8 is replaced with U+FFFD rather than rejected (spec §4.A
/// failure semantics); the substitution is recorded on the returned form so
/// callers can surface it as a detector feature.
pub fn normalize_bytes(
    content: &[u8],
    cfg: &NormalizerConfig,
) -> Result<NormalizedForm, NormalizerError> {
    cfg.validate()?;

    let (raw, invalid_utf8_replaced) = match std::str::from_utf8(content) {
        Ok(s) => (s.to_string(), false),
        Err(_) => (String::from_utf8_lossy(content).into_owned(), true),
    };

    normalize_str(raw, invalid_utf8_replaced, cfg)
}

/// Normalize an already-decoded string. Convenience wrapper for callers that
/// never see raw bytes (e.g. JSON request bodies, already UTF-8 by
/// construction).
pub fn normalize(content: &str, cfg: &NormalizerConfig) -> Result<NormalizedForm, NormalizerError> {
    cfg.validate()?;
    normalize_str(content.to_string(), false, cfg)
}

fn normalize_str(
    raw: String,
    invalid_utf8_replaced: bool,
    cfg: &NormalizerConfig,
) -> Result<NormalizedForm, NormalizerError> {
    // NFKD decomposition, then drop combining marks to fold accented forms
    // onto their ASCII-equivalent base character, then lowercase, then
    // collapse whitespace runs to a single space. Only the canonical form is
    // mutated this way; `raw` is untouched beyond UTF-8 replacement above.
    let decomposed: String = raw.nfkd().collect();
    let folded: String = decomposed
        .chars()
        .filter(|c| !c.is_mark_nonspacing())
        .collect();
    let lowered = folded.to_lowercase();
    let canonical = collapse_whitespace(&lowered);

    if canonical.trim().is_empty() {
        return Err(NormalizerError::EmptyAfterNormalization);
    }

    let hash_hex = hash_canonical_bytes(cfg.version, &canonical);

    Ok(NormalizedForm {
        raw,
        canonical,
        hash_hex,
        version: cfg.version,
        invalid_utf8_replaced,
    })
}

/// Collapse runs of Unicode whitespace to a single ASCII space, trimming the
/// result. Operates only on the canonical-form side; the raw document is
/// never touched by this function.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace && !out.is_empty() {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let cfg = NormalizerConfig::default();
        let form = normalize("  The Patient's ECG  is Normal ", &cfg).unwrap();
        assert_eq!(form.canonical, "the patients ecg is normal");
        assert_eq!(form.raw, "  The Patient's ECG  is Normal ");
    }

    #[test]
    fn nfkd_accent_folding_is_deterministic() {
        let cfg = NormalizerConfig::default();
        let composed = normalize("Caf\u{00E9}", &cfg).unwrap();
        let decomposed = normalize("Cafe\u{0301}", &cfg).unwrap();
        assert_eq!(composed.canonical, decomposed.canonical);
        assert_eq!(composed.hash_hex, decomposed.hash_hex);
        assert_eq!(composed.canonical, "cafe");
    }

    #[test]
    fn raw_content_preserved_verbatim_for_span_offsets() {
        let cfg = NormalizerConfig::default();
        let form = normalize("Ignore ALL Instructions", &cfg).unwrap();
        assert_eq!(form.raw, "Ignore ALL Instructions");
        assert_ne!(form.raw, form.canonical);
    }

    #[test]
    fn empty_after_normalization_rejected() {
        let cfg = NormalizerConfig::default();
        let err = normalize("   \u{00A0}  ", &cfg).unwrap_err();
        assert_eq!(err, NormalizerError::EmptyAfterNormalization);
    }

    #[test]
    fn invalid_config_version_rejected() {
        let cfg = NormalizerConfig { version: 0 };
        let err = normalize("hello", &cfg).unwrap_err();
        assert_eq!(err, NormalizerError::InvalidConfig);
    }

    #[test]
    fn invalid_utf8_is_replaced_and_flagged() {
        let cfg = NormalizerConfig::default();
        let bytes = [b'h', b'i', 0xff, 0xfe, b'!'];
        let form = normalize_bytes(&bytes, &cfg).unwrap();
        assert!(form.invalid_utf8_replaced);
        assert!(form.raw.contains('\u{FFFD}'));
    }

    #[test]
    fn hash_includes_version() {
        let text = "some text";
        let h1 = hash_canonical_bytes(1, text);
        let h2 = hash_canonical_bytes(2, text);
        assert_ne!(h1, h2);
    }

    #[test]
    fn whitespace_collapsed_only_in_canonical_form() {
        let cfg = NormalizerConfig::default();
        let form = normalize("a   b\tc\nd", &cfg).unwrap();
        assert_eq!(form.canonical, "a b c d");
        assert_eq!(form.raw, "a   b\tc\nd");
    }
}
