/// A token with its byte offsets into the original (raw) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split `content` on whitespace, retaining byte offsets. Punctuation stays
/// attached to tokens; span offsets are computed against this same raw
/// content, never the canonical form.
pub fn tokenize(content: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut last_idx = 0;
    for (idx, ch) in content.char_indices() {
        last_idx = idx + ch.len_utf8();
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token { text: &content[s..idx], start: s, end: idx });
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push(Token { text: &content[s..last_idx], start: s, end: last_idx });
    }
    tokens
}

/// Shannon entropy (base 2) of the token-frequency distribution.
pub fn token_entropy(tokens: &[Token<'_>]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for t in tokens {
        *counts.entry(t.text).or_insert(0) += 1;
    }
    let n = tokens.len() as f64;
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Fraction of tokens that are duplicates of an earlier token (spec class 10:
/// extreme repetition).
pub fn duplicate_ratio(tokens: &[Token<'_>]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let mut duplicates = 0usize;
    for t in tokens {
        if !seen.insert(t.text) {
            duplicates += 1;
        }
    }
    duplicates as f64 / tokens.len() as f64
}
