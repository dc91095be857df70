use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::compression::is_compression_bomb;
use crate::deobfuscate::{deobfuscate, Deobfuscated};
use crate::tables::*;
use crate::tokenize::{duplicate_ratio, tokenize, token_entropy, Token};
use crate::types::{merge_and_sort_spans, FeatureValue, Severity, SignalResult, Span};
use crate::unicode;
use crate::DETECTOR_VERSION;

/// `\[[A-Z0-9_ ]{3,60}\]` — class 4 bracketed-garbage detector.
static BRACKETED_GARBAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Z0-9_ ]{3,60}\]").expect("static regex"));

/// HTML comments, numeric/named entities, `<script>` tags, and inline
/// event-handler attributes (class 7: structural hiding).
static STRUCTURAL_HIDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<!--.*?-->|&#\w+;|<script[^>]*>|on\w+\s*=\s*[\x22'])").expect("static regex")
});

/// Markdown fenced code blocks (class 11).
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*\n(.*?)```").expect("static regex"));

struct Contribution {
    amount: f64,
    reason: String,
    span: Option<Span>,
}

/// Run the heuristic detector (spec §4.B) over raw content. Classes 1, 2, 3,
/// 8, and 12 match against a de-obfuscated form (`crate::deobfuscate`) so
/// zero-width/homoglyph/fullwidth tricks can't hide a phrase from the table,
/// but every span is mapped back and reported against byte offsets of
/// `content` itself, never the de-obfuscated or canonical form. Never fails:
/// empty content returns a zero-score result with no reasons or spans.
pub fn detect(content: &str) -> SignalResult {
    if content.is_empty() {
        return SignalResult {
            score: 0.0,
            reasons: Vec::new(),
            spans: Vec::new(),
            features: BTreeMap::new(),
            detector_version: DETECTOR_VERSION,
        };
    }

    let lower = content.to_lowercase();
    let tokens = tokenize(content);
    let deob = deobfuscate(content);

    let mut contributions: Vec<Contribution> = Vec::new();
    let mut features: BTreeMap<String, FeatureValue> = BTreeMap::new();

    let class1_hits = class1_high_severity_phrases(&deob, &mut contributions);
    class2_cooccurrence_pairs(content, &tokens, &mut contributions);
    let class3_hit = class3_backdoor_markers(&deob, &mut contributions);
    class4_bracketed_garbage(content, &mut contributions);
    class5_topic_shift(&lower, &mut contributions);
    class6_allcaps_imperative_burst(content, &tokens, &mut contributions);
    class7_structural_hiding(content, &mut contributions);
    class8_secret_exfiltration(&deob, &tokens, &mut contributions);
    let class9_hit = class9_rare_token_injection(&tokens, &mut contributions);
    let class10_hit = class10_extreme_repetition(&tokens, &mut contributions, &mut features);
    class11_fenced_blocks(content, &mut contributions);
    class12_leetspeak_variants(&deob, &mut contributions);
    class13_entropy_outliers(&tokens, &mut contributions, &mut features);

    let unicode_signal = unicode::analyze(content);
    for (k, v) in &unicode_signal.features {
        features.insert(k.clone(), v.clone());
    }
    if unicode_signal.score > 0.0 {
        contributions.push(Contribution {
            amount: unicode_signal.score,
            reason: "unicode_anomaly".to_string(),
            span: unicode_signal.spans.first().cloned(),
        });
    }

    let is_bomb = is_compression_bomb(content.as_bytes());
    features.insert("compression_bomb".to_string(), FeatureValue::Bool(is_bomb));
    if is_bomb {
        contributions.push(Contribution {
            amount: 0.5,
            reason: "compression_bomb".to_string(),
            span: None,
        });
    }

    let raw_score: f64 = contributions.iter().map(|c| c.amount).sum();
    let mut score = 1.0 - (-raw_score).exp();

    if class1_hits >= 3 {
        score = (score + 0.10).min(1.0);
    }
    if class1_hits >= 2 {
        score = (score + 0.15).min(1.0);
    }
    if class3_hit && (class9_hit || class10_hit) {
        score = (score + 0.05).min(1.0);
    }

    let mut ranked: Vec<&Contribution> = contributions.iter().collect();
    ranked.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal));
    let mut reasons = Vec::new();
    for c in ranked.iter().take(12) {
        if !reasons.contains(&c.reason) {
            reasons.push(c.reason.clone());
        }
    }

    let spans: Vec<Span> = contributions.into_iter().filter_map(|c| c.span).collect();
    let spans = merge_and_sort_spans(spans);

    SignalResult {
        score,
        reasons,
        spans,
        features,
        detector_version: DETECTOR_VERSION,
    }
}

fn class1_high_severity_phrases(deob: &Deobfuscated, contributions: &mut Vec<Contribution>) -> usize {
    let mut hits = 0;
    for phrase in HIGH_SEVERITY_PHRASES {
        let mut search_from = 0;
        while let Some(pos) = deob.text[search_from..].find(phrase) {
            let start = search_from + pos;
            let end = start + phrase.len();
            hits += 1;
            let (raw_start, raw_end) = deob.raw_range(start, end);
            contributions.push(Contribution {
                amount: 1.5,
                reason: format!("high_severity_phrase:{phrase}"),
                span: Some(Span {
                    start: raw_start,
                    end: raw_end,
                    severity: Severity::High,
                    reason: "high_severity_phrase".to_string(),
                }),
            });
            search_from = end;
        }
    }
    hits
}

fn class2_cooccurrence_pairs(
    content: &str,
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
) {
    for (a, b) in COOCCURRENCE_PAIRS {
        let a_idxs: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| deobfuscate(t.text).text.contains(a))
            .map(|(i, _)| i)
            .collect();
        let b_idxs: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| deobfuscate(t.text).text.contains(b))
            .map(|(i, _)| i)
            .collect();
        'outer: for &ai in &a_idxs {
            for &bi in &b_idxs {
                if ai != bi && ai.abs_diff(bi) <= 6 {
                    let reason = format!("cooccurrence:{a}+{b}");
                    contributions.push(Contribution {
                        amount: 0.05,
                        reason: reason.clone(),
                        span: Some(span_for_token(content, &tokens[ai], &reason)),
                    });
                    contributions.push(Contribution {
                        amount: 0.0,
                        reason: reason.clone(),
                        span: Some(span_for_token(content, &tokens[bi], &reason)),
                    });
                    break 'outer;
                }
            }
        }
    }
}

fn span_for_token(content: &str, token: &Token<'_>, reason: &str) -> Span {
    let _ = content;
    Span {
        start: token.start,
        end: token.end,
        severity: Severity::Medium,
        reason: reason.to_string(),
    }
}

fn class3_backdoor_markers(deob: &Deobfuscated, contributions: &mut Vec<Contribution>) -> bool {
    let mut hit = false;
    for marker in BACKDOOR_MARKERS {
        if let Some(pos) = deob.text.find(marker) {
            hit = true;
            let (raw_start, raw_end) = deob.raw_range(pos, pos + marker.len());
            contributions.push(Contribution {
                amount: 0.9,
                reason: "backdoor_marker".to_string(),
                span: Some(Span {
                    start: raw_start,
                    end: raw_end,
                    severity: Severity::High,
                    reason: "backdoor_marker".to_string(),
                }),
            });
        }
    }
    hit
}

fn class4_bracketed_garbage(content: &str, contributions: &mut Vec<Contribution>) {
    let mut count = 0;
    for m in BRACKETED_GARBAGE.find_iter(content) {
        let matched = m.as_str();
        if BRACKET_ALLOWLIST_PREFIXES
            .iter()
            .any(|prefix| matched.trim_start_matches('[').starts_with(prefix))
        {
            continue;
        }
        count += 1;
        let amount = (0.4 + 0.1 * (count as f64 - 1.0)).min(0.9);
        contributions.push(Contribution {
            amount,
            reason: "bracketed_garbage".to_string(),
            span: Some(Span {
                start: m.start(),
                end: m.end(),
                severity: Severity::Medium,
                reason: "bracketed_garbage".to_string(),
            }),
        });
    }
}

fn class5_topic_shift(lower: &str, contributions: &mut Vec<Contribution>) {
    let clinical_hits = CLINICAL_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
    let consumer_hits = CONSUMER_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
    if clinical_hits >= TOPIC_SHIFT_MIN_HITS && consumer_hits >= TOPIC_SHIFT_MIN_HITS {
        contributions.push(Contribution {
            amount: 0.7,
            reason: "topic_shift".to_string(),
            span: None,
        });
    }
}

fn class6_allcaps_imperative_burst(
    content: &str,
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
) {
    let prefix: Vec<&Token<'_>> = tokens.iter().take(5).collect();
    let mut burst_start = None;
    let mut consecutive = 0;
    let mut burst_end = 0;
    for t in &prefix {
        if is_all_caps_word(t.text) {
            if burst_start.is_none() {
                burst_start = Some(t.start);
            }
            consecutive += 1;
            burst_end = t.end;
        } else {
            consecutive = 0;
            burst_start = None;
        }
        if consecutive >= 3 {
            break;
        }
    }
    let lower = content.to_lowercase();
    let has_safety_keyword = SAFETY_KEYWORDS.iter().any(|k| lower.contains(k));
    if consecutive >= 3 && has_safety_keyword {
        if let Some(start) = burst_start {
            contributions.push(Contribution {
                amount: 0.3,
                reason: "allcaps_imperative_burst".to_string(),
                span: Some(Span {
                    start,
                    end: burst_end,
                    severity: Severity::Medium,
                    reason: "allcaps_imperative_burst".to_string(),
                }),
            });
        }
    }
}

fn is_all_caps_word(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
}

fn class7_structural_hiding(content: &str, contributions: &mut Vec<Contribution>) {
    for m in STRUCTURAL_HIDING.find_iter(content) {
        contributions.push(Contribution {
            amount: 0.5,
            reason: "structural_hiding".to_string(),
            span: Some(Span {
                start: m.start(),
                end: m.end(),
                severity: Severity::High,
                reason: "structural_hiding".to_string(),
            }),
        });
    }
}

fn class8_secret_exfiltration(
    deob: &Deobfuscated,
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
) {
    let verb_idxs: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| SECRET_VERBS.iter().any(|v| deobfuscate(t.text).text == *v))
        .map(|(i, _)| i)
        .collect();
    if verb_idxs.is_empty() {
        return;
    }
    for noun in SECRET_NOUNS {
        if let Some(noun_pos) = deob.text.find(noun) {
            let (raw_start, raw_end) = deob.raw_range(noun_pos, noun_pos + noun.len());
            let noun_token_idx = tokens
                .iter()
                .position(|t| t.start <= raw_start && raw_start < t.end)
                .unwrap_or(0);
            if verb_idxs.iter().any(|&vi| vi.abs_diff(noun_token_idx) <= 8) {
                contributions.push(Contribution {
                    amount: 0.8,
                    reason: "secret_exfiltration".to_string(),
                    span: Some(Span {
                        start: raw_start,
                        end: raw_end,
                        severity: Severity::High,
                        reason: "secret_exfiltration".to_string(),
                    }),
                });
            }
        }
    }
}

fn class9_rare_token_injection(
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
) -> bool {
    let mut count = 0;
    for t in tokens {
        if count >= 3 {
            break;
        }
        if t.text.chars().count() < 15 {
            continue;
        }
        let total = t.text.chars().count() as f64;
        let anomalous = t
            .text
            .chars()
            .filter(|c| !c.is_alphabetic() || c.is_uppercase())
            .count() as f64;
        if anomalous / total > 0.60 {
            count += 1;
            contributions.push(Contribution {
                amount: 0.6,
                reason: "rare_token_injection".to_string(),
                span: Some(Span {
                    start: t.start,
                    end: t.end,
                    severity: Severity::Medium,
                    reason: "rare_token_injection".to_string(),
                }),
            });
        }
    }
    count > 0
}

fn class10_extreme_repetition(
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
    features: &mut BTreeMap<String, FeatureValue>,
) -> bool {
    let ratio = duplicate_ratio(tokens);
    features.insert("duplicate_token_ratio".to_string(), FeatureValue::Float(ratio));
    let hit = ratio >= 0.70;
    if hit {
        contributions.push(Contribution {
            amount: 0.8,
            reason: "extreme_repetition".to_string(),
            span: None,
        });
    }
    hit
}

fn class11_fenced_blocks(content: &str, contributions: &mut Vec<Contribution>) {
    let mut count = 0;
    for cap in FENCED_BLOCK.captures_iter(content) {
        if count >= 2 {
            break;
        }
        let Some(m) = cap.get(0) else { continue };
        let body = cap.get(1).map(|g| g.as_str().to_lowercase()).unwrap_or_default();
        if body.contains("system") || body.contains("prompt") {
            count += 1;
            contributions.push(Contribution {
                amount: 0.7,
                reason: "fenced_block_system_prompt".to_string(),
                span: Some(Span {
                    start: m.start(),
                    end: m.end(),
                    severity: Severity::Medium,
                    reason: "fenced_block_system_prompt".to_string(),
                }),
            });
        }
    }
}

fn class12_leetspeak_variants(deob: &Deobfuscated, contributions: &mut Vec<Contribution>) {
    let delisted: String = deob
        .text
        .chars()
        .map(|c| {
            LEETSPEAK_SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect();
    for phrase in HIGH_SEVERITY_PHRASES {
        if delisted.contains(phrase) && !deob.text.contains(phrase) {
            contributions.push(Contribution {
                amount: 0.4,
                reason: format!("leetspeak_variant:{phrase}"),
                span: None,
            });
        }
    }
}

fn class13_entropy_outliers(
    tokens: &[Token<'_>],
    contributions: &mut Vec<Contribution>,
    features: &mut BTreeMap<String, FeatureValue>,
) {
    let entropy = token_entropy(tokens);
    features.insert("token_entropy".to_string(), FeatureValue::Float(entropy));
    if !(2.5..=6.5).contains(&entropy) && !tokens.is_empty() {
        contributions.push(Contribution {
            amount: 0.15,
            reason: "entropy_outlier".to_string(),
            span: None,
        });
    }
}
