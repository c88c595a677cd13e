//! Weighted-ratio string similarity on a 0-100 scale.
//!
//! Built on `strsim::normalized_levenshtein`, combining a full ratio, a
//! token-sort ratio and (for strings of very different length) a sliding
//! partial ratio. Scores are deterministic for equal inputs; matching
//! quality beyond that is explicitly heuristic.

use anyhow::{Result, bail};
use strsim::normalized_levenshtein;

/// Plain similarity ratio, 0.0-100.0
fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Ratio over whitespace tokens sorted lexicographically, so word order
/// does not penalize the score
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best ratio of `shorter` against every equal-length character window of
/// `longer`
fn partial_ratio(shorter: &str, longer: &str) -> f64 {
    let window = shorter.chars().count();
    let longer_chars: Vec<char> = longer.chars().collect();
    if window == 0 || window >= longer_chars.len() {
        return ratio(shorter, longer);
    }

    let mut best: f64 = 0.0;
    for start in 0..=(longer_chars.len() - window) {
        let slice: String = longer_chars[start..start + window].iter().collect();
        best = best.max(ratio(shorter, &slice));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Weighted-ratio score, 0.0-100.0.
///
/// Full ratio and token-sort ratio (weighted 0.95) always compete; when one
/// string is more than 1.5x the length of the other, a partial ratio
/// weighted 0.9 competes too, which keeps short establishment names
/// findable inside long statement titles.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut best = ratio(a, b).max(0.95 * token_sort_ratio(a, b));

    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let (shorter, longer) = if len_a <= len_b { (a, b) } else { (b, a) };
    let len_ratio = longer.chars().count() as f64 / shorter.chars().count() as f64;
    if len_ratio > 1.5 {
        best = best.max(0.9 * partial_ratio(shorter, longer));
    }
    best
}

/// Integer score used for threshold comparisons
pub fn score(a: &str, b: &str) -> u8 {
    weighted_ratio(a, b).round().clamp(0.0, 100.0) as u8
}

/// Best candidate at or above `cutoff`, or `None` when nothing clears it.
///
/// The cutoff is a hard filter: a below-threshold candidate is never
/// returned, no matter how it ranks. Ties keep the first-seen candidate.
/// Errors only on a non-finite similarity value.
pub fn extract_one<'a>(
    query: &str,
    candidates: &'a [String],
    cutoff: u8,
) -> Result<Option<(&'a str, u8)>> {
    let mut best: Option<(&'a str, u8)> = None;
    for candidate in candidates {
        let raw = weighted_ratio(query, candidate);
        if !raw.is_finite() {
            bail!("non-finite similarity score between {query:?} and {candidate:?}");
        }
        let scored = raw.round().clamp(0.0, 100.0) as u8;
        if scored < cutoff {
            continue;
        }
        if best.is_none_or(|(_, s)| scored > s) {
            best = Some((candidate.as_str(), scored));
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_100() {
        assert_eq!(score("padaria estrela", "padaria estrela"), 100);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(score("", ""), 100);
        assert_eq!(score("", "padaria"), 0);
        assert_eq!(score("padaria", ""), 0);
    }

    #[test]
    fn test_token_order_insensitive() {
        let direct = weighted_ratio("estrela padaria", "padaria estrela");
        assert!(direct >= 94.0, "token sort should rescue reordering: {direct}");
    }

    #[test]
    fn test_partial_match_on_long_title() {
        let s = weighted_ratio("ifood", "pagamento recebido ifood restaurante ltda");
        assert!(s >= 85.0, "short name inside long title scored {s}");
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(score("farmacia pague menos", "uber trip") < 50);
    }

    #[test]
    fn test_extract_one_prefers_best() {
        let candidates = vec![
            "padaria estrela".to_string(),
            "padaria estrella ltda".to_string(),
            "posto shell".to_string(),
        ];
        let found = extract_one("padaria estrela", &candidates, 90).unwrap();
        assert_eq!(found, Some(("padaria estrela", 100)));
    }

    #[test]
    fn test_extract_one_cutoff_is_hard_filter() {
        let candidates = vec!["posto shell".to_string()];
        let found = extract_one("padaria estrela", &candidates, 95).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_threshold_boundary() {
        let candidates = vec!["padaria estrella".to_string()];
        let exact = score("padaria estrela", "padaria estrella");
        assert!(exact < 100 && exact > 0);

        // at threshold: accepted
        let hit = extract_one("padaria estrela", &candidates, exact).unwrap();
        assert_eq!(hit.map(|(_, s)| s), Some(exact));

        // one point above the candidate's score: rejected
        let miss = extract_one("padaria estrela", &candidates, exact + 1).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_extract_one_empty_candidates() {
        assert_eq!(extract_one("algo", &[], 95).unwrap(), None);
    }
}
