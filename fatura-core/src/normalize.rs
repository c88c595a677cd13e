//! Canonicalizes raw statement titles for comparison.
//!
//! A title like `"Lojas Renner - Parcela 3/12"` becomes `"lojas renner"`:
//! installment markers are stripped, the text is lowercased and whitespace
//! is collapsed. All category matching runs on normalized titles.

use regex::Regex;
use std::sync::LazyLock;

/// "parcela X/Y", optionally preceded by a hyphen ("- Parcela 3/12")
static PARCELA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\s*-\s*)?\bparcela\s+\d+/\d+\b").expect("valid regex"));

/// Bare "X/Y" fraction candidates; word boundaries are checked manually
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+/\d+").expect("valid regex"));

/// "HH:MM " immediately before a fraction protects it from stripping
static TIME_GUARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}\s$").expect("valid regex"));

/// "DD-MM-YYYY " / "DD/MM/YYYY " immediately before a fraction protects it
static DATE_GUARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}[-/]\d{2}[-/]\d{4}\s$").expect("valid regex"));

/// Normalize a raw transaction title for matching.
///
/// Missing input yields the empty string. The result is idempotent:
/// normalizing an already-normalized title returns it unchanged.
pub fn normalize(title: Option<&str>) -> String {
    let Some(raw) = title else {
        return String::new();
    };

    let s = PARCELA_RE.replace_all(raw, "");
    let s = strip_bare_fractions(&s);

    // Lowercase, trim, and collapse whitespace runs in one pass
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove remaining "X/Y" tokens unless preceded by a time or date pattern.
///
/// The guards replicate look-behind semantics the `regex` crate does not
/// support: a fraction right after "10:30 " or "01-02-2024 " is part of a
/// timestamp, not an installment marker.
fn strip_bare_fractions(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_end = 0;

    for m in FRACTION_RE.find_iter(s) {
        // Emulate \b on both sides of the token
        let prev = s[..m.start()].chars().next_back();
        let next = s[m.end()..].chars().next();
        let bounded = !prev.is_some_and(is_word_char) && !next.is_some_and(is_word_char);
        if !bounded {
            continue;
        }

        let prefix = &s[..m.start()];
        if TIME_GUARD_RE.is_match(prefix) || DATE_GUARD_RE.is_match(prefix) {
            continue;
        }

        out.push_str(&s[last_end..m.start()]);
        last_end = m.end();
    }
    out.push_str(&s[last_end..]);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        normalize(Some(s))
    }

    #[test]
    fn test_missing_title_is_empty() {
        assert_eq!(normalize(None), "");
    }

    #[test]
    fn test_strips_parcela_marker() {
        assert_eq!(norm("Lojas Renner - Parcela 3/12"), "lojas renner");
        assert_eq!(norm("Lojas Renner PARCELA 3/12"), "lojas renner");
        assert!(!norm("Magalu parcela 3/12 online").contains("3/12"));
        assert!(!norm("Magalu parcela 3/12 online").contains("parcela"));
    }

    #[test]
    fn test_strips_bare_fraction() {
        assert_eq!(norm("Casas Bahia 2/6"), "casas bahia");
    }

    #[test]
    fn test_time_protects_fraction() {
        // "10:30 " before the token means it is not an installment marker
        assert_eq!(norm("Pedido 10:30 1/2"), "pedido 10:30 1/2");
    }

    #[test]
    fn test_date_protects_fraction() {
        assert_eq!(norm("Recarga 01-02-2024 1/3"), "recarga 01-02-2024 1/3");
    }

    #[test]
    fn test_marker_only_title_is_empty() {
        assert_eq!(norm("Parcela 5/10"), "");
        assert_eq!(norm(" - parcela 1/2 "), "");
    }

    #[test]
    fn test_collapses_whitespace_and_lowercases() {
        assert_eq!(norm("  IFOOD   *Restaurante  "), "ifood *restaurante");
    }

    #[test]
    fn test_fraction_inside_code_untouched() {
        // adjacent word characters: not a standalone X/Y token
        assert_eq!(norm("COD123/456A"), "cod123/456a");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "Lojas Renner - Parcela 3/12",
            "Pedido 10:30 1/2",
            "  IFOOD   *Restaurante  ",
            "Uber Trip",
            "",
        ] {
            let once = norm(raw);
            assert_eq!(norm(&once), once, "not idempotent for {raw:?}");
        }
    }
}
