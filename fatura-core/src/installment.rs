//! Extracts "parcela X/Y" installment metadata from raw statement titles.

use regex::Regex;
use std::sync::LazyLock;

/// Explicit "parcela X/Y" form; always wins over bare fractions
static PARCELA_CAPTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bparcela\s+(\d+)/(\d+)\b").expect("valid regex"));

/// Bare "X/Y" with 1-2 digits each; adjacency is checked manually
static BARE_CAPTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("valid regex"));

/// Patterns that mark the digits before a bare fraction as code/date/time,
/// not an installment: "... 10:30", "... 01-02-2024", "...id", "cod", "ref"
static REJECT_BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{2}:\d{2}$|\d{2}-\d{2}-\d{4}$|\b\w+id$|\bcod$|\bref$")
        .expect("valid regex")
});

/// Extract (current, total) installment info from a raw title.
///
/// The explicit "parcela X/Y" form returns its captures directly. A bare
/// "X/Y" token is accepted only when it stands alone (no adjacent word
/// characters or slashes), is not preceded by time/date/code context, and
/// satisfies `0 < current <= total`.
pub fn extract_installment(title: Option<&str>) -> Option<(u32, u32)> {
    let raw = title?;

    if let Some(caps) = PARCELA_CAPTURE_RE.captures(raw) {
        let current = caps[1].parse().ok()?;
        let total = caps[2].parse().ok()?;
        return Some((current, total));
    }

    let m = first_standalone_fraction(raw)?;
    let before = raw[..m.start].trim_end();
    if REJECT_BEFORE_RE.is_match(before) {
        return None;
    }

    let (current, total) = (m.current, m.total);
    if total > 0 && current > 0 && current <= total {
        Some((current, total))
    } else {
        None
    }
}

struct FractionMatch {
    start: usize,
    current: u32,
    total: u32,
}

/// First "X/Y" token not glued to word characters, digits, or slashes.
///
/// Replicates `(?<![\w\d/])(\d{1,2})/(\d{1,2})\b(?![\w\d/])` without
/// look-around support. Once a standalone token is found, later candidates
/// are not considered.
fn first_standalone_fraction(raw: &str) -> Option<FractionMatch> {
    for caps in BARE_CAPTURE_RE.captures_iter(raw) {
        let whole = caps.get(0)?;
        let prev = raw[..whole.start()].chars().next_back();
        let next = raw[whole.end()..].chars().next();
        if prev.is_some_and(is_adjacent_char) || next.is_some_and(is_adjacent_char) {
            continue;
        }
        return Some(FractionMatch {
            start: whole.start(),
            current: caps[1].parse().ok()?,
            total: caps[2].parse().ok()?,
        });
    }
    None
}

fn is_adjacent_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}
