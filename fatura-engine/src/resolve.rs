//! Category resolution cascade.
//!
//! Exact name match, then keyword containment, then approximate
//! establishment match, then fallback. Each rule either produces a final
//! label or passes to the next; the resolver never fails for well-formed
//! input, it degrades to a sentinel label instead.

use std::collections::HashMap;

use fatura_core::{extract_one, normalize};

use crate::knowledge::KnowledgeBase;
use crate::reference::ReferenceIndex;

/// Fallback when no rule fires (fuzzy disabled or reference list empty)
pub const SENTINEL_FALLBACK: &str = "Sem Categoria/Pix Credito";
/// Fuzzy stage reached with an empty normalized title
pub const SENTINEL_EMPTY_TITLE: &str = "Sem Categoria (Título Vazio)";
/// Fuzzy candidate accepted but absent from the activity map
pub const SENTINEL_UNMAPPED: &str = "Sem Categoria (Fuzzy - Mapa Principal Vazio)";
/// No fuzzy candidate cleared the similarity threshold
pub const SENTINEL_LOW_SIMILARITY: &str = "Sem Categoria (Fuzzy - Baixa Similaridade)";
/// The similarity computation itself failed
pub const SENTINEL_FUZZY_ERROR: &str = "Erro Fuzzy Match";

/// Minimum accepted similarity score, 0-100
pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 95;

/// Immutable per-run bundle the resolver consults for every row.
///
/// Built once per batch run so resolution is pure with respect to its
/// inputs; nothing here is reloaded or mutated mid-run.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// (category, normalized keywords) in knowledge-base insertion order;
    /// this order is the keyword tie-break and must not be re-sorted
    keyword_map: Vec<(String, Vec<String>)>,
    /// normalized category name -> original-cased category name
    exact_names: HashMap<String, String>,
    reference: Option<ReferenceIndex>,
    threshold: u8,
}

impl ResolutionContext {
    /// Prepare the lookup structures for one run. `reference` being `Some`
    /// is what enables the approximate-matching stage.
    pub fn new(base: &KnowledgeBase, reference: Option<ReferenceIndex>, threshold: u8) -> Self {
        let keyword_map = base
            .categories()
            .iter()
            .map(|(category, keywords)| {
                let normalized = keywords
                    .iter()
                    .map(|kw| normalize(Some(kw)))
                    .filter(|kw| !kw.is_empty())
                    .collect();
                (category.clone(), normalized)
            })
            .collect();

        let exact_names = base
            .categories()
            .keys()
            .map(|category| (normalize(Some(category)), category.clone()))
            .collect();

        Self {
            keyword_map,
            exact_names,
            reference,
            threshold,
        }
    }

    pub fn fuzzy_enabled(&self) -> bool {
        self.reference.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Resolve one normalized title to a category label.
    ///
    /// Always returns a non-empty label: a knowledge-base category, a
    /// reference activity, or one of the sentinel strings.
    pub fn resolve(&self, normalized_title: &str) -> String {
        for rule in RULES {
            if let Some(label) = rule(self, normalized_title) {
                return label;
            }
        }
        SENTINEL_FALLBACK.to_string()
    }
}

type Rule = fn(&ResolutionContext, &str) -> Option<String>;

/// The cascade, in priority order; the first rule returning a label wins.
/// Reordering or inserting a rule is a one-line change here.
const RULES: &[Rule] = &[match_exact_name, match_keyword, match_establishment];

/// Rule 1: the title IS a category name
fn match_exact_name(ctx: &ResolutionContext, title: &str) -> Option<String> {
    ctx.exact_names.get(title).cloned()
}

/// Rule 2: keyword containment, insertion order first.
///
/// Plain substring containment, deliberately: a short keyword can match
/// inside an unrelated longer word ("bar" in "barbeiro"). Saved category
/// assignments depend on this behavior; switching to word-boundary
/// matching is a policy decision, not a fix.
fn match_keyword(ctx: &ResolutionContext, title: &str) -> Option<String> {
    for (category, keywords) in &ctx.keyword_map {
        for keyword in keywords {
            if !keyword.is_empty() && title.contains(keyword.as_str()) {
                return Some(category.clone());
            }
        }
    }
    None
}

/// Rule 3: approximate establishment match through the reference index
fn match_establishment(ctx: &ResolutionContext, title: &str) -> Option<String> {
    let reference = ctx.reference.as_ref()?;
    if reference.is_empty() {
        return None;
    }
    if title.trim().is_empty() {
        return Some(SENTINEL_EMPTY_TITLE.to_string());
    }

    match extract_one(title, reference.lookup(), ctx.threshold) {
        Err(_) => Some(SENTINEL_FUZZY_ERROR.to_string()),
        Ok(None) => Some(SENTINEL_LOW_SIMILARITY.to_string()),
        Ok(Some((name, _score))) => Some(
            reference
                .activity(name)
                .map(str::to_string)
                .unwrap_or_else(|| SENTINEL_UNMAPPED.to_string()),
        ),
    }
}
