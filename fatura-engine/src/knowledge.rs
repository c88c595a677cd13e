//! User-editable category knowledge base, persisted as JSON.
//!
//! The file's top level is a mapping from category name to a list of
//! normalized keyword/establishment strings:
//!
//! ```json
//! {
//!     "Alimentação": ["ifood", "padaria estrela"],
//!     "Transporte": ["uber", "99app"]
//! }
//! ```
//!
//! Key order is insertion order and is load-bearing: it decides which
//! category wins when several keywords match the same title.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

use crate::resolve::{
    SENTINEL_EMPTY_TITLE, SENTINEL_FALLBACK, SENTINEL_FUZZY_ERROR, SENTINEL_LOW_SIMILARITY,
    SENTINEL_UNMAPPED,
};

/// Default knowledge-base file name
pub const DEFAULT_KNOWLEDGE_PATH: &str = "Categorias.json";

/// Categories that survive even with an empty keyword list: the review
/// buckets the sentinels feed, plus the issuer adjustment and charge
/// buckets (payments, refunds, interest, fees) that statements repopulate
/// every cycle.
pub const PROTECTED_CATEGORIES: &[&str] = &[
    "Sem Categoria",
    SENTINEL_FALLBACK,
    SENTINEL_EMPTY_TITLE,
    SENTINEL_UNMAPPED,
    SENTINEL_LOW_SIMILARITY,
    SENTINEL_FUZZY_ERROR,
    // credit / adjustment
    "Pagamento de Fatura",
    "Estorno",
    "Ajustes Financeiros Nubank",
    "Ajuste Parcelamento Fatura",
    "Encerramento de dívida",
    "Crédito Diversos",
    // non-consumption charges
    "Juros de dívida encerrada",
    "IOF de atraso",
    "Multa de atraso",
    "Juros e Taxas Diversas",
    "Taxas",
    "Encargos de Parcelamento Fatura",
    // overdue balance adjustments
    "Saldo em atraso",
    "Crédito de atraso",
];

/// Mapping from category name to its known keyword/establishment strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    categories: IndexMap<String, Vec<String>>,
}

impl KnowledgeBase {
    /// Load from a JSON file.
    ///
    /// Never fails: a missing file, unparsable JSON, or a non-object top
    /// level all degrade to an empty base with a warning, so a broken
    /// file costs keyword categorization but not the run.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "knowledge base not readable, starting empty");
                return Self::default();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %path.display(), %err, "knowledge base is not valid JSON, starting empty");
                return Self::default();
            }
        };
        let Value::Object(parsed) = value else {
            warn!(path = %path.display(), "knowledge base top level is not an object, starting empty");
            return Self::default();
        };

        // Values that are not arrays keep their key (exact-name matching
        // still applies) but contribute no keywords.
        let categories = parsed
            .into_iter()
            .map(|(category, value)| {
                let keywords = match value {
                    Value::Array(items) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (category, keywords)
            })
            .collect();

        Self { categories }
    }

    /// Persist as pretty-printed UTF-8 JSON (non-ASCII kept literal).
    /// Returns false instead of failing; the in-memory state stays valid.
    pub fn save(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        // four-space indent keeps files byte-compatible with bases written
        // by earlier versions of the tool
        let mut json = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut json, formatter);
        if let Err(err) = self.categories.serialize(&mut ser) {
            error!(%err, "knowledge base serialization failed");
            return false;
        }
        match fs::write(path, json) {
            Ok(()) => true,
            Err(err) => {
                error!(path = %path.display(), %err, "knowledge base write failed");
                false
            }
        }
    }

    pub fn categories(&self) -> &IndexMap<String, Vec<String>> {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Create the category if absent, leaving its keywords untouched
    pub fn ensure_category(&mut self, category: &str) {
        self.categories.entry(category.to_string()).or_default();
    }

    /// Append a keyword to a category, creating it on demand; duplicate
    /// keywords are not appended twice
    pub fn add_keyword(&mut self, category: &str, keyword: &str) {
        let keywords = self.categories.entry(category.to_string()).or_default();
        if !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }

    /// One human re-categorization edit: move a normalized title from its
    /// old category to a new one.
    ///
    /// The old category is pruned when left empty, unless protected. The
    /// caller persists right after each edit; edits are discrete and
    /// independently saved, never batched.
    pub fn reassign(&mut self, old_category: Option<&str>, new_category: &str, title: &str) {
        if let Some(old) = old_category
            && let Some(keywords) = self.categories.get_mut(old)
        {
            keywords.retain(|k| k != title);
            if keywords.is_empty() && !is_protected(old) {
                self.categories.shift_remove(old);
            }
        }
        self.add_keyword(new_category, title);
    }
}

/// True for sentinel categories that must never be pruned
pub fn is_protected(category: &str) -> bool {
    PROTECTED_CATEGORIES.contains(&category)
}
