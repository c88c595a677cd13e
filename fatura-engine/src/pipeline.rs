//! Batch pipeline: parse statements, enrich rows, resolve categories.
//!
//! One run reads every uploaded statement, consolidates the surviving
//! rows, prepares the resolution context once, and assigns a category per
//! row. No failure in a single batch aborts the run; the only terminal
//! condition is zero surviving rows overall.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use fatura_core::{Transaction, extract_installment, normalize};
use fatura_ingest::parse_statement_csv;

use crate::knowledge::KnowledgeBase;
use crate::reference::{DEFAULT_ACTIVITY_COLUMN, DEFAULT_ESTABLISHMENT_COLUMN, ReferenceIndex};
use crate::resolve::{DEFAULT_SIMILARITY_THRESHOLD, ResolutionContext};

/// One named statement input (a file upload, in practice)
pub struct BatchSource {
    pub name: String,
    reader: Box<dyn Read>,
}

impl BatchSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening statement {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            reader: Box::new(file),
        })
    }

    /// In-memory batch, mainly for tests and embedding
    pub fn from_string(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(Cursor::new(contents.into().into_bytes())),
        }
    }
}

/// Per-run configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Master switch for approximate establishment matching
    pub use_establishments: bool,
    /// Reference directory CSV; `None` with the switch on just disables
    /// the fuzzy stage
    pub establishments_path: Option<PathBuf>,
    pub establishment_column: String,
    pub activity_column: String,
    /// Minimum similarity score (0-100) for a fuzzy match
    pub threshold: u8,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            use_establishments: false,
            establishments_path: None,
            establishment_column: DEFAULT_ESTABLISHMENT_COLUMN.to_string(),
            activity_column: DEFAULT_ACTIVITY_COLUMN.to_string(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Process statement batches into categorized transactions.
///
/// Batches that cannot be parsed are skipped with a warning. Rows
/// identical in (date, title, amount, source batch) are consolidated to
/// one, so re-uploading the same statement does not duplicate rows. Zero
/// surviving rows yields an empty result and an error-level log; the
/// caller decides what to do with partial or empty data.
pub fn process_batches(
    batches: Vec<BatchSource>,
    base: &KnowledgeBase,
    options: &PipelineOptions,
) -> Vec<Transaction> {
    if base.is_empty() {
        warn!("knowledge base is empty; keyword categorization will not apply");
    }

    let total = batches.len();
    let mut seen: HashSet<(chrono::NaiveDate, String, u64, String)> = HashSet::new();
    // transaction plus its normalized title; the latter is a working
    // artifact dropped from the output
    let mut rows: Vec<(Transaction, String)> = Vec::new();

    for (i, batch) in batches.into_iter().enumerate() {
        info!(batch = %batch.name, "reading statement {}/{total}", i + 1);
        let parsed = match parse_statement_csv(batch.reader) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(batch = %batch.name, %err, "skipping statement");
                continue;
            }
        };
        if parsed.is_empty() {
            warn!(batch = %batch.name, "no valid transactions after cleanup, skipping");
            continue;
        }

        for row in parsed {
            let key = (
                row.date,
                row.title.clone(),
                row.amount.to_bits(),
                batch.name.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            let normalized = normalize(Some(&row.title));
            let installment = extract_installment(Some(&row.title));

            let mut txn = Transaction::new(row.date, row.title, row.amount, batch.name.clone());
            if let Some((current, installment_total)) = installment {
                txn.installment_current = Some(current);
                txn.installment_total = Some(installment_total);
            }
            txn.category_nubank_original = row.issuer_category;
            txn.id_nubank_original = row.issuer_id;
            rows.push((txn, normalized));
        }
    }

    if rows.is_empty() {
        error!("no statement produced valid transactions; nothing to categorize");
        return Vec::new();
    }
    info!(transactions = rows.len(), "consolidated, preparing categorization");

    let reference = if options.use_establishments {
        options.establishments_path.as_deref().and_then(|path| {
            ReferenceIndex::load(
                path,
                &options.establishment_column,
                &options.activity_column,
            )
        })
    } else {
        None
    };

    let context = ResolutionContext::new(base, reference, options.threshold);
    info!(fuzzy = context.fuzzy_enabled(), "categorizing transactions");

    rows.into_iter()
        .map(|(mut txn, normalized)| {
            txn.category = context.resolve(&normalized);
            txn
        })
        .collect()
}
