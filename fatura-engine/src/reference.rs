//! Establishment -> activity reference index for approximate matching.
//!
//! Built once per run from a semicolon-delimited UTF-8 CSV (optional BOM),
//! e.g. a processed CNPJ establishment table:
//!
//!   Column5;Grupo_Atividade
//!   PADARIA ESTRELA LTDA;Alimentação
//!   POSTO SHELL CENTRO;Combustível
//!
//! Read-only after construction. Any load failure disables approximate
//! matching for the run instead of aborting it.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use fatura_core::normalize;

/// Default establishment-name column in the reference CSV
pub const DEFAULT_ESTABLISHMENT_COLUMN: &str = "Column5";
/// Default activity-label column in the reference CSV
pub const DEFAULT_ACTIVITY_COLUMN: &str = "Grupo_Atividade";

/// De-duplicated establishment lookup: an ordered candidate list for the
/// fuzzy search plus a normalized-name -> activity map
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    lookup: Vec<String>,
    activities: HashMap<String, String>,
}

impl ReferenceIndex {
    /// Build from CSV content. Establishment names are normalized with the
    /// same rules as statement titles; on duplicate normalized names the
    /// first occurrence (and its activity) wins.
    pub fn from_reader<R: Read>(
        mut reader: R,
        establishment_column: &str,
        activity_column: &str,
    ) -> Result<Self> {
        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .context("reading reference directory CSV")?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers = rdr.headers().context("reading reference header")?.clone();
        let col = |name: &str| headers.iter().position(|h| h.trim() == name);
        let (Some(estab_idx), Some(activity_idx)) =
            (col(establishment_column), col(activity_column))
        else {
            bail!(
                "reference directory is missing column {establishment_column:?} or {activity_column:?}"
            );
        };

        let mut index = Self::default();
        for result in rdr.records() {
            let Ok(record) = result else { continue };
            let name = record.get(estab_idx).unwrap_or("").trim();
            let activity = record.get(activity_idx).unwrap_or("").trim();
            if name.is_empty() || activity.is_empty() {
                continue;
            }

            let normalized = normalize(Some(name));
            if normalized.is_empty() || index.activities.contains_key(&normalized) {
                continue;
            }
            index.lookup.push(normalized.clone());
            index.activities.insert(normalized, activity.to_string());
        }

        Ok(index)
    }

    /// Load from a file path, degrading to `None` on any failure so the
    /// caller can fall back to keyword-only categorization.
    pub fn load(
        path: impl AsRef<Path>,
        establishment_column: &str,
        activity_column: &str,
    ) -> Option<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), %err, "reference directory unreadable, approximate matching disabled");
                return None;
            }
        };
        match Self::from_reader(file, establishment_column, activity_column) {
            Ok(index) => {
                info!(
                    path = %path.display(),
                    establishments = index.len(),
                    "reference directory loaded"
                );
                Some(index)
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "reference directory invalid, approximate matching disabled");
                None
            }
        }
    }

    /// Ordered, de-duplicated candidate list for the fuzzy search
    pub fn lookup(&self) -> &[String] {
        &self.lookup
    }

    /// Activity label for a normalized establishment name
    pub fn activity(&self, normalized_name: &str) -> Option<&str> {
        self.activities.get(normalized_name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }
}
