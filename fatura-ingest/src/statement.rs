//! Credit-card statement CSV parser (Nubank-style exports).
//!
//! Expected shape, header row required:
//!   date,category,title,amount
//!   2024-03-01,restaurante,Ifood *Restaurante,54.90
//!
//! Only `date`, `title` and `amount` are mandatory; `category` and `id`
//! are carried through untouched when present so they never collide with
//! the category this tool assigns later.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Read;
use tracing::debug;

use crate::types::StatementRow;

const COL_DATE: &str = "date";
const COL_TITLE: &str = "title";
const COL_AMOUNT: &str = "amount";
const COL_CATEGORY: &str = "category";
const COL_ID: &str = "id";

/// Parse one statement CSV into rows.
///
/// Fails when the source is unreadable or a required column is missing
/// from the header; the caller decides whether that skips the batch.
/// Rows with an unparsable date or amount are dropped, not fatal.
pub fn parse_statement_csv<R: Read>(mut reader: R) -> Result<Vec<StatementRow>> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .context("reading statement CSV")?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = rdr.headers().context("reading statement header")?.clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(date_idx), Some(title_idx), Some(amount_idx)) =
        (col(COL_DATE), col(COL_TITLE), col(COL_AMOUNT))
    else {
        bail!(
            "statement is missing required columns ({COL_DATE}, {COL_TITLE}, {COL_AMOUNT}); found: {headers:?}"
        );
    };
    let category_idx = col(COL_CATEGORY);
    let id_idx = col(COL_ID);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                debug!(%err, "skipping malformed CSV record");
                continue;
            }
        };

        let date_raw = record.get(date_idx).unwrap_or("").trim();
        let title_raw = record.get(title_idx).unwrap_or("").trim();
        let amount_raw = record.get(amount_idx).unwrap_or("").trim();
        if title_raw.is_empty() {
            continue;
        }

        let (Some(date), Some(amount)) = (parse_date(date_raw), parse_amount(amount_raw)) else {
            debug!(date = date_raw, amount = amount_raw, "dropping unparsable row");
            continue;
        };

        let optional = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        rows.push(StatementRow {
            date,
            title: title_raw.to_string(),
            amount,
            issuer_category: optional(category_idx),
            issuer_id: optional(id_idx),
        });
    }

    Ok(rows)
}

/// Accepts ISO dates, Brazilian DD/MM/YYYY, and ISO datetimes
fn parse_date(s: &str) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Accepts "12.34" and Brazilian "1.234,56" forms
fn parse_amount(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    if s.contains(',') {
        let cleaned = s.replace('.', "").replace(',', ".");
        return cleaned.parse().ok();
    }
    None
}
