use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One valid row read from a statement CSV, before categorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: NaiveDate,
    /// Raw description text as exported by the issuer
    pub title: String,
    /// Positive number means charge/spend; negative means credit/refund.
    pub amount: f64,
    /// Issuer-assigned category column, when the export carries one
    pub issuer_category: Option<String>,
    /// Issuer-assigned row id, when the export carries one
    pub issuer_id: Option<String>,
}
