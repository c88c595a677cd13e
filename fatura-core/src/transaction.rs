//! Transaction record types shared across ingestion and categorization

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One credit-card statement row, enriched during processing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Date of the transaction (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Raw statement description, as it appeared on the fatura
    pub title: String,
    /// Signed amount; positive = charge, negative = credit/refund
    pub amount: f64,
    /// Current installment number ("parcela 3/12" -> 3)
    pub installment_current: Option<u32>,
    /// Total installments ("parcela 3/12" -> 12)
    pub installment_total: Option<u32>,
    /// Identifier of the statement file this row came from
    pub source_batch: String,
    /// Assigned category label; the only field mutated after creation
    pub category: String,
    /// Issuer-provided category, if the statement export had one
    pub category_nubank_original: Option<String>,
    /// Issuer-provided row id, if the statement export had one
    pub id_nubank_original: Option<String>,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        title: impl Into<String>,
        amount: f64,
        source_batch: impl Into<String>,
    ) -> Self {
        Self {
            date,
            title: title.into(),
            amount,
            installment_current: None,
            installment_total: None,
            source_batch: source_batch.into(),
            category: String::new(),
            category_nubank_original: None,
            id_nubank_original: None,
        }
    }

    /// True when the row carries installment metadata
    pub fn is_installment(&self) -> bool {
        self.installment_current.is_some() && self.installment_total.is_some()
    }

    /// True for credits/refunds (negative amount)
    pub fn is_credit(&self) -> bool {
        self.amount < 0.0
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_creation() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let txn = Transaction::new(date, "Padaria Estrela", 42.5, "fatura_marco.csv");
        assert_eq!(txn.amount, 42.5);
        assert!(!txn.is_credit());
        assert!(!txn.is_installment());
        assert_eq!(txn.category, "");
    }

    #[test]
    fn test_installment_flag() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut txn = Transaction::new(date, "Magalu Parcela 2/6", 120.0, "f.csv");
        txn.installment_current = Some(2);
        txn.installment_total = Some(6);
        assert!(txn.is_installment());
    }
}
