//! fatura-core: domain types and pure text logic for statement categorization
//!
//! Everything here is side-effect free: title normalization, installment
//! extraction and string similarity. File formats and the resolution
//! pipeline live in `fatura-ingest` and `fatura-engine`.

pub mod installment;
pub mod normalize;
pub mod similarity;
pub mod transaction;

pub use installment::extract_installment;
pub use normalize::normalize;
pub use similarity::{extract_one, score, weighted_ratio};
pub use transaction::Transaction;
