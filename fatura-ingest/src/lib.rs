//! fatura-ingest: statement CSV ingestion into typed rows.

pub mod statement;
pub mod types;

pub use statement::parse_statement_csv;
pub use types::StatementRow;
