//! fatura-engine: category knowledge base, reference directory index,
//! resolution cascade, and the statement batch pipeline.

pub mod knowledge;
pub mod pipeline;
pub mod reference;
pub mod resolve;

pub use knowledge::{DEFAULT_KNOWLEDGE_PATH, KnowledgeBase, PROTECTED_CATEGORIES};
pub use pipeline::{BatchSource, PipelineOptions, process_batches};
pub use reference::{DEFAULT_ACTIVITY_COLUMN, DEFAULT_ESTABLISHMENT_COLUMN, ReferenceIndex};
pub use resolve::{
    DEFAULT_SIMILARITY_THRESHOLD, ResolutionContext, SENTINEL_EMPTY_TITLE, SENTINEL_FALLBACK,
    SENTINEL_FUZZY_ERROR, SENTINEL_LOW_SIMILARITY, SENTINEL_UNMAPPED,
};
