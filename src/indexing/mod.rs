//! Ingestion path: raw metadata → sanitized input → keyword set → stored record.

mod indexer;
mod sanitizer;
mod tokenizer;

pub use indexer::Indexer;
pub use sanitizer::{clean_text, detect_quality, RawMetadata, SanitizedInput, Sanitizer};
pub use tokenizer::{extract_keywords, tokenize_query, STOP_WORDS};
