//! Ingestion Pipeline: pulls postings from a source, normalises and
//! deduplicates them, embeds what changed, and upserts into both the corpus
//! store and the `jobs` table.

pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod sources;

pub use pipeline::{IngestReport, IngestionPipeline, ReembedPolicy};
