//! Query and ingestion orchestration over an [`Embedder`] and a
//! [`DocumentStore`], both injected by the caller.
//!
//! [`Embedder`]: cinedb_core::traits::Embedder
//! [`DocumentStore`]: cinedb_core::traits::DocumentStore

pub mod cancel;
pub mod ingest;
pub mod query;

pub use cancel::CancelToken;
pub use ingest::{IngestReport, IngestionPipeline, RowError, DEFAULT_CONCURRENCY};
pub use query::QueryEngine;
