//! cinedb-core
//!
//! Domain types, error taxonomy, the `Embedder`/`DocumentStore` seams, filter
//! construction, dataset normalization and configuration shared by the other
//! `cinedb-*` crates.
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod filter;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use filter::{Clause, FilterBuilder, FilterPredicate, NumericRange};
pub use schema::CollectionSchema;
pub use traits::{DocumentStore, Embedder};
pub use types::{Document, FieldSelection, FieldValue, Fields, IngestRecord, ScoredResult};
