use async_trait::async_trait;

use crate::error::Result;
use crate::filter::FilterPredicate;
use crate::types::{Document, FieldSelection, ScoredResult};

/// Turns text into a fixed-length vector. One remote call per `embed`, no
/// retries and no caching; the caller owns retry policy.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small:d1536`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A collection supporting upsert-by-id and vector search under a filter.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Dimensionality of the collection's embedding field.
    fn dim(&self) -> usize;

    /// Insert or replace the document stored under `id`. Fails with `StoreWrite`.
    async fn upsert(&self, id: &str, document: &Document) -> Result<()>;

    /// At most `k` matches of `predicate`, nearest to `query_vector` first.
    /// Scores are non-negative and non-increasing. Fails with `StoreQuery`.
    async fn hybrid_search(
        &self,
        query_vector: &[f32],
        predicate: &FilterPredicate,
        k: usize,
        fields: &FieldSelection,
    ) -> Result<Vec<ScoredResult>>;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn embedder_id(&self) -> &str { (**self).embedder_id() }
    fn dim(&self) -> usize { (**self).dim() }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> { (**self).embed(text).await }
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for std::sync::Arc<T> {
    fn embedder_id(&self) -> &str { (**self).embedder_id() }
    fn dim(&self) -> usize { (**self).dim() }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> { (**self).embed(text).await }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    fn dim(&self) -> usize { (**self).dim() }
    async fn upsert(&self, id: &str, document: &Document) -> Result<()> { (**self).upsert(id, document).await }
    async fn hybrid_search(
        &self,
        query_vector: &[f32],
        predicate: &FilterPredicate,
        k: usize,
        fields: &FieldSelection,
    ) -> Result<Vec<ScoredResult>> {
        (**self).hybrid_search(query_vector, predicate, k, fields).await
    }
}
