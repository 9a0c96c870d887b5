use std::sync::Arc;
use std::time::Duration;

use cinedb_core::error::{Error, Result};
use cinedb_core::filter::FilterPredicate;
use cinedb_core::traits::{DocumentStore, Embedder};
use cinedb_core::types::{FieldSelection, ScoredResult};

use crate::cancel::CancelToken;

/// Runs one hybrid search: embed the query text, then hand the vector and
/// predicate to the store. Ranking belongs to the store; results come back
/// exactly as the store returned them.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    fields: FieldSelection,
    timeout: Option<Duration>,
}

impl QueryEngine {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store, fields: FieldSelection::All, timeout: None }
    }

    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    /// Bound each search (embedding plus store call) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn search(&self, text: &str, k: i64, predicate: &FilterPredicate) -> Result<Vec<ScoredResult>> {
        let k = check_k(k)?;
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(text, k, predicate))
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.execute(text, k, predicate).await,
        }
    }

    /// Like [`search`](Self::search), but abandons the in-flight calls with
    /// `Cancelled` as soon as `cancel` fires.
    pub async fn search_cancellable(
        &self,
        text: &str,
        k: i64,
        predicate: &FilterPredicate,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredResult>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            res = self.search(text, k, predicate) => res,
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    async fn execute(&self, text: &str, k: usize, predicate: &FilterPredicate) -> Result<Vec<ScoredResult>> {
        let vector = self.embedder.embed(text).await?;
        tracing::debug!(conjuncts = predicate.len(), k, dim = vector.len(), "hybrid search");
        let results = self.store.hybrid_search(&vector, predicate, k, &self.fields).await?;
        tracing::debug!(hits = results.len(), "search done");
        Ok(results)
    }
}

fn check_k(k: i64) -> Result<usize> {
    if k < 1 {
        return Err(Error::InvalidArgument(format!("k must be at least 1, got {k}")));
    }
    usize::try_from(k).map_err(|_| Error::InvalidArgument(format!("k out of range: {k}")))
}
