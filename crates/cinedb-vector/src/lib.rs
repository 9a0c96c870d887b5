//! Vector-store adapters for movie documents.
//!
//! [`LanceStore`] keeps one LanceDB table per collection: an `id` column, one
//! column per scalar field and a fixed-size Float32 embedding column. Upserts
//! go through `merge_insert` on `id` and are retried with backoff when a
//! concurrent writer wins the commit; searches run a cosine nearest-neighbour
//! query with the filter applied as a prefilter, so `k` is honoured after
//! filtering. [`MemoryStore`] offers the same contract in process.

pub mod filter_sql;
pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use async_trait::async_trait;
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType};
use std::time::Duration;

use cinedb_core::error::{Error, Result};
use cinedb_core::filter::FilterPredicate;
use cinedb_core::schema::CollectionSchema;
use cinedb_core::traits::DocumentStore;
use cinedb_core::types::{Document, FieldSelection, ScoredResult};

pub use memory::MemoryStore;

const MAX_COMMIT_ATTEMPTS: u32 = 10;
const COMMIT_BACKOFF: Duration = Duration::from_millis(15);

/// Lance reports a lost optimistic commit as a (retryable) commit conflict.
fn is_commit_conflict(message: &str) -> bool {
	let m = message.to_ascii_lowercase();
	m.contains("commit conflict") || m.contains("retryable") || m.contains("concurrent")
}

pub struct LanceStore {
	db: Connection,
	table_name: String,
	schema: CollectionSchema,
}

impl LanceStore {
	/// Connect to `uri` and create `table_name` if it does not exist yet.
	pub async fn open(uri: &str, table_name: &str, schema: CollectionSchema) -> Result<Self> {
		schema.validate()?;
		let db = table::open_db(uri).await?;
		table::ensure_table(&db, table_name, schema::build_arrow_schema(&schema)).await?;
		tracing::debug!(uri, table = table_name, dim = schema.dim, "opened lance store");
		Ok(Self { db, table_name: table_name.to_string(), schema })
	}

	pub fn schema(&self) -> &CollectionSchema { &self.schema }

	pub async fn count_rows(&self) -> Result<usize> {
		let t = self.open_table().await.map_err(|e| Error::StoreQuery(e.to_string()))?;
		t.count_rows(None).await.map_err(|e| Error::StoreQuery(e.to_string()))
	}

	async fn open_table(&self) -> lancedb::Result<lancedb::Table> {
		self.db.open_table(&self.table_name).execute().await
	}

	// Reopens the table so a retry sees the commit that beat it.
	async fn merge_one(&self, reader: Box<dyn arrow_array::RecordBatchReader + Send>) -> lancedb::Result<()> {
		let t = self.open_table().await?;
		let mut mi = t.merge_insert(&[schema::ID_COLUMN]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		mi.execute(reader).await?;
		Ok(())
	}
}

#[async_trait]
impl DocumentStore for LanceStore {
	fn dim(&self) -> usize { self.schema.dim }

	async fn upsert(&self, id: &str, document: &Document) -> Result<()> {
		if id.is_empty() {
			return Err(Error::StoreWrite("empty document id".into()));
		}
		let batch = writer::docs_to_record_batch(&self.schema, &[(id, document)])?;
		let arrow_schema = schema::build_arrow_schema(&self.schema);
		let mut attempt = 1;
		loop {
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch.clone())].into_iter(), arrow_schema.clone()));
			match self.merge_one(reader).await {
				Ok(()) => break,
				Err(e) if attempt < MAX_COMMIT_ATTEMPTS && is_commit_conflict(&e.to_string()) => {
					tracing::debug!(id, attempt, error = %e, "commit conflict, retrying upsert");
					tokio::time::sleep(COMMIT_BACKOFF * attempt).await;
					attempt += 1;
				}
				Err(e) => return Err(Error::StoreWrite(e.to_string())),
			}
		}
		tracing::trace!(id, "upserted document");
		Ok(())
	}

	async fn hybrid_search(
		&self,
		query_vector: &[f32],
		predicate: &FilterPredicate,
		k: usize,
		fields: &FieldSelection,
	) -> Result<Vec<ScoredResult>> {
		if k == 0 {
			return Err(Error::InvalidArgument("k must be at least 1".into()));
		}
		if query_vector.len() != self.schema.dim {
			return Err(Error::StoreQuery(format!(
				"query vector dim {} does not match collection dim {}",
				query_vector.len(),
				self.schema.dim
			)));
		}
		let filter = filter_sql::to_sql(&self.schema, predicate)?;
		let columns = search::select_columns(&self.schema, fields);
		let t = self.open_table().await.map_err(|e| Error::StoreQuery(e.to_string()))?;
		let mut query = t
			.vector_search(query_vector.to_vec())
			.map_err(|e| Error::StoreQuery(e.to_string()))?
			.column(&self.schema.embedding_field)
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.select(Select::columns(columns.as_slice()));
		if let Some(sql) = &filter {
			tracing::debug!(filter = %sql, "prefilter");
			query = query.only_if(sql.as_str());
		}
		let mut stream = query.execute().await.map_err(|e| Error::StoreQuery(e.to_string()))?;
		let mut results = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(|e| Error::StoreQuery(e.to_string()))? {
			results.extend(search::batch_to_results(&self.schema, fields, &batch)?);
		}
		results.sort_by(|a, b| b.score.total_cmp(&a.score));
		results.truncate(k);
		Ok(results)
	}
}
