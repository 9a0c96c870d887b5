use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use cinedb_core::error::{Error, Result};
use cinedb_core::filter::FilterPredicate;
use cinedb_core::schema::CollectionSchema;
use cinedb_core::traits::DocumentStore;
use cinedb_core::types::{Document, FieldSelection, ScoredResult};

use crate::writer::validate_document;

#[derive(Default)]
struct Inner {
	docs: Vec<Document>,
	by_id: HashMap<String, usize>,
}

/// Exhaustive cosine search over an in-process collection. Used in tests and
/// for small datasets that do not need a table on disk.
pub struct MemoryStore {
	schema: CollectionSchema,
	inner: RwLock<Inner>,
}

impl MemoryStore {
	pub fn new(schema: CollectionSchema) -> Self { Self { schema, inner: RwLock::new(Inner::default()) } }

	pub async fn len(&self) -> usize { self.inner.read().await.docs.len() }

	pub async fn is_empty(&self) -> bool { self.len().await == 0 }

	pub async fn get(&self, id: &str) -> Option<Document> {
		let inner = self.inner.read().await;
		inner.by_id.get(id).map(|&i| inner.docs[i].clone())
	}
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		na += x * x;
		nb += y * y;
	}
	if na == 0.0 || nb == 0.0 { return 0.0; }
	dot / (na.sqrt() * nb.sqrt())
}

/// Same scale as the Lance adapter: `1 - distance / 2` with cosine distance.
fn similarity_score(a: &[f32], b: &[f32]) -> f32 { ((1.0 + cosine(a, b)) / 2.0).clamp(0.0, 1.0) }

#[async_trait]
impl DocumentStore for MemoryStore {
	fn dim(&self) -> usize { self.schema.dim }

	async fn upsert(&self, id: &str, document: &Document) -> Result<()> {
		if id.is_empty() {
			return Err(Error::StoreWrite("empty document id".into()));
		}
		validate_document(&self.schema, document)?;
		let mut stored = document.clone();
		stored.id = id.to_string();
		let mut inner = self.inner.write().await;
		match inner.by_id.get(id).copied() {
			Some(i) => inner.docs[i] = stored,
			None => {
				let i = inner.docs.len();
				inner.docs.push(stored);
				inner.by_id.insert(id.to_string(), i);
			}
		}
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
		predicate.validate()?;
		let inner = self.inner.read().await;
		let mut scored: Vec<(f32, &Document)> = inner
			.docs
			.iter()
			.filter(|d| predicate.matches(d))
			.filter_map(|d| d.vectors.get(&self.schema.embedding_field).map(|v| (similarity_score(query_vector, v), d)))
			.collect();
		scored.sort_by(|a, b| b.0.total_cmp(&a.0));
		scored.truncate(k);
		Ok(scored
			.into_iter()
			.map(|(score, d)| ScoredResult { document: Document::new(d.id.clone(), fields.project(&d.fields)), score })
			.collect())
	}
}
