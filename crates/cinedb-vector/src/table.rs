//! LanceDB connection and housekeeping helpers.

use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};
use std::sync::Arc;

use cinedb_core::error::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
	connect(uri).execute().await.map_err(|e| Error::InvalidConfig(format!("open lancedb '{uri}': {e}")))
}

/// Create `name` with `schema` and zero rows unless it already exists.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
	let names = conn.table_names().execute().await.map_err(|e| Error::StoreWrite(e.to_string()))?;
	if names.contains(&name.to_string()) {
		return Ok(());
	}
	let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
	conn.create_table(name, Box::new(iter)).execute().await.map_err(|e| Error::StoreWrite(e.to_string()))?;
	tracing::info!(table = name, "created table");
	Ok(())
}
