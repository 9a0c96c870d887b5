use arrow_array::{Array, Float32Array, Float64Array, Int64Array, RecordBatch, StringArray};

use cinedb_core::error::{Error, Result};
use cinedb_core::schema::{CollectionSchema, FieldKind};
use cinedb_core::types::{Document, FieldSelection, FieldValue, Fields, ScoredResult};

use crate::schema::{DISTANCE_COLUMN, ID_COLUMN};

/// Columns to project for a selection: always `id`, never the vector.
pub fn select_columns(schema: &CollectionSchema, fields: &FieldSelection) -> Vec<String> {
	let mut cols = vec![ID_COLUMN.to_string()];
	cols.extend(schema.fields.iter().filter(|f| fields.includes(&f.name)).map(|f| f.name.clone()));
	cols
}

/// Cosine distance lies in `[0, 2]`; map it to a relevance score in `[0, 1]`.
pub fn distance_to_score(distance: f32) -> f32 { (1.0 - distance / 2.0).clamp(0.0, 1.0) }

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<T>())
		.ok_or_else(|| Error::StoreQuery(format!("missing or mistyped column '{name}'")))
}

fn field_value(batch: &RecordBatch, name: &str, kind: FieldKind, row: usize) -> Result<Option<FieldValue>> {
	let value = match kind {
		FieldKind::Text => {
			let col = column::<StringArray>(batch, name)?;
			(!col.is_null(row)).then(|| FieldValue::Text(col.value(row).to_string()))
		}
		FieldKind::Integer => {
			let col = column::<Int64Array>(batch, name)?;
			(!col.is_null(row)).then(|| FieldValue::Integer(col.value(row)))
		}
		FieldKind::Float => {
			let col = column::<Float64Array>(batch, name)?;
			(!col.is_null(row)).then(|| FieldValue::Float(col.value(row)))
		}
	};
	Ok(value)
}

/// Decode one result batch, preserving row order.
pub fn batch_to_results(schema: &CollectionSchema, fields: &FieldSelection, batch: &RecordBatch) -> Result<Vec<ScoredResult>> {
	let ids = column::<StringArray>(batch, ID_COLUMN)?;
	let distances = column::<Float32Array>(batch, DISTANCE_COLUMN)?;
	let mut out = Vec::with_capacity(batch.num_rows());
	for row in 0..batch.num_rows() {
		let mut values = Fields::new();
		for spec in schema.fields.iter().filter(|f| fields.includes(&f.name)) {
			if let Some(v) = field_value(batch, &spec.name, spec.kind, row)? {
				values.insert(spec.name.clone(), v);
			}
		}
		out.push(ScoredResult {
			document: Document::new(ids.value(row), values),
			score: distance_to_score(distances.value(row)),
		});
	}
	Ok(out)
}
