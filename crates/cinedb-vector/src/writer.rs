use arrow_array::{ArrayRef, FixedSizeListArray, Float64Array, Int64Array, RecordBatch, StringArray};
use std::sync::Arc;

use cinedb_core::error::{Error, Result};
use cinedb_core::schema::{CollectionSchema, FieldKind};
use cinedb_core::types::{Document, FieldValue};

use crate::schema::build_arrow_schema;

/// Check a document against the collection before it is written.
pub fn validate_document(schema: &CollectionSchema, document: &Document) -> Result<()> {
	let vector = document
		.vectors
		.get(&schema.embedding_field)
		.ok_or_else(|| Error::StoreWrite(format!("document has no '{}' vector", schema.embedding_field)))?;
	if vector.len() != schema.dim {
		return Err(Error::StoreWrite(format!("vector dim {} does not match collection dim {}", vector.len(), schema.dim)));
	}
	Ok(())
}

fn text_value(doc: &Document, name: &str, default: &FieldValue) -> String {
	match doc.get(name).unwrap_or(default) {
		FieldValue::Text(s) => s.clone(),
		FieldValue::Integer(v) => v.to_string(),
		FieldValue::Float(v) => v.to_string(),
	}
}

fn int_value(doc: &Document, name: &str, default: &FieldValue) -> Result<i64> {
	match doc.get(name).unwrap_or(default) {
		FieldValue::Integer(v) => Ok(*v),
		FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
		other => Err(Error::StoreWrite(format!("field '{name}' expects an integer, got {other:?}"))),
	}
}

fn float_value(doc: &Document, name: &str, default: &FieldValue) -> Result<f64> {
	doc.get(name)
		.unwrap_or(default)
		.as_f64()
		.ok_or_else(|| Error::StoreWrite(format!("field '{name}' expects a number")))
}

/// Build one record batch for `rows`, each written under its own id.
/// Fields the document lacks are written as the schema sentinel.
pub fn docs_to_record_batch(schema: &CollectionSchema, rows: &[(&str, &Document)]) -> Result<RecordBatch> {
	let arrow_schema = build_arrow_schema(schema);
	let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields.len() + 2);
	columns.push(Arc::new(StringArray::from(rows.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>())));
	for spec in &schema.fields {
		let col: ArrayRef = match spec.kind {
			FieldKind::Text => Arc::new(StringArray::from(
				rows.iter().map(|(_, d)| text_value(d, &spec.name, &spec.default)).collect::<Vec<_>>(),
			)),
			FieldKind::Integer => Arc::new(Int64Array::from(
				rows.iter().map(|(_, d)| int_value(d, &spec.name, &spec.default)).collect::<Result<Vec<_>>>()?,
			)),
			FieldKind::Float => Arc::new(Float64Array::from(
				rows.iter().map(|(_, d)| float_value(d, &spec.name, &spec.default)).collect::<Result<Vec<_>>>()?,
			)),
		};
		columns.push(col);
	}
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
	for (_, doc) in rows {
		validate_document(schema, doc)?;
		vectors.push(doc.vectors.get(&schema.embedding_field).map(|v| v.iter().map(|&x| Some(x)).collect()));
	}
	columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
		vectors.into_iter(),
		schema.dim as i32,
	)));
	RecordBatch::try_new(arrow_schema, columns).map_err(|e| Error::StoreWrite(e.to_string()))
}
