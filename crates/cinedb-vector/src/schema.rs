use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use cinedb_core::schema::{CollectionSchema, FieldKind};

pub const ID_COLUMN: &str = "id";
pub const DISTANCE_COLUMN: &str = "_distance";

pub fn arrow_type(kind: FieldKind) -> DataType {
	match kind {
		FieldKind::Text => DataType::Utf8,
		FieldKind::Integer => DataType::Int64,
		FieldKind::Float => DataType::Float64,
	}
}

/// `id`, then every scalar field in schema order, then the embedding column.
/// Scalars are non-nullable: ingestion always writes a value or its sentinel.
pub fn build_arrow_schema(schema: &CollectionSchema) -> Arc<Schema> {
	let mut fields = Vec::with_capacity(schema.fields.len() + 2);
	fields.push(Field::new(ID_COLUMN, DataType::Utf8, false));
	for spec in &schema.fields {
		fields.push(Field::new(&spec.name, arrow_type(spec.kind), false));
	}
	fields.push(Field::new(
		&schema.embedding_field,
		DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), schema.dim as i32),
		true,
	));
	Arc::new(Schema::new(fields))
}
