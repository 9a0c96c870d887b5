//! Domain types shared by the embedder, the store adapters and the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::CollectionSchema;

pub type DocId = String;
pub type Fields = BTreeMap<String, FieldValue>;

/// A scalar value stored on a document.
///
/// Serialized untagged so a document round-trips through the JSON the search
/// service speaks (`"Released_Year": 1994`, `"Series_Title": "..."`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view used by range clauses. Text never compares as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Text(v.to_string()) }
}
impl From<String> for FieldValue {
    fn from(v: String) -> Self { FieldValue::Text(v) }
}
impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Integer(v) }
}
impl From<f64> for FieldValue {
    fn from(v: f64) -> Self { FieldValue::Float(v) }
}

/// A record in the collection.
///
/// - `id`: assigned once at ingest time, never reused
/// - `fields`: normalized scalar fields (title, year, rating, overview, ...)
/// - `vectors`: embedding field name -> vector; every vector must have the
///   dimensionality the collection was created with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vectors: BTreeMap<String, Vec<f32>>,
}

impl Document {
    pub fn new(id: impl Into<DocId>, fields: Fields) -> Self {
        Self { id: id.into(), fields, vectors: BTreeMap::new() }
    }

    pub fn with_vector(mut self, field: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(field.into(), vector);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> { self.fields.get(field) }
}

/// Which stored fields a search returns. `All` is the `*` projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl FieldSelection {
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSelection::Only(fields.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Only(set) => set.contains(field),
        }
    }

    /// Copy of `fields` restricted to this selection.
    pub fn project(&self, fields: &Fields) -> Fields {
        match self {
            FieldSelection::All => fields.clone(),
            FieldSelection::Only(set) => fields
                .iter()
                .filter(|(k, _)| set.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// A document returned by a search together with the index's relevance
/// score. Scores are non-negative and higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub document: Document,
    pub score: f32,
}

/// One raw dataset row before normalization.
///
/// `row` is the 1-based position in the source and is what ingestion errors
/// refer to; the document id is generated separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestRecord {
    pub row: usize,
    pub values: BTreeMap<String, String>,
}

impl IngestRecord {
    pub fn new(row: usize) -> Self { Self { row, values: BTreeMap::new() } }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Coerce every field `schema` declares; unknown columns are dropped and
    /// missing or unparsable cells become the field's sentinel.
    pub fn normalize(&self, schema: &CollectionSchema) -> Fields {
        schema
            .fields
            .iter()
            .map(|spec| (spec.name.clone(), spec.coerce(self.values.get(&spec.name).map(String::as_str))))
            .collect()
    }
}
