//! Collection schema: scalar field kinds, their sentinel defaults, and the
//! embedded text field.
//!
//! Sentinels replace missing or unparsable values at ingest time so numeric
//! range filters never compare against nulls.

use serde::{Deserialize, Serialize};

use crate::types::FieldValue;

pub const TITLE_FIELD: &str = "Series_Title";
pub const YEAR_FIELD: &str = "Released_Year";
pub const RATING_FIELD: &str = "IMDB_Rating";
pub const OVERVIEW_FIELD: &str = "Overview";
pub const EMBEDDING_FIELD: &str = "Overview_embedding";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn text(name: &str, default: &str) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Text, default: FieldValue::Text(default.to_string()) }
    }
    pub fn integer(name: &str, default: i64) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Integer, default: FieldValue::Integer(default) }
    }
    pub fn float(name: &str, default: f64) -> Self {
        Self { name: name.to_string(), kind: FieldKind::Float, default: FieldValue::Float(default) }
    }

    /// Coerce a raw cell into this field's kind.
    ///
    /// Numeric cells are trimmed and have thousands separators removed
    /// (`"28,341,469"`). Empty, missing or unparsable cells yield the sentinel.
    pub fn coerce(&self, raw: Option<&str>) -> FieldValue {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else { return self.default.clone() };
        match self.kind {
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Integer => {
                let cleaned = raw.replace(',', "");
                cleaned.parse::<i64>().map(FieldValue::Integer).unwrap_or_else(|_| self.default.clone())
            }
            FieldKind::Float => {
                let cleaned = raw.replace(',', "");
                match cleaned.parse::<f64>() {
                    Ok(v) if v.is_finite() => FieldValue::Float(v),
                    _ => self.default.clone(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub fields: Vec<FieldSpec>,
    /// Field whose text is sent to the embedder.
    pub text_field: String,
    /// Name under which the embedding is stored and searched.
    pub embedding_field: String,
    pub dim: usize,
}

impl CollectionSchema {
    /// The IMDB top-1000 movies layout.
    pub fn movies(dim: usize) -> Self {
        Self {
            fields: vec![
                FieldSpec::text("Poster_Link", ""),
                FieldSpec::text(TITLE_FIELD, ""),
                FieldSpec::integer(YEAR_FIELD, 0),
                FieldSpec::text("Certificate", "NA"),
                FieldSpec::text("Runtime", ""),
                FieldSpec::text("Genre", ""),
                FieldSpec::float(RATING_FIELD, 0.0),
                FieldSpec::text(OVERVIEW_FIELD, ""),
                FieldSpec::float("Meta_score", -1.0),
                FieldSpec::text("Director", ""),
                FieldSpec::text("Star1", ""),
                FieldSpec::text("Star2", ""),
                FieldSpec::text("Star3", ""),
                FieldSpec::text("Star4", ""),
                FieldSpec::integer("No_of_Votes", 0),
                FieldSpec::float("Gross", 0.0),
            ],
            text_field: OVERVIEW_FIELD.to_string(),
            embedding_field: EMBEDDING_FIELD.to_string(),
            dim,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if self.dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be greater than 0".into()));
        }
        match self.field(&self.text_field) {
            Some(spec) if spec.kind == FieldKind::Text => {}
            Some(_) => return Err(Error::InvalidConfig(format!("text field '{}' is not a text field", self.text_field))),
            None => return Err(Error::InvalidConfig(format!("text field '{}' is not declared", self.text_field))),
        }
        if self.fields.iter().any(|f| f.name == "id" || f.name == self.embedding_field) {
            return Err(Error::InvalidConfig("field names 'id' and the embedding field are reserved".into()));
        }
        Ok(())
    }
}

impl Default for CollectionSchema {
    fn default() -> Self { Self::movies(DEFAULT_EMBEDDING_DIM) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_strips_thousands_separators() {
        let gross = FieldSpec::float("Gross", 0.0);
        assert_eq!(gross.coerce(Some("28,341,469")), FieldValue::Float(28_341_469.0));
        assert_eq!(gross.coerce(Some("")), FieldValue::Float(0.0));
        assert_eq!(gross.coerce(None), FieldValue::Float(0.0));
    }

    #[test]
    fn coerce_falls_back_to_sentinel_on_garbage() {
        let year = FieldSpec::integer(YEAR_FIELD, 0);
        assert_eq!(year.coerce(Some("PG")), FieldValue::Integer(0));
        assert_eq!(year.coerce(Some(" 1995 ")), FieldValue::Integer(1995));
        let meta = FieldSpec::float("Meta_score", -1.0);
        assert_eq!(meta.coerce(Some("NaN")), FieldValue::Float(-1.0));
        let cert = FieldSpec::text("Certificate", "NA");
        assert_eq!(cert.coerce(Some("  ")), FieldValue::Text("NA".into()));
    }

    #[test]
    fn movies_schema_is_valid() {
        let schema = CollectionSchema::default();
        schema.validate().unwrap();
        assert_eq!(schema.field(RATING_FIELD).unwrap().kind, FieldKind::Float);
        assert!(CollectionSchema::movies(0).validate().is_err());
    }
}
