use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::CollectionSchema;
use crate::types::{Fields, IngestRecord};

/// Reads the tabular dataset and normalizes rows against a collection schema.
pub struct DataProcessor {
    schema: CollectionSchema,
}

impl DataProcessor {
    pub fn new(schema: CollectionSchema) -> Self { Self { schema } }

    pub fn schema(&self) -> &CollectionSchema { &self.schema }

    /// Read a headed CSV file into raw records, one per data row (1-based).
    pub fn read_csv(&self, path: &Path) -> Result<Vec<IngestRecord>> {
        let file = std::fs::File::open(path).map_err(|e| Error::Dataset(format!("{}: {}", path.display(), e)))?;
        let records = self.read_csv_from(file)?;
        tracing::info!(rows = records.len(), path = %path.display(), "read dataset");
        Ok(records)
    }

    pub fn read_csv_from<R: std::io::Read>(&self, reader: R) -> Result<Vec<IngestRecord>> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers().map_err(|e| Error::Dataset(format!("header: {}", e)))?.clone();
        let mut out = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| Error::Dataset(format!("row {}: {}", i + 1, e)))?;
            let mut record = IngestRecord::new(i + 1);
            for (column, value) in headers.iter().zip(row.iter()) {
                record.values.insert(column.trim().to_string(), value.to_string());
            }
            out.push(record);
        }
        Ok(out)
    }

    pub fn normalize(&self, record: &IngestRecord) -> Fields { record.normalize(&self.schema) }

    /// Text sent to the embedder for this record.
    pub fn embedding_text<'a>(&self, record: &'a IngestRecord) -> &'a str {
        record.values.get(&self.schema.text_field).map(String::as_str).unwrap_or("")
    }
}

impl Default for DataProcessor {
    fn default() -> Self { Self::new(CollectionSchema::default()) }
}
