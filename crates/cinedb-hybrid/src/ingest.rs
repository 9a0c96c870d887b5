use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use uuid::Uuid;

use cinedb_core::data_processor::DataProcessor;
use cinedb_core::error::{Error, Result};
use cinedb_core::traits::{DocumentStore, Embedder};
use cinedb_core::types::{Document, IngestRecord};

use crate::cancel::CancelToken;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// One failed source row.
#[derive(Debug)]
pub struct RowError {
    pub row: usize,
    pub cause: Error,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Ordered by row.
    pub errors: Vec<RowError>,
    /// Set when the run stopped before launching every row.
    pub cancelled: bool,
}

impl IngestReport {
    pub fn processed(&self) -> usize { self.succeeded + self.failed }
}

/// Normalizes, embeds and upserts dataset rows. Each row gets a fresh random
/// id, so running the same dataset twice stores every row twice.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    processor: DataProcessor,
    concurrency: usize,
    show_progress: bool,
}

impl IngestionPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>, processor: DataProcessor) -> Self {
        Self { embedder, store, processor, concurrency: DEFAULT_CONCURRENCY, show_progress: false }
    }

    /// Rows in flight at once; values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn run(&self, rows: &[IngestRecord]) -> Result<IngestReport> {
        self.run_cancellable(rows, &CancelToken::new()).await
    }

    /// Stops launching rows once `cancel` fires; rows already in flight finish
    /// and the partial report is returned with `cancelled` set.
    pub async fn run_cancellable(&self, rows: &[IngestRecord], cancel: &CancelToken) -> Result<IngestReport> {
        if self.embedder.dim() != self.store.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder '{}' produces {} dims but the collection expects {}",
                self.embedder.embedder_id(),
                self.embedder.dim(),
                self.store.dim()
            )));
        }
        tracing::info!(rows = rows.len(), concurrency = self.concurrency, embedder = self.embedder.embedder_id(), "ingest start");
        let pb = self.progress_bar(rows.len());

        let mut outcomes = stream::iter(rows)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|record| async move { (record.row, self.ingest_row(record).await) })
            .buffer_unordered(self.concurrency);

        let mut report = IngestReport::default();
        while let Some((row, outcome)) = outcomes.next().await {
            match outcome {
                Ok(id) => {
                    tracing::trace!(row, id = %id, "row stored");
                    report.succeeded += 1;
                }
                Err(cause) => {
                    tracing::warn!(row, error = %cause, "row failed");
                    report.failed += 1;
                    report.errors.push(RowError { row, cause });
                }
            }
            pb.inc(1);
        }
        report.errors.sort_by_key(|e| e.row);
        report.cancelled = report.processed() < rows.len();
        pb.finish_with_message(if report.cancelled { "cancelled" } else { "done" });
        tracing::info!(succeeded = report.succeeded, failed = report.failed, cancelled = report.cancelled, "ingest finished");
        Ok(report)
    }

    async fn ingest_row(&self, record: &IngestRecord) -> Result<String> {
        let fields = self.processor.normalize(record);
        let vector = self.embedder.embed(self.processor.embedding_text(record)).await?;
        if vector.len() != self.store.dim() {
            return Err(Error::DimensionMismatch { got: vector.len(), expected: self.store.dim() });
        }
        let id = Uuid::new_v4().simple().to_string();
        let document = Document::new(id.clone(), fields).with_vector(self.processor.schema().embedding_field.clone(), vector);
        self.store.upsert(&id, &document).await?;
        Ok(id)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
