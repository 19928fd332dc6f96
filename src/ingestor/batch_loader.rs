use csv::{ByteRecord, ReaderBuilder};
use futures::stream::{self, Stream, StreamExt};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::sales_parser::SalesRowParser;
use super::upsert::RowWriter;
use crate::config::defaults::{DEFAULT_PROGRESS_UPDATE_INTERVAL, DEFAULT_ROW_TIMEOUT};
use crate::errors::{RowError, SourceReadError};
use crate::models::{LoadSummary, RowOutcome};

/// A fully read source file. The header is already stripped; row 1 is the
/// first data row. Rows stay undecoded so that bad text in one row is a
/// row-level failure.
#[derive(Debug, Clone)]
pub struct SalesSource {
    path: PathBuf,
    rows: Vec<ByteRecord>,
}

impl SalesSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceReadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| SourceReadError::new(path.display().to_string(), e))?;
        Self::from_reader(path, file)
    }

    /// Read every row of `reader` before returning. Only I/O and CSV
    /// framing errors fail the whole source.
    pub fn from_reader<P: AsRef<Path>, R: Read>(
        path: P,
        reader: R,
    ) -> Result<Self, SourceReadError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let rows = reader
            .byte_records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceReadError::new(path.display().to_string(), e))?;

        debug!("Read {} data rows from {}", rows.len(), path.display());
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(row index, raw record)` pairs in file order
    pub fn records(&self) -> impl Iterator<Item = (usize, &ByteRecord)> + '_ {
        self.rows.iter().enumerate().map(|(i, record)| (i + 1, record))
    }
}

/// Drives a `RowWriter` over every row of a source. Row failures are
/// recorded as skipped and never stop the batch.
pub struct BatchLoader<W> {
    writer: W,
    row_timeout: Duration,
    progress_interval: usize,
}

impl<W: RowWriter> BatchLoader<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            row_timeout: DEFAULT_ROW_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_UPDATE_INTERVAL,
        }
    }

    pub fn with_row_timeout(mut self, row_timeout: Duration) -> Self {
        self.row_timeout = row_timeout;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval.max(1);
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub async fn process_row(&self, row: usize, record: &ByteRecord) -> RowOutcome {
        let bundle = match SalesRowParser::parse_bytes(row, record) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Skipping row {}: invalid {}: {}", row, e.field, e.cause);
                return RowOutcome::Skipped {
                    row,
                    reason: e.into(),
                };
            }
        };

        match tokio::time::timeout(self.row_timeout, self.writer.write_row(row, &bundle)).await {
            Ok(Ok(())) => {
                debug!("Loaded row {} (order {})", row, bundle.order.order_id);
                RowOutcome::Loaded { row }
            }
            Ok(Err(e)) => {
                warn!("Skipping row {}: {} failed: {}", row, e.stage, e.cause);
                RowOutcome::Skipped {
                    row,
                    reason: e.into(),
                }
            }
            Err(_) => {
                warn!(
                    "Skipping row {}: write did not finish within {:?}",
                    row, self.row_timeout
                );
                RowOutcome::Skipped {
                    row,
                    reason: RowError::TimedOut {
                        row,
                        after: self.row_timeout,
                    },
                }
            }
        }
    }

    /// Lazily process `source` from its first data row. Each call starts
    /// over.
    pub fn outcomes<'a>(&'a self, source: &'a SalesSource) -> impl Stream<Item = RowOutcome> + 'a {
        stream::iter(source.records()).then(move |(row, record)| self.process_row(row, record))
    }

    pub async fn load(&self, source: &SalesSource) -> LoadSummary {
        let started = Instant::now();
        let total = source.len();
        let mut summary = LoadSummary::default();

        info!("Loading {} rows from {}", total, source.path().display());

        let outcomes = self.outcomes(source);
        futures::pin_mut!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);

            if summary.rows % self.progress_interval == 0 && summary.rows < total {
                info!(
                    "Processed {}/{} rows ({} loaded, {} skipped)",
                    summary.rows, total, summary.loaded, summary.skipped
                );
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Finished loading {}: {} loaded, {} skipped ({} invalid, {} failed writes, {} timed out) in {}ms",
            source.path().display(),
            summary.loaded,
            summary.skipped,
            summary.validation_failures,
            summary.persistence_failures,
            summary.timeouts,
            summary.duration_ms
        );

        summary
    }

    /// Read `path` completely, then load it. Only a source read failure is
    /// returned as an error.
    pub async fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<LoadSummary, SourceReadError> {
        let path = path.as_ref().to_path_buf();
        // Reading is blocking file IO; keep it off the async workers.
        let source = tokio::task::spawn_blocking(move || SalesSource::open(&path))
            .await
            .map_err(|e| SourceReadError::new("<reader task>", e))??;

        Ok(self.load(&source).await)
    }
}
