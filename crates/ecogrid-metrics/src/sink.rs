//! Metrics sinks — where interval records go.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::MetricsResult;
use crate::record::IntervalRecord;

/// Receives records in interval order.
pub trait MetricsSink {
    fn record(&mut self, record: &IntervalRecord) -> MetricsResult<()>;

    fn flush(&mut self) -> MetricsResult<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<IntervalRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[IntervalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<IntervalRecord> {
        self.records
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, record: &IntervalRecord) -> MetricsResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per record, newline-delimited.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> MetricsResult<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "opened interval log");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn record(&mut self, record: &IntervalRecord) -> MetricsResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> MetricsResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
