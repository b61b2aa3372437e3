//! Chunk sinks: a batch JSONL file or an external streaming callback.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use harvest_core::Chunk;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open chunk sink {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("chunk write failed: {0}")]
    Write(#[from] io::Error),
    #[error("chunk encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("sink rejected chunk: {0}")]
    Rejected(String),
}

/// Whether the sink stored the chunk or already had it. A duplicate is
/// success: re-running the harvester over overlapping URL sets is an
/// expected operational pattern, and re-ingestion must stay idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Inserted,
    Duplicate,
}

/// Destination for produced chunks. The orchestrator guarantees it never
/// hands over a chunk with empty content or an empty source URL.
pub trait ChunkSink {
    fn accept(&mut self, chunk: &Chunk) -> Result<Accepted, SinkError>;
    fn flush(&mut self) -> Result<(), SinkError>;
}

/// Batch-mode sink: one JSON record per line, recoverable
/// source/title/index/content per chunk.
pub struct JsonlFileSink {
    writer: BufWriter<File>,
}

impl JsonlFileSink {
    /// Opens (and truncates) the chunk file. Failure here is the fatal
    /// INIT condition: the run must not start without a sink.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl ChunkSink for JsonlFileSink {
    fn accept(&mut self, chunk: &Chunk) -> Result<Accepted, SinkError> {
        debug_assert!(!chunk.content.is_empty());
        debug_assert!(!chunk.source_url.is_empty());
        serde_json::to_writer(&mut self.writer, chunk)?;
        self.writer.write_all(b"\n")?;
        Ok(Accepted::Inserted)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

/// Stream-mode sink: hands each chunk to an external accept callback as it
/// is produced, so a crash loses at most the chunk in flight.
pub struct CallbackSink<F>
where
    F: FnMut(&Chunk) -> Result<Accepted, SinkError>,
{
    accept: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&Chunk) -> Result<Accepted, SinkError>,
{
    pub fn new(accept: F) -> Self {
        Self { accept }
    }
}

impl<F> ChunkSink for CallbackSink<F>
where
    F: FnMut(&Chunk) -> Result<Accepted, SinkError>,
{
    fn accept(&mut self, chunk: &Chunk) -> Result<Accepted, SinkError> {
        (self.accept)(chunk)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
