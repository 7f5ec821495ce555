//! Splice the JSON chunk of one container with the BIN chunk of another

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{info, warn};

use crate::config::Config;
use crate::container::{ChunkReader, ChunkWriter, ExtractedChunks};
use crate::digest::payload_sha256_hex;
use crate::{GlbError, Result};

/// Outcome of a successful repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// File that was written
    pub output: PathBuf,
    /// JSON payload length taken from the current file (unpadded)
    pub json_len: usize,
    /// BIN payload length taken from the backup file (unpadded)
    pub bin_len: usize,
    /// Bytes written, equal to the header's declared length
    pub total_len: usize,
    /// SHA-256 of the BIN payload that was written
    pub bin_sha256: String,
}

/// Repair of one container from a backup
#[derive(Debug, Clone)]
pub struct Repair {
    current: PathBuf,
    backup: PathBuf,
    output: PathBuf,
    reader: ChunkReader,
    writer: ChunkWriter,
}

impl Repair {
    /// Repair `current` in place using the BIN chunk of `backup`
    #[must_use]
    pub fn new(current: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        let current = current.into();
        Self {
            output: current.clone(),
            current,
            backup: backup.into(),
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
        }
    }

    /// Build a repair from a validated configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.current, &config.backup)
            .output(config.output_path())
            .strict(config.read.strict)
            .atomic(config.write.atomic)
    }

    /// Write somewhere other than the current file
    #[must_use]
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Reject truncated chunks instead of clamping them
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.reader = if strict {
            ChunkReader::strict()
        } else {
            ChunkReader::new()
        };
        self
    }

    /// Replace the output via temp file and rename
    #[must_use]
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.writer = self.writer.atomic(atomic);
        self
    }

    /// Destination path
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Read both inputs, check the backup BIN chunk, then write the output
    ///
    /// Nothing is written unless both reads and the check succeed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` or `TruncatedChunk` for unreadable inputs,
    /// `DataLossGuard` if the backup has no BIN payload, and `Io` on write
    /// failure
    pub fn run(&self) -> Result<RepairReport> {
        info!(
            "Repairing {} with BIN chunk from {}",
            self.current.display(),
            self.backup.display()
        );

        let current = self.reader.open(&self.current)?;
        let backup = self.reader.open(&self.backup)?;
        let (json, bin) = select_payloads(&current, &backup, &self.backup)?;

        let total_len = self.writer.write_file(&self.output, json, bin)?;

        let report = RepairReport {
            output: self.output.clone(),
            json_len: json.len(),
            bin_len: bin.len(),
            total_len,
            bin_sha256: payload_sha256_hex(bin),
        };

        info!(
            "Rebuilt {} with current JSON ({} bytes) and backup BIN ({} bytes)",
            report.output.display(),
            report.json_len,
            report.bin_len
        );

        Ok(report)
    }
}

/// Splice two in-memory containers: JSON from `current`, BIN from `backup`
///
/// # Errors
///
/// Same as [`Repair::run`], minus file I/O
pub fn splice(reader: ChunkReader, current: &[u8], backup: &[u8]) -> Result<Bytes> {
    let current = reader.read_slice(current)?;
    let backup = reader.read_slice(backup)?;
    let (json, bin) = select_payloads(&current, &backup, Path::new("<backup>"))?;
    ChunkWriter::encode(json, bin)
}

fn select_payloads<'a>(
    current: &'a ExtractedChunks,
    backup: &'a ExtractedChunks,
    backup_path: &Path,
) -> Result<(&'a [u8], &'a [u8])> {
    if backup.lacks_bin() {
        return Err(GlbError::DataLossGuard(backup_path.to_path_buf()));
    }

    if current.truncated || backup.truncated {
        warn!("Input chunks were truncated; output may be missing data");
    }
    if current.bin.is_some() {
        info!("Discarding BIN chunk of current file");
    }

    Ok((current.json.as_slice(), backup.bin_or_empty()))
}
