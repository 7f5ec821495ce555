//! Read-only container summaries

use std::fmt;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::container::{ChunkKind, Container, RawChunk};
use crate::digest::payload_crc32;
use crate::Result;

/// One row of the chunk table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Chunk type
    pub kind: ChunkKind,
    /// Offset of the chunk header in the file
    pub offset: usize,
    /// Length declared in the chunk header
    pub declared_len: u32,
    /// Payload bytes actually present
    pub available_len: usize,
    /// CRC32 of the available payload
    pub crc32: u32,
}

impl From<&RawChunk<'_>> for ChunkSummary {
    fn from(chunk: &RawChunk<'_>) -> Self {
        Self {
            kind: chunk.kind(),
            offset: chunk.offset,
            declared_len: chunk.header.payload_length(),
            available_len: chunk.payload.len(),
            crc32: payload_crc32(chunk.payload),
        }
    }
}

/// Header fields and every chunk of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Declared version
    pub version: u32,
    /// Declared total length
    pub declared_len: u32,
    /// Actual byte count
    pub actual_len: usize,
    /// All chunks in file order, JSON first
    pub chunks: Vec<ChunkSummary>,
}

impl ContainerSummary {
    /// Summarize a container held in memory
    ///
    /// Unlike extraction, this walks past the first BIN chunk.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the header or first chunk is invalid
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let container = Container::parse(bytes)?;

        let chunks = std::iter::once(container.json)
            .chain(container.chunks())
            .map(|chunk| ChunkSummary::from(&chunk))
            .collect();

        Ok(Self {
            version: container.header.version(),
            declared_len: container.header.total_length(),
            actual_len: bytes.len(),
            chunks,
        })
    }

    /// Summarize a container file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be mapped or is invalid
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Number of BIN chunks; only the first is ever used
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|chunk| chunk.kind == ChunkKind::Bin)
            .count()
    }
}

impl fmt::Display for ContainerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GLB version {}", self.version)?;
        write!(f, "Length: {} bytes declared", self.declared_len)?;
        if self.declared_len as usize == self.actual_len {
            writeln!(f)?;
        } else {
            writeln!(f, ", {} bytes on disk (mismatch)", self.actual_len)?;
        }

        writeln!(f)?;
        writeln!(f, "{:>8}  {:<8} {:>10} {:>10}  crc32", "offset", "type", "declared", "present")?;
        for chunk in &self.chunks {
            write!(
                f,
                "{:>8}  {:<8} {:>10} {:>10}  {:08x}",
                chunk.offset,
                chunk.kind.to_string(),
                chunk.declared_len,
                chunk.available_len,
                chunk.crc32
            )?;
            if chunk.available_len < chunk.declared_len as usize {
                write!(f, "  (truncated)")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
