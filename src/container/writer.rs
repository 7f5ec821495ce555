//! Container writer

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use bytemuck::bytes_of;
use bytes::{BufMut, Bytes, BytesMut};
use tempfile::NamedTempFile;
use tracing::debug;

use super::format::{
    padded_len, ChunkHeader, ChunkKind, GlbHeader, CHUNK_HEADER_SIZE, HEADER_SIZE,
};
use crate::{GlbError, Result};

/// Writer emitting a JSON chunk and an optional BIN chunk as a container
#[derive(Debug, Clone, Copy)]
pub struct ChunkWriter {
    atomic: bool,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self { atomic: true }
    }
}

impl ChunkWriter {
    /// Writer that replaces files atomically
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose between temp-file-and-rename and truncate-in-place
    #[must_use]
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Total container length for the given unpadded payload lengths
    #[must_use]
    pub fn container_len(json_len: usize, bin_len: usize) -> usize {
        let mut total = HEADER_SIZE + CHUNK_HEADER_SIZE + padded_len(json_len);
        if bin_len > 0 {
            total += CHUNK_HEADER_SIZE + padded_len(bin_len);
        }
        total
    }

    /// Serialize a container into memory
    ///
    /// JSON is padded with spaces and BIN with zeros to a multiple of 4. An
    /// empty `bin` produces a container with no BIN chunk at all.
    ///
    /// # Errors
    ///
    /// Returns `DataTooLarge` if the container would not fit a u32 length
    pub fn encode(json: &[u8], bin: &[u8]) -> Result<Bytes> {
        let total = Self::container_len(json.len(), bin.len());
        let total_u32 = u32::try_from(total).map_err(|_| GlbError::DataTooLarge {
            size: total,
            limit: u32::MAX as usize,
        })?;

        let mut buf = BytesMut::with_capacity(total);
        buf.put_slice(bytes_of(&GlbHeader::new(total_u32)));
        put_chunk(&mut buf, ChunkKind::Json, json);
        if !bin.is_empty() {
            put_chunk(&mut buf, ChunkKind::Bin, bin);
        }

        debug_assert_eq!(buf.len(), total);
        Ok(buf.freeze())
    }

    /// Serialize a container into `dest`, returning the bytes written
    ///
    /// # Errors
    ///
    /// Returns error if the container is too large or the write fails
    pub fn write_to<W: Write>(mut dest: W, json: &[u8], bin: &[u8]) -> Result<usize> {
        let bytes = Self::encode(json, bin)?;
        dest.write_all(&bytes)?;
        dest.flush()?;
        Ok(bytes.len())
    }

    /// Serialize a container to `path`, replacing any existing file
    ///
    /// The container is fully encoded before the destination is touched.
    ///
    /// # Errors
    ///
    /// Returns error if the container is too large or the write fails
    pub fn write_file(&self, path: &Path, json: &[u8], bin: &[u8]) -> Result<usize> {
        let bytes = Self::encode(json, bin)?;

        if self.atomic {
            // Replace the file a symlink points to, keeping its permissions
            let (target, permissions) = match fs::canonicalize(path) {
                Ok(real) => {
                    let permissions = fs::metadata(&real)?.permissions();
                    (real, Some(permissions))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => (path.to_path_buf(), None),
                Err(e) => return Err(e.into()),
            };

            let dir = match target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };

            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            if let Some(permissions) = permissions {
                tmp.as_file().set_permissions(permissions)?;
            }
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| GlbError::Io(e.error))?;
        } else {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        debug!(
            "Wrote {} ({} bytes, atomic: {})",
            path.display(),
            bytes.len(),
            self.atomic
        );

        Ok(bytes.len())
    }
}

fn put_chunk(buf: &mut BytesMut, kind: ChunkKind, payload: &[u8]) {
    let padded = padded_len(payload.len());
    let header = ChunkHeader::new(padded as u32, kind.tag());

    buf.put_slice(bytes_of(&header));
    buf.put_slice(payload);
    buf.put_bytes(kind.padding_byte(), padded - payload.len());
}
