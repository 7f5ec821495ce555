//! Container reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytemuck::from_bytes;
use memmap2::Mmap;
use tracing::{debug, warn};

use super::format::{ChunkHeader, ChunkKind, GlbHeader, CHUNK_HEADER_SIZE, HEADER_SIZE};
use crate::{GlbError, Result};

/// A chunk borrowed from the container bytes
#[derive(Debug, Clone, Copy)]
pub struct RawChunk<'a> {
    /// Chunk header as stored
    pub header: ChunkHeader,
    /// Offset of the chunk header from the start of the container
    pub offset: usize,
    /// Payload, clamped to the bytes actually available
    pub payload: &'a [u8],
}

impl RawChunk<'_> {
    /// Chunk type
    #[must_use]
    pub fn kind(&self) -> ChunkKind {
        self.header.kind()
    }

    /// Whether the declared length ran past the end of the input
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.header.payload_length() as usize
    }
}

/// Iterator over the chunks of a byte slice
///
/// Stops as soon as fewer than 8 bytes remain. Payloads that extend past the
/// end of the slice are clamped rather than rejected.
pub struct ChunkIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    base: usize,
}

impl<'a> ChunkIter<'a> {
    /// Iterate chunks in `bytes`; `base` is the container offset of `bytes[0]`
    #[must_use]
    pub fn new(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            offset: 0,
            base,
        }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.len().saturating_sub(self.offset) < CHUNK_HEADER_SIZE {
            return None;
        }

        let header_end = self.offset + CHUNK_HEADER_SIZE;
        let header: ChunkHeader = *from_bytes(&self.bytes[self.offset..header_end]);

        let data_end = header_end.saturating_add(header.payload_length() as usize);
        let payload = &self.bytes[header_end..data_end.min(self.bytes.len())];

        let chunk = RawChunk {
            header,
            offset: self.base + self.offset,
            payload,
        };
        self.offset = data_end;

        Some(chunk)
    }
}

/// A container parsed in place over its bytes
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    /// Container header
    pub header: GlbHeader,
    /// Mandatory first chunk
    pub json: RawChunk<'a>,
    /// Everything after the JSON chunk
    pub rest: &'a [u8],
    rest_offset: usize,
}

impl<'a> Container<'a> {
    /// Parse the header and the mandatory JSON chunk
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the magic is wrong or the first chunk is
    /// missing or not tagged JSON
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(GlbError::InvalidFormat(format!(
                "File too small to contain header: {} bytes",
                bytes.len()
            )));
        }

        let header: GlbHeader = *from_bytes(&bytes[..HEADER_SIZE]);
        if !header.has_valid_magic() {
            return Err(GlbError::InvalidFormat(format!(
                "Invalid magic bytes: expected \"glTF\", got \"{}\"",
                header.magic.escape_ascii()
            )));
        }

        let json = ChunkIter::new(&bytes[HEADER_SIZE..], HEADER_SIZE)
            .next()
            .ok_or_else(|| GlbError::InvalidFormat("Missing JSON chunk".to_string()))?;

        if json.kind() != ChunkKind::Json {
            return Err(GlbError::InvalidFormat(format!(
                "First chunk is not JSON: got {}",
                json.kind()
            )));
        }

        let rest_offset = HEADER_SIZE + CHUNK_HEADER_SIZE + json.payload.len();

        debug!(
            "Parsed GLB header: version {}, declared length {}, JSON chunk {} bytes",
            header.version(),
            header.total_length(),
            json.payload.len()
        );

        Ok(Self {
            header,
            json,
            rest: &bytes[rest_offset..],
            rest_offset,
        })
    }

    /// Chunks following the JSON chunk, in file order
    #[must_use]
    pub fn chunks(&self) -> ChunkIter<'a> {
        ChunkIter::new(self.rest, self.rest_offset)
    }

    /// First BIN chunk after the JSON chunk; later ones are ignored
    #[must_use]
    pub fn bin_chunk(&self) -> Option<RawChunk<'a>> {
        self.chunks().find(|chunk| chunk.kind() == ChunkKind::Bin)
    }
}

/// Payloads extracted from one container
///
/// Owns its buffers; nothing refers back to the source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChunks {
    /// Container header as read
    pub header: GlbHeader,
    /// JSON chunk payload
    pub json: Vec<u8>,
    /// First BIN chunk payload, if any
    pub bin: Option<Vec<u8>>,
    /// Whether any payload was clamped to the available bytes
    pub truncated: bool,
}

impl ExtractedChunks {
    /// BIN payload, or an empty slice when absent
    #[must_use]
    pub fn bin_or_empty(&self) -> &[u8] {
        self.bin.as_deref().unwrap_or_default()
    }

    /// True when there is no BIN chunk or it carries no bytes
    #[must_use]
    pub fn lacks_bin(&self) -> bool {
        self.bin_or_empty().is_empty()
    }
}

/// Reader extracting the JSON and BIN payloads of a container
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkReader {
    strict: bool,
}

impl ChunkReader {
    /// Lenient reader: clamped payloads are logged, not rejected
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader that rejects clamped payloads with `TruncatedChunk`
    #[must_use]
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Whether this reader rejects clamped payloads
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Open and memory-map a container file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or mapped, or is invalid
    pub fn open(&self, path: &Path) -> Result<ExtractedChunks> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        debug!("Reading {} ({} bytes)", path.display(), mmap.len());

        self.read_slice(&mmap)
    }

    /// Read a container from any byte source, consuming it fully
    ///
    /// # Errors
    ///
    /// Returns error if the source fails or the container is invalid
    pub fn read_from<R: Read>(&self, mut source: R) -> Result<ExtractedChunks> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        self.read_slice(&bytes)
    }

    /// Read a container held in memory
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for a bad header or first chunk, and
    /// `TruncatedChunk` for a clamped payload when strict
    pub fn read_slice(&self, bytes: &[u8]) -> Result<ExtractedChunks> {
        let container = Container::parse(bytes)?;
        let mut truncated = self.check(&container.json)?;

        let mut bin = None;
        for chunk in container.chunks() {
            truncated |= self.check(&chunk)?;

            if chunk.kind() == ChunkKind::Bin {
                debug!(
                    "Found BIN chunk at offset {}: {} bytes",
                    chunk.offset,
                    chunk.payload.len()
                );
                bin = Some(chunk.payload.to_vec());
                break;
            }

            debug!(
                "Skipping {} chunk at offset {}: {} bytes",
                chunk.kind(),
                chunk.offset,
                chunk.payload.len()
            );
        }

        if bin.is_none() {
            debug!("No BIN chunk present");
        }

        Ok(ExtractedChunks {
            header: container.header,
            json: container.json.payload.to_vec(),
            bin,
            truncated,
        })
    }

    /// Returns whether `chunk` was clamped, or an error if strict
    fn check(&self, chunk: &RawChunk<'_>) -> Result<bool> {
        if !chunk.is_truncated() {
            return Ok(false);
        }

        let declared = chunk.header.payload_length();
        if self.strict {
            return Err(GlbError::TruncatedChunk {
                tag: chunk.kind().to_string(),
                declared,
                available: chunk.payload.len(),
            });
        }

        warn!(
            "{} chunk at offset {} declares {} bytes but only {} remain; payload clamped",
            chunk.kind(),
            chunk.offset,
            declared,
            chunk.payload.len()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ChunkWriter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(tag);
        out.extend_from_slice(payload);
        out
    }

    fn container(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = b"glTF".to_vec();
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_roundtrip() {
        let bytes = ChunkWriter::encode(b"{\"a\":1}", b"\x01\x02\x03").unwrap();
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();

        assert_eq!(extracted.header.version(), 2);
        assert_eq!(extracted.header.total_length() as usize, bytes.len());
        assert_eq!(extracted.json, b"{\"a\":1} ");
        assert_eq!(extracted.bin.as_deref(), Some(&b"\x01\x02\x03\x00"[..]));
        assert!(!extracted.truncated);
    }

    #[test]
    fn test_json_only() {
        let bytes = container(&[chunk(b"JSON", b"{}  ")]);
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();

        assert_eq!(extracted.json, b"{}  ");
        assert_eq!(extracted.bin, None);
        assert!(extracted.lacks_bin());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = container(&[chunk(b"JSON", b"{}  ")]);
        bytes[..4].copy_from_slice(b"GLTF");

        let err = ChunkReader::new().read_slice(&bytes).unwrap_err();
        assert!(matches!(err, GlbError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_short_header() {
        let err = ChunkReader::new().read_slice(b"glTF\x02\x00").unwrap_err();
        assert!(matches!(err, GlbError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_missing_json() {
        let bytes = container(&[]);
        let err = ChunkReader::new().read_slice(&bytes).unwrap_err();
        assert!(matches!(err, GlbError::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_bin_first() {
        let bytes = container(&[chunk(b"BIN\0", b"\x01\x02\x03\x04"), chunk(b"JSON", b"{}  ")]);
        let err = ChunkReader::new().read_slice(&bytes).unwrap_err();
        assert!(
            matches!(err, GlbError::InvalidFormat(ref msg) if msg.contains("not JSON")),
            "{err}"
        );
    }

    #[test]
    fn test_first_bin_wins() {
        let bytes = container(&[
            chunk(b"JSON", b"{}  "),
            chunk(b"BIN\0", b"\x01\x01\x01\x01"),
            chunk(b"BIN\0", b"\x02\x02\x02\x02\x02\x02\x02\x02"),
        ]);
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.bin.as_deref(), Some(&b"\x01\x01\x01\x01"[..]));
    }

    #[test]
    fn test_skips_unknown_chunks() {
        let bytes = container(&[
            chunk(b"JSON", b"{}  "),
            chunk(b"XTRA", b"skip me!"),
            chunk(b"BIN\0", b"\xAA\xBB\xCC\xDD"),
        ]);
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.bin.as_deref(), Some(&b"\xAA\xBB\xCC\xDD"[..]));
    }

    #[test]
    fn test_unaligned_json_is_accepted() {
        // Real-world files sometimes skip JSON padding
        let bytes = container(&[chunk(b"JSON", b"{\"x\":1}"), chunk(b"BIN\0", b"\x09")]);
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.json, b"{\"x\":1}");
        assert_eq!(extracted.bin.as_deref(), Some(&b"\x09"[..]));
    }

    #[test]
    fn test_trailing_garbage_shorter_than_header() {
        let mut bytes = container(&[chunk(b"JSON", b"{}  ")]);
        bytes.extend_from_slice(b"\x00\x00\x00");
        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.bin, None);
    }

    #[test]
    fn test_truncated_bin_is_clamped() {
        let mut bytes = container(&[chunk(b"JSON", b"{}  ")]);
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(b"BIN\0");
        bytes.extend_from_slice(b"\x01\x02\x03");

        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.bin.as_deref(), Some(&b"\x01\x02\x03"[..]));
        assert!(extracted.truncated);
    }

    #[test]
    fn test_truncated_bin_rejected_when_strict() {
        let mut bytes = container(&[chunk(b"JSON", b"{}  ")]);
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(b"BIN\0");
        bytes.extend_from_slice(b"\x01\x02\x03");

        let err = ChunkReader::strict().read_slice(&bytes).unwrap_err();
        match err {
            GlbError::TruncatedChunk {
                tag,
                declared,
                available,
            } => {
                assert_eq!(tag, "BIN");
                assert_eq!(declared, 16);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_json_is_clamped() {
        let mut bytes = b"glTF".to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&64u32.to_le_bytes());
        bytes.extend_from_slice(b"JSON");
        bytes.extend_from_slice(b"{}");

        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.json, b"{}");
        assert_eq!(extracted.bin, None);
        assert!(extracted.truncated);
    }

    #[test]
    fn test_huge_declared_length_does_not_overflow() {
        let mut bytes = container(&[chunk(b"JSON", b"{}  ")]);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"XTRA");
        bytes.extend_from_slice(b"\x01\x02");

        let extracted = ChunkReader::new().read_slice(&bytes).unwrap();
        assert_eq!(extracted.bin, None);
        assert!(extracted.truncated);
    }

    #[test]
    fn test_chunk_offsets() {
        let bytes = container(&[
            chunk(b"JSON", b"{}  "),
            chunk(b"XTRA", b"1234"),
            chunk(b"BIN\0", b"5678"),
        ]);
        let container = Container::parse(&bytes).unwrap();
        let offsets: Vec<usize> = container.chunks().map(|c| c.offset).collect();

        assert_eq!(container.json.offset, 12);
        assert_eq!(offsets, vec![24, 36]);
        assert_eq!(container.bin_chunk().unwrap().offset, 36);
    }

    #[test]
    fn test_read_from_stream_and_file() {
        let bytes = container(&[chunk(b"JSON", b"{}  "), chunk(b"BIN\0", b"\x07\x07\x07\x07")]);

        let from_stream = ChunkReader::new().read_from(&bytes[..]).unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        let from_file = ChunkReader::new().open(file.path()).unwrap();

        assert_eq!(from_stream, from_file);
        assert_eq!(from_file.bin.as_deref(), Some(&b"\x07\x07\x07\x07"[..]));
    }
}
