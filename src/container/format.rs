//! Binary format structures

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Container magic bytes: "glTF"
pub const GLB_MAGIC: [u8; 4] = *b"glTF";

/// Container version written by [`super::ChunkWriter`]
pub const GLB_VERSION: u32 = 2;

/// Container header size
pub const HEADER_SIZE: usize = 12;

/// Chunk header size (length + tag)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Every written chunk payload is a multiple of this
pub const CHUNK_ALIGNMENT: usize = 4;

/// Tag of the mandatory first chunk
pub const CHUNK_TYPE_JSON: [u8; 4] = *b"JSON";

/// Tag of the optional binary chunk
pub const CHUNK_TYPE_BIN: [u8; 4] = *b"BIN\0";

/// Fill byte for JSON payloads (trailing whitespace stays valid JSON)
pub const JSON_PADDING: u8 = b' ';

/// Fill byte for BIN payloads
pub const BIN_PADDING: u8 = 0x00;

/// Container header (12 bytes)
///
/// Integer fields are kept as raw little-endian bytes so the struct has an
/// alignment of 1 and can be cast from any offset of a mapped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct GlbHeader {
    /// Magic bytes for file format identification
    pub magic: [u8; 4],

    /// Format version (u32 LE)
    pub version: [u8; 4],

    /// Total container length in bytes (u32 LE)
    pub length: [u8; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<GlbHeader>(), HEADER_SIZE);
static_assertions::const_assert_eq!(std::mem::align_of::<GlbHeader>(), 1);

/// Chunk header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct ChunkHeader {
    /// Payload length, excluding this header (u32 LE)
    pub length: [u8; 4],

    /// Chunk type tag
    pub tag: [u8; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<ChunkHeader>(), CHUNK_HEADER_SIZE);
static_assertions::const_assert_eq!(std::mem::align_of::<ChunkHeader>(), 1);

impl GlbHeader {
    /// Header for a version 2 container of `total_length` bytes
    #[must_use]
    pub fn new(total_length: u32) -> Self {
        Self {
            magic: GLB_MAGIC,
            version: GLB_VERSION.to_le_bytes(),
            length: total_length.to_le_bytes(),
        }
    }

    /// Declared format version
    #[must_use]
    pub fn version(&self) -> u32 {
        u32::from_le_bytes(self.version)
    }

    /// Declared total length
    #[must_use]
    pub fn total_length(&self) -> u32 {
        u32::from_le_bytes(self.length)
    }

    /// Whether the magic bytes identify a GLB container
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == GLB_MAGIC
    }
}

impl ChunkHeader {
    /// Create a chunk header
    #[must_use]
    pub fn new(length: u32, tag: [u8; 4]) -> Self {
        Self {
            length: length.to_le_bytes(),
            tag,
        }
    }

    /// Declared payload length
    #[must_use]
    pub fn payload_length(&self) -> u32 {
        u32::from_le_bytes(self.length)
    }

    /// Chunk type
    #[must_use]
    pub fn kind(&self) -> ChunkKind {
        ChunkKind::from_tag(self.tag)
    }
}

/// Chunk type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Structured JSON scene description
    Json,
    /// Opaque binary buffer
    Bin,
    /// Any other tag (extensions, garbage)
    Unknown([u8; 4]),
}

impl ChunkKind {
    /// Classify a raw tag
    #[must_use]
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match tag {
            CHUNK_TYPE_JSON => Self::Json,
            CHUNK_TYPE_BIN => Self::Bin,
            other => Self::Unknown(other),
        }
    }

    /// Raw tag bytes
    #[must_use]
    pub fn tag(self) -> [u8; 4] {
        match self {
            Self::Json => CHUNK_TYPE_JSON,
            Self::Bin => CHUNK_TYPE_BIN,
            Self::Unknown(tag) => tag,
        }
    }

    /// Padding byte used when writing a payload of this type
    #[must_use]
    pub fn padding_byte(self) -> u8 {
        match self {
            Self::Json => JSON_PADDING,
            Self::Bin | Self::Unknown(_) => BIN_PADDING,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Bin => f.write_str("BIN"),
            Self::Unknown(tag) => write!(f, "\"{}\"", tag.escape_ascii()),
        }
    }
}

/// Round `len` up to the next multiple of [`CHUNK_ALIGNMENT`]
#[must_use]
pub const fn padded_len(len: usize) -> usize {
    (len + CHUNK_ALIGNMENT - 1) & !(CHUNK_ALIGNMENT - 1)
}
