//! GLB container format: chunk reader and writer

mod format;
mod reader;
mod writer;

pub use format::{
    padded_len, ChunkHeader, ChunkKind, GlbHeader, BIN_PADDING, CHUNK_ALIGNMENT,
    CHUNK_HEADER_SIZE, CHUNK_TYPE_BIN, CHUNK_TYPE_JSON, GLB_MAGIC, GLB_VERSION, HEADER_SIZE,
    JSON_PADDING,
};
pub use reader::{ChunkIter, ChunkReader, Container, ExtractedChunks, RawChunk};
pub use writer::ChunkWriter;
