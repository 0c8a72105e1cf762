//! Block vocabulary, chunk coordinates, and the dense per-chunk block grid.

pub mod chunk;
pub mod material;

pub use chunk::{
    BlockSink, BlockView, CHUNK_AREA, CHUNK_WIDTH, ChunkData, ChunkError, ChunkPos, hash_chunk_data,
};
pub use material::{Material, MaterialKind, UnknownToken, normalize_token};
