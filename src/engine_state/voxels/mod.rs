//! # Voxel World
//!
//! Voxel data and its generation:
//!
//! * **Block**: block types, faces, metadata and the `Block` query value
//! * **Chunk**: fixed-size 16 x 256 x 16 columns of blocks with per-column caches
//! * **Terrain**: the deterministic generator that fills chunks
//! * **ChunkStore**: the bounded cache that owns every resident chunk
//!
//! ## Data Flow
//!
//! 1. The store receives a request for a chunk or a block
//! 2. On a miss it asks the terrain generator for the chunk
//! 3. Edits replace blocks in place and mark the chunk dirty
//! 4. The chunk manager notices dirty chunks and has them remeshed

pub mod block;
pub mod chunk;
pub mod chunk_store;
pub mod terrain;
