//! Mesh generation for chunk snapshots.
//!
//! A face is emitted for every side of a non-air voxel whose neighbour is air.
//! At LOD 0 each exposed face becomes its own quad. Coarser levels merge
//! coplanar faces of the same block type into larger quads, which keeps the
//! silhouette while cutting the vertex count. The buffer format does not change
//! with the LOD.
//!
//! # Usage
//! ```no_run
//! use voxel_terrain::engine_state::rendering::meshing::{generate_mesh, MeshSnapshot};
//! use voxel_terrain::engine_state::voxels::terrain::TerrainSynthesizer;
//!
//! let chunk = TerrainSynthesizer::new(1).generate_chunk(0, 0);
//! let mesh = generate_mesh(&MeshSnapshot::capture(&chunk), 1);
//! println!("{} quads", mesh.face_count());
//! ```

mod face;
mod greedy;
mod mesh;

pub use face::Face;
pub use greedy::{greedy_merge, FaceMerger};
pub use mesh::MeshBuffers;

use crate::engine_state::voxels::block::block_side::BlockSide;

use super::snapshot::MeshSnapshot;

/// Collects every exposed face of a snapshot, one per voxel side.
pub fn visible_faces(snapshot: &MeshSnapshot) -> Vec<Face> {
    let mut faces = Vec::new();
    for block in snapshot.blocks() {
        for side in BlockSide::all() {
            if snapshot.is_face_visible(block.position, side) {
                let p = block.position;
                faces.push(Face::new(p.x, p.y, p.z, block.block_type, side));
            }
        }
    }
    faces
}

/// Builds the mesh of a snapshot at the given LOD level.
pub fn generate_mesh(snapshot: &MeshSnapshot, lod_level: usize) -> MeshBuffers {
    let faces = visible_faces(snapshot);
    if lod_level == 0 {
        MeshBuffers::from_faces(&faces)
    } else {
        MeshBuffers::from_faces(&greedy_merge(faces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::block_type::BlockType,
        chunk::{Chunk, ChunkKey},
        terrain::TerrainSynthesizer,
    };

    fn slab() -> MeshSnapshot {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        for z in 0..4 {
            for x in 0..4 {
                chunk.replace_block(x, 10, z, BlockType::STONE);
            }
        }
        MeshSnapshot::capture(&chunk)
    }

    #[test]
    fn hidden_faces_are_culled() {
        let faces = visible_faces(&slab());
        // 16 tops, 16 bottoms and 4 x 4 rim faces.
        assert_eq!(faces.len(), 48);
    }

    #[test]
    fn lod_zero_keeps_one_quad_per_face() {
        let mesh = generate_mesh(&slab(), 0);
        assert_eq!(mesh.face_count(), 48);
    }

    #[test]
    fn coarser_lods_merge_faces() {
        let mesh = generate_mesh(&slab(), 1);
        // One quad per side of the 4 x 1 x 4 slab.
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn merged_terrain_has_fewer_quads_and_the_same_area() {
        let chunk = TerrainSynthesizer::new(8).generate_chunk(2, 2);
        let snapshot = MeshSnapshot::capture(&chunk);
        let single = visible_faces(&snapshot);
        let merged = greedy_merge(single.clone());

        let area = |faces: &[Face]| faces.iter().map(|f| f.width() * f.height()).sum::<i32>();
        assert!(merged.len() < single.len());
        assert_eq!(area(&merged), area(&single));
        assert_eq!(area(&single) as usize, single.len());
    }

    #[test]
    fn empty_chunks_produce_empty_meshes() {
        let snapshot = MeshSnapshot::capture(&Chunk::empty(ChunkKey::new(3, 3)));
        assert!(generate_mesh(&snapshot, 0).is_empty());
        assert!(generate_mesh(&snapshot, 2).is_empty());
    }
}
