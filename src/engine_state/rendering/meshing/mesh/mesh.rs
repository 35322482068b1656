//! Mesh buffers for chunk geometry.
//!
//! A mesh is five parallel buffers: positions, normals, uvs and texture tiles per
//! vertex, plus a triangle index list. Every face contributes four vertices and
//! six indices, whatever its size, so the format is the same at every LOD.

use crate::engine_state::voxels::block::Block;

use super::face::Face;

/// Renderable geometry of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// World-space vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Two counter-clockwise triangles per face.
    pub indices: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates in blocks, so a merged face repeats its tile.
    pub uvs: Vec<[f32; 2]>,
    /// Texture tile of each vertex.
    pub tiles: Vec<u32>,
}

impl MeshBuffers {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from a list of faces.
    pub fn from_faces(faces: &[Face]) -> Self {
        let mut mesh = MeshBuffers {
            vertices: Vec::with_capacity(faces.len() * 4),
            indices: Vec::with_capacity(faces.len() * 6),
            normals: Vec::with_capacity(faces.len() * 4),
            uvs: Vec::with_capacity(faces.len() * 4),
            tiles: Vec::with_capacity(faces.len() * 4),
        };
        for face in faces {
            mesh.push_face(face);
        }
        mesh
    }

    /// Appends one quad.
    pub fn push_face(&mut self, face: &Face) {
        let first_index = self.vertices.len() as u32;
        let normal = face.block_side.normal();
        let tile = Block::get_texture_index_from_int(face.block_type_int, face.block_side);
        let (u, v) = (face.width() as f32, face.height() as f32);

        for (corner, uv) in [
            (face.ll, [0.0, v]),
            (face.lr, [u, v]),
            (face.ul, [0.0, 0.0]),
            (face.ur, [u, 0.0]),
        ] {
            self.vertices
                .push([corner.x as f32, corner.y as f32, corner.z as f32]);
            self.normals.push([normal.x, normal.y, normal.z]);
            self.uvs.push(uv);
            self.tiles.push(tile);
        }

        self.indices
            .extend(Self::generate_face_indices(first_index));
    }

    /// Index data for a quad whose first vertex is `first_index`.
    ///
    /// The vertices are ordered ll, lr, ul, ur, which gives the triangles
    /// (ll, lr, ur) and (ll, ur, ul).
    pub fn generate_face_indices(first_index: u32) -> [u32; 6] {
        [
            first_index,
            first_index + 1,
            first_index + 3,
            first_index,
            first_index + 3,
            first_index + 2,
        ]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw bytes of the position buffer, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn tile_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tiles)
    }

    /// Total size of all buffers in bytes.
    pub fn byte_len(&self) -> usize {
        self.vertex_bytes().len()
            + self.index_bytes().len()
            + self.normal_bytes().len()
            + self.uv_bytes().len()
            + self.tile_bytes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    #[test]
    fn every_face_adds_four_vertices_and_six_indices() {
        let faces = [
            Face::new(0, 0, 0, 1, BlockSide::TOP),
            Face::new(0, 0, 0, 1, BlockSide::FRONT),
        ];
        let mesh = MeshBuffers::from_faces(&faces);

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.normals.len(), 8);
        assert_eq!(mesh.uvs.len(), 8);
        assert_eq!(mesh.tiles.len(), 8);
        assert_eq!(&mesh.indices[6..], &[4, 5, 7, 4, 7, 6]);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn merged_faces_stretch_their_uvs() {
        let wide = Face::new(0, 0, 0, 2, BlockSide::RIGHT)
            .merge_right(&Face::new(1, 0, 0, 2, BlockSide::RIGHT));
        let mesh = MeshBuffers::from_faces(&wide.into_iter().collect::<Vec<_>>());

        assert_eq!(mesh.uvs, vec![[0.0, 1.0], [2.0, 1.0], [0.0, 0.0], [2.0, 0.0]]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn byte_views_cover_every_buffer() {
        let mesh = MeshBuffers::from_faces(&[Face::new(1, 2, 3, 3, BlockSide::TOP)]);
        assert_eq!(mesh.vertex_bytes().len(), 4 * 12);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
        assert_eq!(mesh.byte_len(), 48 + 24 + 48 + 32 + 16);
    }
}
