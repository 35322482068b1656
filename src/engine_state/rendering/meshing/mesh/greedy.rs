//! Greedy face merging.
//!
//! Coplanar faces of the same block type that share a full edge are merged
//! into one larger quad. Each side of the block has its own merger, and every
//! merged face is retried against its new neighbours, so runs grow into
//! rectangles as faces arrive.

use std::collections::HashMap;

use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

use super::face::Face;

type Edge = (Point3<i32>, Point3<i32>);

/// Accumulates faces of one side and merges them as they are added.
#[derive(Default)]
pub struct FaceMerger {
    faces: Vec<Option<Face>>,
    /// Faces indexed by their upper edge `(ul, ur)`.
    by_upper: HashMap<Edge, usize>,
    /// Faces indexed by their lower edge `(ll, lr)`.
    by_lower: HashMap<Edge, usize>,
    /// Faces indexed by their right edge `(lr, ur)`.
    by_right: HashMap<Edge, usize>,
    /// Faces indexed by their left edge `(ll, ul)`.
    by_left: HashMap<Edge, usize>,
}

impl FaceMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a face, merging it with already collected faces where possible.
    pub fn add(&mut self, face: Face) {
        let mut current = face;
        while let Some(index) = self.find_partner(&current) {
            let Some(partner) = self.take(index) else {
                break;
            };
            match partner.try_merge(&current) {
                Some(merged) => current = merged,
                None => {
                    self.insert(partner);
                    break;
                }
            }
        }
        self.insert(current);
    }

    /// The merged faces, in insertion order of their surviving slots.
    pub fn into_faces(self) -> Vec<Face> {
        self.faces.into_iter().flatten().collect()
    }

    fn find_partner(&self, face: &Face) -> Option<usize> {
        let candidates = [
            self.by_upper.get(&(face.ll, face.lr)),
            self.by_lower.get(&(face.ul, face.ur)),
            self.by_right.get(&(face.ll, face.ul)),
            self.by_left.get(&(face.lr, face.ur)),
        ];
        candidates.into_iter().flatten().copied().find(|&index| {
            self.faces[index]
                .as_ref()
                .is_some_and(|partner| partner.try_merge(face).is_some())
        })
    }

    fn insert(&mut self, face: Face) {
        let index = self.faces.len();
        self.faces.push(Some(face));
        self.by_upper.insert((face.ul, face.ur), index);
        self.by_lower.insert((face.ll, face.lr), index);
        self.by_right.insert((face.lr, face.ur), index);
        self.by_left.insert((face.ll, face.ul), index);
    }

    fn take(&mut self, index: usize) -> Option<Face> {
        let face = self.faces.get_mut(index)?.take()?;
        self.by_upper.remove(&(face.ul, face.ur));
        self.by_lower.remove(&(face.ll, face.lr));
        self.by_right.remove(&(face.lr, face.ur));
        self.by_left.remove(&(face.ll, face.ul));
        Some(face)
    }
}

/// Merges a list of faces side by side.
///
/// # Returns
/// The merged faces grouped in `BlockSide` order.
pub fn greedy_merge(faces: impl IntoIterator<Item = Face>) -> Vec<Face> {
    let mut mergers: [FaceMerger; 6] = Default::default();
    for face in faces {
        mergers[face.block_side as usize].add(face);
    }
    BlockSide::all()
        .into_iter()
        .flat_map(|side| std::mem::take(&mut mergers[side as usize]).into_faces())
        .collect()
}
