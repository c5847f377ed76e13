//! Progressive meshes: a mesh whose face count can be lowered and raised at
//! runtime by replaying a precomputed sequence of edge collapses.
//!
//! Generation runs a quadric-error-metric simplifier (Garland & Heckbert) over
//! the welded point topology. Every collapse is a half-edge collapse: one point
//! moves onto a neighboring point, so no new vertices are created and each
//! collapse is recorded as a list of corner remaps plus the faces it removes.
//! Stepping the face count applies or reverts these records in order.

use crate::core::geometry::Vertex;
use crate::error::SimplifyError;
use crate::pipeline::device::Device;
use crate::scene::mesh::{Mesh, NO_ADJACENCY};
use log::debug;
use nalgebra::{Matrix4, Vector3, Vector4};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// How the minimum passed to [`ProgressiveMesh::generate`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplifyMode {
    /// Simplify until the face count would drop below the minimum.
    Face,
    /// Simplify until the welded vertex count reaches the minimum.
    Vertex,
}

/// Boundary edges are pinned by a plane perpendicular to their face, scaled by this weight.
const BOUNDARY_WEIGHT: f64 = 1000.0;

/// Collapses removing more faces than this (fins, double-sided sheets) are skipped.
const MAX_FACES_PER_COLLAPSE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CornerRemap {
    /// Index into the index buffer (face * 3 + corner).
    corner: u32,
    from: u32,
    to: u32,
}

/// One recorded edge collapse.
#[derive(Debug, Clone, Default)]
struct VertexCollapse {
    removed_faces: Vec<u32>,
    remaps: Vec<CornerRemap>,
}

/// A mesh with a runtime-adjustable face count.
#[derive(Debug, Clone)]
pub struct ProgressiveMesh {
    vertices: Vec<Vertex>,
    attributes: Vec<u32>,
    /// Index buffer at the current level of detail. Removed faces keep stale indices.
    indices: Vec<u32>,
    active: Vec<bool>,
    collapses: Vec<VertexCollapse>,
    /// `levels[k]` is the face count after the first `k` collapses; strictly decreasing.
    levels: Vec<u32>,
    applied: usize,
    subset_faces: Vec<Vec<u32>>,
}

impl ProgressiveMesh {
    /// Builds a progressive mesh from a full-detail mesh and its adjacency.
    ///
    /// `min_value` is a face count or a vertex count depending on `mode`; the
    /// simplifier stops before going below it. The returned mesh starts at full detail.
    pub fn generate(
        mesh: &Mesh,
        adjacency: &[u32],
        min_value: u32,
        mode: SimplifyMode,
    ) -> Result<Self, SimplifyError> {
        validate(mesh, adjacency)?;

        let mut simplifier = Simplifier::new(mesh, adjacency)?;
        let collapses = simplifier.run(min_value, mode);

        let face_count = mesh.num_faces() as u32;
        let mut levels = Vec::with_capacity(collapses.len() + 1);
        levels.push(face_count);
        for collapse in &collapses {
            let prev = levels.last().copied().unwrap_or(face_count);
            levels.push(prev - collapse.removed_faces.len() as u32);
        }

        let subset_count = mesh.attributes.iter().copied().max().map_or(0, |m| m as usize + 1);
        let mut subset_faces = vec![Vec::new(); subset_count];
        for (face, &attrib) in mesh.attributes.iter().enumerate() {
            subset_faces[attrib as usize].push(face as u32);
        }

        debug!(
            "Generated progressive mesh: {} collapses, faces {}..={}",
            collapses.len(),
            levels.last().copied().unwrap_or(face_count),
            face_count
        );

        Ok(Self {
            vertices: mesh.vertices.clone(),
            attributes: mesh.attributes.clone(),
            indices: mesh.indices.clone(),
            active: vec![true; mesh.num_faces()],
            collapses,
            levels,
            applied: 0,
            subset_faces,
        })
    }

    pub fn num_faces(&self) -> u32 {
        self.levels[self.applied]
    }

    pub fn max_faces(&self) -> u32 {
        self.levels[0]
    }

    pub fn min_faces(&self) -> u32 {
        self.levels[self.levels.len() - 1]
    }

    /// Every face count this mesh can represent, from full detail down.
    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    /// Number of distinct vertices referenced at the current level of detail.
    pub fn num_vertices(&self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for face in self.active_faces() {
            for &i in &self.indices[face * 3..face * 3 + 3] {
                used[i as usize] = true;
            }
        }
        used.into_iter().filter(|&u| u).count()
    }

    pub fn max_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_subsets(&self) -> usize {
        self.subset_faces.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Requests a face count.
    ///
    /// The request is clamped into `[min_faces, max_faces]`, then the mesh moves
    /// to the largest level not exceeding it. A request between two levels
    /// therefore settles on the lower one.
    pub fn set_num_faces(&mut self, faces: u32) {
        let target = faces.clamp(self.min_faces(), self.max_faces());
        let level = self.levels.partition_point(|&count| count > target);

        while self.applied < level {
            self.apply(self.applied);
            self.applied += 1;
        }
        while self.applied > level {
            self.applied -= 1;
            self.revert(self.applied);
        }
    }

    fn apply(&mut self, step: usize) {
        let collapse = &self.collapses[step];
        for remap in &collapse.remaps {
            self.indices[remap.corner as usize] = remap.to;
        }
        for &face in &collapse.removed_faces {
            self.active[face as usize] = false;
        }
    }

    fn revert(&mut self, step: usize) {
        let collapse = &self.collapses[step];
        for &face in &collapse.removed_faces {
            self.active[face as usize] = true;
        }
        for remap in collapse.remaps.iter().rev() {
            self.indices[remap.corner as usize] = remap.from;
        }
    }

    fn active_faces(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(face, &on)| on.then_some(face))
    }

    /// Triangles of one subset at the current level of detail.
    pub fn subset_triangles(&self, attrib_id: usize) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.subset_faces
            .get(attrib_id)
            .into_iter()
            .flatten()
            .filter(|&&face| self.active[face as usize])
            .map(|&face| {
                let base = face as usize * 3;
                [
                    self.indices[base],
                    self.indices[base + 1],
                    self.indices[base + 2],
                ]
            })
    }

    /// Draws the faces of one subset with the device's currently bound state.
    pub fn draw_subset(&self, device: &mut Device, attrib_id: usize) {
        device.draw_indexed_triangles(&self.vertices, self.subset_triangles(attrib_id));
    }

    /// Clones the current level of detail into a compact standalone mesh.
    ///
    /// Active faces keep their original order. Only referenced vertices are
    /// kept, renumbered in ascending original order.
    pub fn to_mesh(&self) -> Mesh {
        const UNUSED: u32 = u32::MAX;
        let mut remap = vec![UNUSED; self.vertices.len()];
        for face in self.active_faces() {
            for &i in &self.indices[face * 3..face * 3 + 3] {
                remap[i as usize] = 0;
            }
        }

        let mut vertices = Vec::new();
        for (old, slot) in remap.iter_mut().enumerate() {
            if *slot != UNUSED {
                *slot = vertices.len() as u32;
                vertices.push(self.vertices[old]);
            }
        }

        let mut indices = Vec::with_capacity(self.num_faces() as usize * 3);
        let mut attributes = Vec::with_capacity(self.num_faces() as usize);
        for face in self.active_faces() {
            for &i in &self.indices[face * 3..face * 3 + 3] {
                indices.push(remap[i as usize]);
            }
            attributes.push(self.attributes[face]);
        }

        Mesh::new(vertices, indices, attributes)
    }
}

fn validate(mesh: &Mesh, adjacency: &[u32]) -> Result<(), SimplifyError> {
    let faces = mesh.num_faces();
    if faces == 0 {
        return Err(SimplifyError::EmptyMesh);
    }
    if adjacency.len() != faces * 3 {
        return Err(SimplifyError::AdjacencySize {
            expected: faces * 3,
            found: adjacency.len(),
        });
    }

    for face in 0..faces {
        for index in mesh.face(face) {
            if index as usize >= mesh.num_vertices() {
                return Err(SimplifyError::IndexOutOfRange {
                    face: face as u32,
                    index,
                    vertex_count: mesh.num_vertices(),
                });
            }
        }
        for &neighbor in &adjacency[face * 3..face * 3 + 3] {
            if neighbor == NO_ADJACENCY {
                continue;
            }
            let n = neighbor as usize;
            let links_back = n < faces && adjacency[n * 3..n * 3 + 3].contains(&(face as u32));
            if !links_back || n == face {
                return Err(SimplifyError::InvalidAdjacency {
                    face: face as u32,
                    neighbor,
                });
            }
        }
    }
    Ok(())
}

/// A pending collapse of point `from` onto point `to`.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    from: u32,
    to: u32,
    from_version: u32,
    to_version: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed: BinaryHeap pops the cheapest collapse first, ties by lowest ids.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.from.cmp(&self.from))
            .then_with(|| other.to.cmp(&self.to))
    }
}

/// Working state of the simplifier. Points are identified by their
/// representative vertex index.
struct Simplifier<'a> {
    vertices: &'a [Vertex],
    reps: Vec<u32>,
    /// Wedges (vertices) sharing each point.
    point_vertices: Vec<Vec<u32>>,
    point_faces: Vec<Vec<u32>>,
    quadrics: Vec<Matrix4<f64>>,
    alive: Vec<bool>,
    version: Vec<u32>,
    corners: Vec<[u32; 3]>,
    active: Vec<bool>,
    face_count: usize,
    point_count: usize,
    heap: BinaryHeap<Candidate>,
}

impl<'a> Simplifier<'a> {
    fn new(mesh: &'a Mesh, adjacency: &[u32]) -> Result<Self, SimplifyError> {
        let vertices = mesh.vertices.as_slice();
        let reps = mesh.point_reps(0.0);
        let n = vertices.len();

        let mut point_vertices = vec![Vec::new(); n];
        let mut alive = vec![false; n];
        for (v, &rep) in reps.iter().enumerate() {
            point_vertices[rep as usize].push(v as u32);
            alive[rep as usize] = true;
        }

        let corners: Vec<[u32; 3]> = (0..mesh.num_faces()).map(|f| mesh.face(f)).collect();
        let mut point_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Matrix4::zeros(); n];

        for (face, c) in corners.iter().enumerate() {
            let p = c.map(|v| reps[v as usize]);
            if p[0] == p[1] || p[1] == p[2] || p[0] == p[2] {
                return Err(SimplifyError::DegenerateFace(face as u32));
            }
            for &point in &p {
                point_faces[point as usize].push(face as u32);
            }

            let pos = p.map(|point| position(vertices, point));
            let cross = (pos[1] - pos[0]).cross(&(pos[2] - pos[0]));
            let area = cross.norm() * 0.5;
            if area <= f64::EPSILON {
                // Zero-area but topologically valid; contributes no plane.
                continue;
            }
            let normal = cross.normalize();
            let face_quadric = plane_quadric(&normal, &pos[0]) * area;
            for &point in &p {
                quadrics[point as usize] += face_quadric;
            }

            for slot in 0..3 {
                if adjacency[face * 3 + slot] != NO_ADJACENCY {
                    continue;
                }
                let (a, b) = (pos[slot], pos[(slot + 1) % 3]);
                let edge = b - a;
                let len_sq = edge.norm_squared();
                if len_sq <= f64::EPSILON {
                    continue;
                }
                let side = edge.cross(&normal).normalize();
                let constraint = plane_quadric(&side, &a) * (BOUNDARY_WEIGHT * len_sq);
                quadrics[p[slot] as usize] += constraint;
                quadrics[p[(slot + 1) % 3] as usize] += constraint;
            }
        }

        let point_count = alive.iter().filter(|&&a| a).count();
        let mut simplifier = Self {
            vertices,
            reps,
            point_vertices,
            point_faces,
            quadrics,
            alive,
            version: vec![0; n],
            corners,
            active: vec![true; mesh.num_faces()],
            face_count: mesh.num_faces(),
            point_count,
            heap: BinaryHeap::new(),
        };

        for face in 0..simplifier.corners.len() {
            let p = simplifier.face_points(face);
            for slot in 0..3 {
                let (a, b) = (p[slot], p[(slot + 1) % 3]);
                simplifier.push_candidate(a, b);
                simplifier.push_candidate(b, a);
            }
        }
        Ok(simplifier)
    }

    fn face_points(&self, face: usize) -> [u32; 3] {
        self.corners[face].map(|v| self.reps[v as usize])
    }

    fn push_candidate(&mut self, from: u32, to: u32) {
        let q = self.quadrics[from as usize] + self.quadrics[to as usize];
        let p = position(self.vertices, to);
        let v = Vector4::new(p.x, p.y, p.z, 1.0);
        let cost = v.dot(&(q * v)).max(0.0);
        self.heap.push(Candidate {
            cost,
            from,
            to,
            from_version: self.version[from as usize],
            to_version: self.version[to as usize],
        });
    }

    fn faces_around(&self, point: u32) -> Vec<u32> {
        self.point_faces[point as usize]
            .iter()
            .copied()
            .filter(|&f| self.active[f as usize])
            .collect()
    }

    fn neighbors(&self, point: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .faces_around(point)
            .into_iter()
            .flat_map(|f| self.face_points(f as usize))
            .filter(|&p| p != point)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn run(&mut self, min_value: u32, mode: SimplifyMode) -> Vec<VertexCollapse> {
        let min_value = min_value as usize;
        let mut collapses = Vec::new();

        while let Some(candidate) = self.heap.pop() {
            if mode == SimplifyMode::Vertex && self.point_count <= min_value.max(1) {
                break;
            }
            let (from, to) = (candidate.from, candidate.to);
            if !self.alive[from as usize]
                || !self.alive[to as usize]
                || self.version[from as usize] != candidate.from_version
                || self.version[to as usize] != candidate.to_version
            {
                continue;
            }

            let around = self.faces_around(from);
            let (removed, kept): (Vec<u32>, Vec<u32>) = around
                .into_iter()
                .partition(|&f| self.face_points(f as usize).contains(&to));

            // Each vertex split must restore at most two faces so that a +2
            // request always reaches the next level.
            if removed.is_empty() || removed.len() > MAX_FACES_PER_COLLAPSE {
                continue;
            }
            if mode == SimplifyMode::Face && self.face_count - removed.len() < min_value.max(1) {
                continue;
            }
            if !self.is_valid_collapse(from, to, removed.len(), &kept) {
                continue;
            }

            collapses.push(self.collapse(from, to, removed, kept));
        }

        collapses
    }

    /// Rejects collapses that fold the surface or pinch it into a non-manifold shape.
    fn is_valid_collapse(&self, from: u32, to: u32, removed: usize, kept: &[u32]) -> bool {
        let from_neighbors = self.neighbors(from);
        let to_neighbors = self.neighbors(to);
        let shared = from_neighbors
            .iter()
            .filter(|p| to_neighbors.binary_search(p).is_ok())
            .count();
        if shared > removed {
            return false;
        }

        let target = position(self.vertices, to);
        kept.iter().all(|&face| {
            let points = self.face_points(face as usize);
            let before = points.map(|p| position(self.vertices, p));
            let after = points.map(|p| if p == from { target } else { position(self.vertices, p) });

            let n_before = (before[1] - before[0]).cross(&(before[2] - before[0]));
            let n_after = (after[1] - after[0]).cross(&(after[2] - after[0]));
            let degenerate = n_after.norm_squared() <= 1e-12 * n_before.norm_squared().max(1e-30);
            !degenerate && n_before.dot(&n_after) > 0.0
        })
    }

    fn collapse(&mut self, from: u32, to: u32, removed: Vec<u32>, kept: Vec<u32>) -> VertexCollapse {
        for &face in &removed {
            self.active[face as usize] = false;
        }
        self.face_count -= removed.len();

        let mut remaps = Vec::new();
        for &face in &kept {
            for slot in 0..3 {
                let vertex = self.corners[face as usize][slot];
                if self.reps[vertex as usize] != from {
                    continue;
                }
                let wedge = self.closest_wedge(vertex, to);
                self.corners[face as usize][slot] = wedge;
                remaps.push(CornerRemap {
                    corner: face * 3 + slot as u32,
                    from: vertex,
                    to: wedge,
                });
            }
        }

        let active = &self.active;
        let mut merged: Vec<u32> = self.point_faces[to as usize]
            .iter()
            .copied()
            .filter(|&f| active[f as usize])
            .collect();
        merged.extend_from_slice(&kept);
        merged.sort_unstable();
        merged.dedup();
        self.point_faces[to as usize] = merged;
        self.point_faces[from as usize].clear();

        let moved = self.quadrics[from as usize];
        self.quadrics[to as usize] += moved;
        self.alive[from as usize] = false;
        self.point_count -= 1;
        self.version[from as usize] += 1;
        self.version[to as usize] += 1;

        for neighbor in self.neighbors(to) {
            self.push_candidate(neighbor, to);
            self.push_candidate(to, neighbor);
        }

        VertexCollapse {
            removed_faces: removed,
            remaps,
        }
    }

    /// The vertex at `point` whose normal and UV are closest to `vertex`'s.
    fn closest_wedge(&self, vertex: u32, point: u32) -> u32 {
        let source = &self.vertices[vertex as usize];
        self.point_vertices[point as usize]
            .iter()
            .copied()
            .min_by(|&a, &b| {
                let da = source.attribute_distance_squared(&self.vertices[a as usize]);
                let db = source.attribute_distance_squared(&self.vertices[b as usize]);
                da.total_cmp(&db).then(a.cmp(&b))
            })
            .unwrap_or(point)
    }
}

fn position(vertices: &[Vertex], point: u32) -> Vector3<f64> {
    vertices[point as usize].position.coords.cast::<f64>()
}

/// Quadric of squared distance to the plane through `point` with unit `normal`.
fn plane_quadric(normal: &Vector3<f64>, point: &Vector3<f64>) -> Matrix4<f64> {
    let plane = Vector4::new(normal.x, normal.y, normal.z, -normal.dot(point));
    plane * plane.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use nalgebra::{Point3, Vector2};

    fn grid_pmesh(divisions: u32, subsets: u32) -> (Mesh, ProgressiveMesh) {
        let mesh = Mesh::create_grid(divisions, 4.0, subsets);
        let adjacency = mesh.generate_adjacency(0.0);
        let pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();
        (mesh, pmesh)
    }

    /// Closed octahedron with per-face (unshared) vertices, like a flat-shaded asset.
    fn octahedron() -> Mesh {
        let p = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for face in faces {
            let n = (p[face[1]] - p[face[0]])
                .cross(&(p[face[2]] - p[face[0]]))
                .normalize();
            for i in face {
                indices.push(vertices.len() as u32);
                vertices.push(Vertex::new(p[i], n, Vector2::zeros()));
            }
        }
        Mesh::new(vertices, indices, vec![0; faces.len()])
    }

    /// A grid with a reversed copy of every face sharing its vertices.
    fn double_sided_grid(divisions: u32) -> Mesh {
        let mut mesh = Mesh::create_grid(divisions, 4.0, 1);
        let back: Vec<u32> = mesh
            .indices
            .chunks_exact(3)
            .flat_map(|f| [f[0], f[2], f[1]])
            .collect();
        mesh.indices.extend(back);
        mesh.attributes.extend(vec![0; mesh.attributes.len()]);
        mesh
    }

    #[test]
    fn starts_at_full_detail() {
        let (mesh, pmesh) = grid_pmesh(6, 1);
        assert_eq!(pmesh.num_faces() as usize, mesh.num_faces());
        assert_eq!(pmesh.max_faces() as usize, mesh.num_faces());
        assert!(pmesh.min_faces() >= 1);
        assert!(pmesh.min_faces() < pmesh.max_faces());
    }

    #[test]
    fn levels_strictly_decrease() {
        let (_, pmesh) = grid_pmesh(6, 2);
        assert!(pmesh.levels().windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn every_level_is_reached_exactly() {
        let (_, mut pmesh) = grid_pmesh(6, 2);
        let levels = pmesh.levels().to_vec();
        for &level in levels.iter().rev().chain(levels.iter()) {
            pmesh.set_num_faces(level);
            assert_eq!(pmesh.num_faces(), level);
        }
    }

    #[test]
    fn double_sided_sheet_levels_differ_by_at_most_two() {
        let mesh = double_sided_grid(4);
        let adjacency = mesh.generate_adjacency(0.0);
        let pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();

        assert_eq!(pmesh.max_faces(), 64);
        for pair in pmesh.levels().windows(2) {
            assert!(pair[0] - pair[1] <= 2, "gap in {:?}", pmesh.levels());
        }
    }

    #[test]
    fn request_between_levels_settles_on_lower_level() {
        let (_, mut pmesh) = grid_pmesh(6, 1);
        let gap = pmesh
            .levels()
            .windows(2)
            .find(|w| w[0] - w[1] == 2)
            .map(|w| (w[0], w[1]))
            .expect("interior collapses remove two faces");
        pmesh.set_num_faces(gap.0 - 1);
        assert_eq!(pmesh.num_faces(), gap.1);
    }

    #[test]
    fn requests_are_clamped_to_range() {
        let (_, mut pmesh) = grid_pmesh(5, 1);
        let (min, max) = (pmesh.min_faces(), pmesh.max_faces());

        pmesh.set_num_faces(max + 1);
        assert_eq!(pmesh.num_faces(), max);

        pmesh.set_num_faces(0);
        assert_eq!(pmesh.num_faces(), min);

        pmesh.set_num_faces(u32::MAX);
        assert_eq!(pmesh.num_faces(), max);
    }

    #[test]
    fn returning_to_full_detail_restores_source_mesh() {
        let (mesh, mut pmesh) = grid_pmesh(6, 3);
        pmesh.set_num_faces(0);
        pmesh.set_num_faces(pmesh.max_faces() / 2);
        pmesh.set_num_faces(pmesh.max_faces());
        assert_eq!(pmesh.to_mesh(), mesh);
    }

    #[test]
    fn reduced_meshes_stay_well_formed() {
        let (_, mut pmesh) = grid_pmesh(6, 2);
        let levels = pmesh.levels().to_vec();
        for level in levels {
            pmesh.set_num_faces(level);
            let clone = pmesh.to_mesh();
            assert_eq!(clone.num_faces() as u32, level);
            assert_eq!(clone.num_vertices(), pmesh.num_vertices());
            for f in 0..clone.num_faces() {
                let [a, b, c] = clone.face(f);
                assert!(a != b && b != c && a != c, "face {f} degenerate at level {level}");
                assert!((c as usize) < clone.num_vertices());
            }
        }
    }

    #[test]
    fn subset_triangles_partition_active_faces() {
        let (_, mut pmesh) = grid_pmesh(6, 3);
        pmesh.set_num_faces(pmesh.max_faces() / 2);
        let drawn: usize = (0..pmesh.num_subsets())
            .map(|s| pmesh.subset_triangles(s).count())
            .sum();
        assert_eq!(drawn as u32, pmesh.num_faces());
        assert_eq!(pmesh.subset_triangles(99).count(), 0);
    }

    #[test]
    fn closed_mesh_with_split_wedges_simplifies() {
        let mesh = octahedron();
        let adjacency = mesh.generate_adjacency(0.0);
        assert!(adjacency.iter().all(|&n| n != NO_ADJACENCY));

        let mut pmesh = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap();
        assert_eq!(pmesh.max_faces(), 8);
        assert!(pmesh.min_faces() < 8);
        pmesh.set_num_faces(0);
        assert_eq!(pmesh.num_faces(), pmesh.min_faces());
    }

    #[test]
    fn vertex_mode_stops_at_requested_vertex_count() {
        let mesh = Mesh::create_grid(4, 1.0, 1);
        let adjacency = mesh.generate_adjacency(0.0);
        let mut pmesh =
            ProgressiveMesh::generate(&mesh, &adjacency, 20, SimplifyMode::Vertex).unwrap();
        pmesh.set_num_faces(0);
        assert!(pmesh.num_vertices() >= 20);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mesh = Mesh::new(Vec::new(), Vec::new(), Vec::new());
        let err = ProgressiveMesh::generate(&mesh, &[], 1, SimplifyMode::Face).unwrap_err();
        assert_eq!(err, SimplifyError::EmptyMesh);
    }

    #[test]
    fn wrong_adjacency_length_is_rejected() {
        let mesh = Mesh::create_grid(2, 1.0, 1);
        let err = ProgressiveMesh::generate(&mesh, &[NO_ADJACENCY; 3], 1, SimplifyMode::Face)
            .unwrap_err();
        assert_eq!(
            err,
            SimplifyError::AdjacencySize {
                expected: 24,
                found: 3
            }
        );
    }

    #[test]
    fn one_sided_adjacency_is_rejected() {
        let mesh = Mesh::create_grid(2, 1.0, 1);
        let mut adjacency = vec![NO_ADJACENCY; mesh.num_faces() * 3];
        adjacency[0] = 5;
        let err = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap_err();
        assert_eq!(
            err,
            SimplifyError::InvalidAdjacency {
                face: 0,
                neighbor: 5
            }
        );
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = Mesh::create_grid(1, 1.0, 1);
        mesh.indices[4] = 42;
        let adjacency = vec![NO_ADJACENCY; 6];
        let err = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap_err();
        assert!(matches!(
            err,
            SimplifyError::IndexOutOfRange {
                face: 1,
                index: 42,
                ..
            }
        ));
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let mut mesh = Mesh::create_grid(1, 1.0, 1);
        mesh.indices[1] = mesh.indices[0];
        let adjacency = mesh.generate_adjacency(0.0);
        let err = ProgressiveMesh::generate(&mesh, &adjacency, 1, SimplifyMode::Face).unwrap_err();
        assert_eq!(err, SimplifyError::DegenerateFace(0));
    }
}
