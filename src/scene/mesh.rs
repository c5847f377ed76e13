use crate::core::geometry::Vertex;
use nalgebra::{Point3, Vector2, Vector3};
use std::collections::HashMap;

/// Marks a missing neighbor in an adjacency buffer.
pub const NO_ADJACENCY: u32 = u32::MAX;

/// One entry of a mesh's attribute table: the face and vertex ranges used by one subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRange {
    pub attrib_id: u32,
    pub face_start: u32,
    pub face_count: u32,
    pub vertex_start: u32,
    pub vertex_count: u32,
}

/// An indexed triangle list with a per-face attribute (subset id) buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Three indices per face.
    pub indices: Vec<u32>,
    /// One subset id per face.
    pub attributes: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, attributes: Vec<u32>) -> Self {
        debug_assert_eq!(indices.len() % 3, 0);
        debug_assert_eq!(indices.len() / 3, attributes.len());
        Self {
            vertices,
            indices,
            attributes,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face(&self, face: usize) -> [u32; 3] {
        [
            self.indices[face * 3],
            self.indices[face * 3 + 1],
            self.indices[face * 3 + 2],
        ]
    }

    /// Maps every vertex to the lowest-index vertex at the same position
    /// (within `epsilon` on every axis).
    pub fn point_reps(&self, epsilon: f32) -> Vec<u32> {
        point_reps(&self.vertices, epsilon)
    }

    /// Computes the adjacency buffer: for each face, the neighbor across each
    /// of its three edges (`NO_ADJACENCY` on open edges).
    ///
    /// Edge i of a face runs from corner i to corner (i + 1) % 3. Vertices are
    /// compared by position with tolerance `epsilon`, so faces split by a
    /// normal or UV seam are still adjacent.
    pub fn generate_adjacency(&self, epsilon: f32) -> Vec<u32> {
        let reps = self.point_reps(epsilon);
        let face_count = self.num_faces();
        let mut adjacency = vec![NO_ADJACENCY; face_count * 3];

        // Undirected edge -> (face, edge slot, forward?) in face order.
        let mut edges: HashMap<(u32, u32), Vec<(u32, u8, bool)>> = HashMap::new();
        for face in 0..face_count {
            let corners = self.face(face).map(|i| reps[i as usize]);
            for slot in 0..3 {
                let a = corners[slot];
                let b = corners[(slot + 1) % 3];
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                edges
                    .entry(key)
                    .or_default()
                    .push((face as u32, slot as u8, a < b));
            }
        }

        for group in edges.values() {
            for (i, &(face, slot, forward)) in group.iter().enumerate() {
                let here = face as usize * 3 + slot as usize;
                if adjacency[here] != NO_ADJACENCY {
                    continue;
                }
                let free = |&&(other, other_slot, _): &&(u32, u8, bool)| {
                    other != face && adjacency[other as usize * 3 + other_slot as usize] == NO_ADJACENCY
                };
                // Prefer a consistently wound partner (edge traversed the other way).
                let partner = group[i + 1..]
                    .iter()
                    .filter(free)
                    .find(|&&(_, _, f)| f != forward)
                    .or_else(|| group[i + 1..].iter().find(free));

                if let Some(&(other, other_slot, _)) = partner {
                    adjacency[here] = other;
                    adjacency[other as usize * 3 + other_slot as usize] = face;
                }
            }
        }

        adjacency
    }

    /// Reorders faces so that faces of the same subset are contiguous,
    /// keeping the relative order within a subset.
    ///
    /// Returns the face remap: `remap[new_face] = old_face`.
    pub fn optimize_attribute_sort(&mut self) -> Vec<u32> {
        let mut remap: Vec<u32> = (0..self.num_faces() as u32).collect();
        remap.sort_by_key(|&f| self.attributes[f as usize]);

        let mut indices = Vec::with_capacity(self.indices.len());
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for &old in &remap {
            indices.extend_from_slice(&self.face(old as usize));
            attributes.push(self.attributes[old as usize]);
        }
        self.indices = indices;
        self.attributes = attributes;
        remap
    }

    /// One entry per run of consecutive faces sharing a subset id.
    ///
    /// Vertex ranges span the lowest to highest index referenced by the run,
    /// so ranges of different subsets may overlap.
    pub fn attribute_table(&self) -> Vec<AttributeRange> {
        let mut table: Vec<AttributeRange> = Vec::new();
        let mut vertex_bounds: Vec<(u32, u32)> = Vec::new();

        for face in 0..self.num_faces() {
            let attrib_id = self.attributes[face];
            let corners = self.face(face);
            let lo = corners.iter().copied().min().unwrap_or(0);
            let hi = corners.iter().copied().max().unwrap_or(0);

            match table.last_mut() {
                Some(range) if range.attrib_id == attrib_id => {
                    range.face_count += 1;
                    if let Some(bounds) = vertex_bounds.last_mut() {
                        *bounds = (bounds.0.min(lo), bounds.1.max(hi));
                    }
                }
                _ => {
                    table.push(AttributeRange {
                        attrib_id,
                        face_start: face as u32,
                        face_count: 1,
                        vertex_start: 0,
                        vertex_count: 0,
                    });
                    vertex_bounds.push((lo, hi));
                }
            }
        }

        for (range, (lo, hi)) in table.iter_mut().zip(vertex_bounds) {
            range.vertex_start = lo;
            range.vertex_count = hi - lo + 1;
        }
        table
    }

    /// Replaces all normals with area-weighted averages of the adjacent face
    /// normals. Vertices at the same position share one normal.
    pub fn compute_smooth_normals(&mut self) {
        let reps = self.point_reps(0.0);
        let mut accum = vec![Vector3::zeros(); self.vertices.len()];

        for face in 0..self.num_faces() {
            let [a, b, c] = self.face(face);
            let pa = self.vertices[a as usize].position;
            let pb = self.vertices[b as usize].position;
            let pc = self.vertices[c as usize].position;
            // Unnormalized: length is twice the face area.
            let n = (pb - pa).cross(&(pc - pa));
            for i in [a, b, c] {
                accum[reps[i as usize] as usize] += n;
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            let n = accum[reps[i] as usize];
            vertex.normal = if n.norm_squared() > 1e-12 {
                n.normalize()
            } else {
                Vector3::y()
            };
        }
    }

    /// A flat, square grid in the XY plane facing -Z, `divisions` quads per side,
    /// two triangles per quad. Columns are split evenly into `subsets` attribute ids.
    pub fn create_grid(divisions: u32, size: f32, subsets: u32) -> Self {
        let n = divisions.max(1);
        let subsets = subsets.clamp(1, n);
        let step = size / n as f32;
        let half = size / 2.0;

        let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
        for row in 0..=n {
            for col in 0..=n {
                vertices.push(Vertex::new(
                    Point3::new(col as f32 * step - half, row as f32 * step - half, 0.0),
                    Vector3::new(0.0, 0.0, -1.0),
                    Vector2::new(col as f32 / n as f32, row as f32 / n as f32),
                ));
            }
        }

        let mut indices = Vec::with_capacity((n * n * 6) as usize);
        let mut attributes = Vec::with_capacity((n * n * 2) as usize);
        let at = |row: u32, col: u32| row * (n + 1) + col;
        for col in 0..n {
            let attrib = col * subsets / n;
            for row in 0..n {
                let (a, b, c, d) = (
                    at(row, col),
                    at(row, col + 1),
                    at(row + 1, col),
                    at(row + 1, col + 1),
                );
                indices.extend_from_slice(&[a, c, b, b, c, d]);
                attributes.extend_from_slice(&[attrib, attrib]);
            }
        }

        Self::new(vertices, indices, attributes)
    }
}

/// Lowest-index vertex within `epsilon` (per axis) of each vertex.
pub fn point_reps(vertices: &[Vertex], epsilon: f32) -> Vec<u32> {
    const UNSET: u32 = u32::MAX;
    let epsilon = epsilon.max(0.0);

    let mut by_x: Vec<u32> = (0..vertices.len() as u32).collect();
    by_x.sort_by(|&a, &b| {
        vertices[a as usize]
            .position
            .x
            .total_cmp(&vertices[b as usize].position.x)
    });
    let sorted_x: Vec<f32> = by_x
        .iter()
        .map(|&i| vertices[i as usize].position.x)
        .collect();

    let mut reps = vec![UNSET; vertices.len()];
    for i in 0..vertices.len() {
        if reps[i] != UNSET {
            continue;
        }
        reps[i] = i as u32;
        let p = vertices[i].position;

        let start = sorted_x.partition_point(|&x| x < p.x - epsilon);
        for &j in &by_x[start..] {
            let q = vertices[j as usize].position;
            if q.x > p.x + epsilon {
                break;
            }
            let j = j as usize;
            if reps[j] == UNSET && (q - p).amax() <= epsilon {
                reps[j] = i as u32;
            }
        }
    }
    reps
}
