//! Plain-text inspection reports of a mesh's buffers.
//!
//! Every section starts with a title line and a `----------` rule followed by
//! a blank line, and ends with two blank lines. The reports only read the mesh.

use crate::scene::mesh::{Mesh, NO_ADJACENCY};
use std::io::{self, Write};

fn section_header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "----------")?;
    writeln!(out)
}

fn section_footer<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out)
}

pub fn dump_vertices<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    section_header(out, "Vertices:")?;
    for (i, v) in mesh.vertices.iter().enumerate() {
        writeln!(
            out,
            "Vertex{i}:({}, {}, {}, {}, {}, {}, {}, {})",
            v.position.x,
            v.position.y,
            v.position.z,
            v.normal.x,
            v.normal.y,
            v.normal.z,
            v.texcoord.x,
            v.texcoord.y
        )?;
    }
    section_footer(out)
}

pub fn dump_indices<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    section_header(out, "Indices:")?;
    for i in 0..mesh.num_faces() {
        let [a, b, c] = mesh.face(i);
        writeln!(out, "Triangle{i}:{a} {b} {c}")?;
    }
    section_footer(out)
}

pub fn dump_attribute_buffer<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    section_header(out, "Triangle lives in subset:")?;
    for (i, attrib) in mesh.attributes.iter().enumerate() {
        writeln!(out, "Triangle lives in subset{i}: {attrib}")?;
    }
    section_footer(out)
}

/// Adjacency is recomputed with a zero epsilon; open edges print as -1.
pub fn dump_adjacency_buffer<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    section_header(out, "Adjacency Buffer:")?;
    let adjacency = mesh.generate_adjacency(0.0);
    let fmt = |n: u32| {
        if n == NO_ADJACENCY {
            "-1".to_string()
        } else {
            n.to_string()
        }
    };
    for (i, n) in adjacency.chunks_exact(3).enumerate() {
        writeln!(
            out,
            "Triangle's adjacent to triangle{i}:{} {} {}",
            fmt(n[0]),
            fmt(n[1]),
            fmt(n[2])
        )?;
    }
    section_footer(out)
}

pub fn dump_attribute_table<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    section_header(out, "Attribute Table:")?;
    for (i, entry) in mesh.attribute_table().iter().enumerate() {
        writeln!(out, "Entry {i}")?;
        writeln!(out, "-----------")?;
        writeln!(out, "Subset ID:    {}", entry.attrib_id)?;
        writeln!(out, "Face Start:   {}", entry.face_start)?;
        writeln!(out, "Face Count:   {}", entry.face_count)?;
        writeln!(out, "Vertex Start: {}", entry.vertex_start)?;
        writeln!(out, "Vertex Count: {}", entry.vertex_count)?;
        writeln!(out)?;
    }
    section_footer(out)
}

/// All five reports, in buffer order.
pub fn dump_all<W: Write>(out: &mut W, mesh: &Mesh) -> io::Result<()> {
    dump_vertices(out, mesh)?;
    dump_indices(out, mesh)?;
    dump_attribute_buffer(out, mesh)?;
    dump_adjacency_buffer(out, mesh)?;
    dump_attribute_table(out, mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use nalgebra::{Point3, Vector2, Vector3};

    fn quad() -> Mesh {
        let v = |x: f32, y: f32| {
            Vertex::new(Point3::new(x, y, 0.0), Vector3::z(), Vector2::new(x, y))
        };
        Mesh::new(
            vec![v(0.0, 1.0), v(1.0, 1.0), v(0.0, 0.0), v(1.0, 0.0)],
            vec![0, 2, 1, 1, 2, 3],
            vec![0, 1],
        )
    }

    fn render<F>(dump: F, mesh: &Mesh) -> String
    where
        F: Fn(&mut Vec<u8>, &Mesh) -> io::Result<()>,
    {
        let mut out = Vec::new();
        dump(&mut out, mesh).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn vertex_dump_format() {
        let text = render(dump_vertices, &quad());
        assert!(text.starts_with("Vertices:\n----------\n\nVertex0:(0, 1, 0, 0, 0, 1, 0, 1)\n"));
        assert!(text.ends_with("Vertex3:(1, 0, 0, 0, 0, 1, 1, 0)\n\n\n"));
    }

    #[test]
    fn index_and_attribute_dumps() {
        let mesh = quad();
        assert_eq!(
            render(dump_indices, &mesh),
            "Indices:\n----------\n\nTriangle0:0 2 1\nTriangle1:1 2 3\n\n\n"
        );
        assert_eq!(
            render(dump_attribute_buffer, &mesh),
            "Triangle lives in subset:\n----------\n\n\
             Triangle lives in subset0: 0\nTriangle lives in subset1: 1\n\n\n"
        );
    }

    #[test]
    fn adjacency_dump_marks_open_edges() {
        assert_eq!(
            render(dump_adjacency_buffer, &quad()),
            "Adjacency Buffer:\n----------\n\n\
             Triangle's adjacent to triangle0:-1 1 -1\n\
             Triangle's adjacent to triangle1:0 -1 -1\n\n\n"
        );
    }

    #[test]
    fn attribute_table_dump_lists_every_entry() {
        let text = render(dump_attribute_table, &quad());
        assert!(text.starts_with("Attribute Table:\n----------\n\nEntry 0\n-----------\n"));
        assert!(text.contains("Subset ID:    1\nFace Start:   1\nFace Count:   1\nVertex Start: 1\nVertex Count: 3\n"));
        assert_eq!(text.matches("Entry ").count(), 2);
    }

    #[test]
    fn repeated_dumps_are_identical() {
        let mesh = Mesh::create_grid(3, 1.0, 2);
        let first = render(dump_all, &mesh);
        let second = render(dump_all, &mesh);
        assert_eq!(first, second);
        assert_eq!(first.matches("----------\n\n").count(), 5);
    }
}
