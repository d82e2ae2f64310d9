use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Result;
use byteorder::{WriteBytesExt, LE};
use glam::Vec3A;

use crate::format::Exporter;
use crate::scene::SceneGraph;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Writes the scene as STL, ASCII or binary. STL carries bare triangles, so
/// all meshes merge into one solid and every other attribute is dropped;
/// facet normals are recomputed from the triangle winding.
pub struct StlExporter {
    binary: bool,
}

impl StlExporter {
    pub fn ascii() -> Self {
        Self { binary: false }
    }

    pub fn binary() -> Self {
        Self { binary: true }
    }
}

impl Exporter for StlExporter {
    fn export(&self, graph: &SceneGraph, path: &Path) -> Result<()> {
        if self.binary {
            fs::write(path, render_binary(graph)?)?;
        } else {
            fs::write(path, render_ascii(graph)?)?;
        }
        Ok(())
    }
}

fn facet_normal(a: Vec3A, b: Vec3A, c: Vec3A) -> Vec3A {
    (b - a).cross(c - a).normalize_or_zero()
}

fn triangles(graph: &SceneGraph) -> impl Iterator<Item = [Vec3A; 3]> + '_ {
    graph.meshes.iter().flat_map(|mesh| {
        mesh.faces.iter().map(move |face| {
            [
                mesh.positions[face[0] as usize],
                mesh.positions[face[1] as usize],
                mesh.positions[face[2] as usize],
            ]
        })
    })
}

fn render_ascii(graph: &SceneGraph) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "solid scene")?;

    for [a, b, c] in triangles(graph) {
        let normal = facet_normal(a, b, c);
        writeln!(out, "  facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(out, "    outer loop")?;
        for vertex in [a, b, c] {
            writeln!(out, "      vertex {} {} {}", vertex.x, vertex.y, vertex.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }

    writeln!(out, "endsolid scene")?;
    Ok(out)
}

fn render_binary(graph: &SceneGraph) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    let mut header = [0u8; HEADER_SIZE];
    let tag = env!("CARGO_PKG_NAME").as_bytes();
    header[..tag.len()].copy_from_slice(tag);
    out.extend_from_slice(&header);

    out.write_u32::<LE>(graph.num_faces() as u32)?;

    for [a, b, c] in triangles(graph) {
        let normal = facet_normal(a, b, c);
        for vector in [normal, a, b, c] {
            for &component in vector.as_ref() {
                out.write_f32::<LE>(component)?;
            }
        }
        // Attribute byte count, unused.
        out.write_u16::<LE>(0)?;
    }

    Ok(out)
}
