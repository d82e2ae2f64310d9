use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::format::Exporter;
use crate::scene::{Mesh, SceneGraph};

/// Writes the scene as ASCII Wavefront OBJ. Every mesh becomes a named
/// object; vertex indices are global and 1-based as the format demands.
#[derive(Default)]
pub struct ObjExporter {}

impl Exporter for ObjExporter {
    fn export(&self, graph: &SceneGraph, path: &Path) -> Result<()> {
        fs::write(path, render(graph)?)?;
        Ok(())
    }
}

fn render(graph: &SceneGraph) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "# {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;

    let mut offset = 1;
    for (index, mesh) in graph.meshes.iter().enumerate() {
        if mesh.name.is_empty() {
            writeln!(out, "o mesh_{}", index)?;
        } else {
            writeln!(out, "o {}", mesh.name)?;
        }

        for position in &mesh.positions {
            writeln!(out, "v {} {} {}", position.x, position.y, position.z)?;
        }
        if let Some(uvs) = mesh.uv_channels.first() {
            for uv in uvs {
                writeln!(out, "vt {} {}", uv.x, uv.y)?;
            }
        }
        for normal in &mesh.normals {
            writeln!(out, "vn {} {} {}", normal.x, normal.y, normal.z)?;
        }

        for face in &mesh.faces {
            out.push('f');
            for &index in face {
                out.push(' ');
                write_face_vertex(&mut out, mesh, offset + index as usize)?;
            }
            out.push('\n');
        }

        offset += mesh.positions.len();
    }

    Ok(out)
}

fn write_face_vertex(out: &mut String, mesh: &Mesh, index: usize) -> Result<()> {
    match (mesh.has_tex_coords(), mesh.has_normals()) {
        (true, true) => write!(out, "{0}/{0}/{0}", index)?,
        (true, false) => write!(out, "{0}/{0}", index)?,
        (false, true) => write!(out, "{0}//{0}", index)?,
        (false, false) => write!(out, "{}", index)?,
    }
    Ok(())
}
