use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Result;
use byteorder::{WriteBytesExt, LE};

use crate::format::Exporter;
use crate::scene::SceneGraph;

/// Writes the scene as PLY, ASCII or binary little-endian. PLY holds a
/// single vertex element, so all meshes merge with rebased face indices.
/// Normals and the first UV channel are emitted only when every mesh
/// carries them, since properties apply to the whole element.
pub struct PlyExporter {
    binary: bool,
}

impl PlyExporter {
    pub fn ascii() -> Self {
        Self { binary: false }
    }

    pub fn binary() -> Self {
        Self { binary: true }
    }
}

impl Exporter for PlyExporter {
    fn export(&self, graph: &SceneGraph, path: &Path) -> Result<()> {
        let with_normals = !graph.meshes.is_empty()
            && graph.meshes.iter().all(|mesh| mesh.has_normals());
        let with_uvs = !graph.meshes.is_empty()
            && graph.meshes.iter().all(|mesh| mesh.has_tex_coords());

        let mut out = Vec::new();
        out.extend_from_slice(self.header(graph, with_normals, with_uvs)?.as_bytes());

        if self.binary {
            self.write_binary_body(graph, with_normals, with_uvs, &mut out)?;
        } else {
            self.write_ascii_body(graph, with_normals, with_uvs, &mut out)?;
        }

        fs::write(path, out)?;
        Ok(())
    }
}

impl PlyExporter {
    fn header(&self, graph: &SceneGraph, with_normals: bool, with_uvs: bool) -> Result<String> {
        let mut header = String::new();

        writeln!(header, "ply")?;
        if self.binary {
            writeln!(header, "format binary_little_endian 1.0")?;
        } else {
            writeln!(header, "format ascii 1.0")?;
        }
        writeln!(
            header,
            "comment {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(header, "element vertex {}", graph.num_vertices())?;
        writeln!(header, "property float x")?;
        writeln!(header, "property float y")?;
        writeln!(header, "property float z")?;
        if with_normals {
            writeln!(header, "property float nx")?;
            writeln!(header, "property float ny")?;
            writeln!(header, "property float nz")?;
        }
        if with_uvs {
            writeln!(header, "property float s")?;
            writeln!(header, "property float t")?;
        }
        writeln!(header, "element face {}", graph.num_faces())?;
        writeln!(header, "property list uchar uint vertex_indices")?;
        writeln!(header, "end_header")?;

        Ok(header)
    }

    fn write_ascii_body(
        &self,
        graph: &SceneGraph,
        with_normals: bool,
        with_uvs: bool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let mut body = String::new();

        for mesh in &graph.meshes {
            for (index, position) in mesh.positions.iter().enumerate() {
                write!(body, "{} {} {}", position.x, position.y, position.z)?;
                if with_normals {
                    let normal = mesh.normals[index];
                    write!(body, " {} {} {}", normal.x, normal.y, normal.z)?;
                }
                if with_uvs {
                    let uv = mesh.uv_channels[0][index];
                    write!(body, " {} {}", uv.x, uv.y)?;
                }
                body.push('\n');
            }
        }

        let mut offset = 0u32;
        for mesh in &graph.meshes {
            for face in &mesh.faces {
                writeln!(
                    body,
                    "3 {} {} {}",
                    offset + face[0],
                    offset + face[1],
                    offset + face[2]
                )?;
            }
            offset += mesh.positions.len() as u32;
        }

        out.extend_from_slice(body.as_bytes());
        Ok(())
    }

    fn write_binary_body(
        &self,
        graph: &SceneGraph,
        with_normals: bool,
        with_uvs: bool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        for mesh in &graph.meshes {
            for (index, position) in mesh.positions.iter().enumerate() {
                for &component in position.as_ref() {
                    out.write_f32::<LE>(component)?;
                }
                if with_normals {
                    for &component in mesh.normals[index].as_ref() {
                        out.write_f32::<LE>(component)?;
                    }
                }
                if with_uvs {
                    let uv = mesh.uv_channels[0][index];
                    out.write_f32::<LE>(uv.x)?;
                    out.write_f32::<LE>(uv.y)?;
                }
            }
        }

        let mut offset = 0u32;
        for mesh in &graph.meshes {
            for face in &mesh.faces {
                out.write_u8(3)?;
                for &index in face {
                    out.write_u32::<LE>(offset + index)?;
                }
            }
            offset += mesh.positions.len() as u32;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3A};
    use pretty_assertions::assert_eq;

    use crate::scene::Mesh;

    use super::*;

    fn graph() -> SceneGraph {
        let mesh = Mesh {
            name: String::from("tri"),
            positions: vec![Vec3A::ZERO, Vec3A::X, Vec3A::Y],
            normals: vec![Vec3A::Z; 3],
            uv_channels: vec![vec![Vec2::ZERO; 3]],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        };
        SceneGraph {
            meshes: vec![mesh.clone(), mesh],
            ..Default::default()
        }
    }

    #[test]
    fn header_declares_merged_elements() {
        let header = PlyExporter::ascii().header(&graph(), true, true).unwrap();

        assert!(header.contains("format ascii 1.0\n"));
        assert!(header.contains("element vertex 6\n"));
        assert!(header.contains("element face 2\n"));
        assert!(header.contains("property float nx\n"));
        assert!(header.contains("property float s\n"));
    }

    #[test]
    fn ascii_faces_rebase_across_meshes() {
        let mut out = Vec::new();
        PlyExporter::ascii()
            .write_ascii_body(&graph(), false, false, &mut out)
            .unwrap();
        let body = String::from_utf8(out).unwrap();

        assert!(body.contains("3 0 1 2\n"));
        assert!(body.contains("3 3 4 5\n"));
    }

    #[test]
    fn binary_body_size_matches_the_header() {
        let mut out = Vec::new();
        PlyExporter::binary()
            .write_binary_body(&graph(), true, true, &mut out)
            .unwrap();

        // 6 vertices * 8 floats + 2 faces * (1 + 12) bytes.
        assert_eq!(6 * 8 * 4 + 2 * 13, out.len());
    }
}
