use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::{Vec2, Vec3A};

use crate::format::{ImportSettings, Importer};
use crate::processor;
use crate::scene::{Mesh, SceneGraph, SourceCounts};

/// Imports glTF 2.0 assets (text or binary) through the `gltf` crate. The
/// crate does all parsing and buffer resolution; this importer only lowers
/// the document into the intermediary scene, stripping everything the
/// pipeline does not carry.
#[derive(Default)]
pub struct GltfImporter {}

impl Importer for GltfImporter {
    fn import(&self, path: &Path, settings: &ImportSettings) -> Result<SceneGraph> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("unable to open {}", path.display()))?;

        let mut graph = SceneGraph {
            counts: SourceCounts {
                materials: document.materials().count(),
                textures: document.textures().count(),
                lights: document.lights().map_or(0, |lights| lights.count()),
                cameras: document.cameras().count(),
                animations: document.animations().count(),
            },
            ..Default::default()
        };

        for mesh in document.meshes() {
            for (index, primitive) in mesh.primitives().enumerate() {
                let name = match mesh.name() {
                    Some(name) if index == 0 => String::from(name),
                    Some(name) => format!("{}_{}", name, index),
                    None => format!("mesh_{}", graph.meshes.len()),
                };

                if let Some(mesh) = lower_primitive(&primitive, &buffers, settings, name)? {
                    graph.meshes.push(mesh);
                }
            }
        }

        // Every importer hands the pipeline joined, triangulated meshes.
        for mesh in &mut graph.meshes {
            processor::join_identical_vertices(mesh);
        }

        Ok(graph)
    }

    fn extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }
}

/// Lowers one primitive into the intermediary mesh. Primitives without
/// positions carry no geometry and dissolve.
fn lower_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    settings: &ImportSettings,
    name: String,
) -> Result<Option<Mesh>> {
    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vec3A> = match reader.read_positions() {
        Some(positions) => positions.map(Vec3A::from).collect(),
        None => return Ok(None),
    };

    let mut mesh = Mesh {
        name,
        positions,
        ..Default::default()
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..mesh.positions.len() as u32).collect(),
    };
    mesh.faces = triangulate(primitive.mode(), &indices)?;

    if !settings.strip_normals {
        if let Some(normals) = reader.read_normals() {
            mesh.normals = normals.map(Vec3A::from).collect();
        }
        if let Some(tangents) = reader.read_tangents() {
            // The w component carries the handedness sign.
            let tangents: Vec<[f32; 4]> = tangents.collect();
            mesh.tangents = tangents
                .iter()
                .map(|tangent| Vec3A::new(tangent[0], tangent[1], tangent[2]))
                .collect();
            if mesh.normals.len() == mesh.tangents.len() {
                mesh.bitangents = mesh
                    .normals
                    .iter()
                    .zip(&tangents)
                    .map(|(normal, tangent)| {
                        normal.cross(Vec3A::new(tangent[0], tangent[1], tangent[2])) * tangent[3]
                    })
                    .collect();
            } else {
                // Tangents without matching normals cannot form a basis.
                mesh.tangents.clear();
            }
        }
    }

    if !settings.strip_tex_coords {
        let mut channel = 0;
        while let Some(uvs) = reader.read_tex_coords(channel) {
            mesh.uv_channels
                .push(uvs.into_f32().map(Vec2::from).collect());
            channel += 1;
        }
    }

    // Bone weights and vertex colors follow the always-strip policy; only
    // the skinning presence survives, for the report.
    mesh.has_bones = reader.read_joints(0).is_some();

    Ok(Some(mesh))
}

/// Expands the primitive's index list into a triangle list. Strips and fans
/// unroll; non-surface modes are rejected.
fn triangulate(mode: gltf::mesh::Mode, indices: &[u32]) -> Result<Vec<[u32; 3]>> {
    use gltf::mesh::Mode;

    let faces = match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|face| [face[0], face[1], face[2]])
            .collect(),
        Mode::TriangleStrip => {
            let mut faces = Vec::new();
            for i in 0..indices.len().saturating_sub(2) {
                // Every other triangle reverses to keep the winding.
                let face = if i % 2 == 0 {
                    [indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    [indices[i + 1], indices[i], indices[i + 2]]
                };
                faces.push(face);
            }
            faces
        }
        Mode::TriangleFan => {
            let mut faces = Vec::new();
            for i in 1..indices.len().saturating_sub(1) {
                faces.push([indices[0], indices[i], indices[i + 1]]);
            }
            faces
        }
        mode => bail!("unsupported primitive mode: {:?}", mode),
    };

    Ok(faces)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn triangulate_lists() {
        let faces = triangulate(gltf::mesh::Mode::Triangles, &[0, 1, 2, 2, 1, 3]).unwrap();
        assert_eq!(vec![[0, 1, 2], [2, 1, 3]], faces);
    }

    #[test]
    fn triangulate_strips_alternate_winding() {
        let faces = triangulate(gltf::mesh::Mode::TriangleStrip, &[0, 1, 2, 3]).unwrap();
        assert_eq!(vec![[0, 1, 2], [2, 1, 3]], faces);
    }

    #[test]
    fn triangulate_fans_share_the_hub() {
        let faces = triangulate(gltf::mesh::Mode::TriangleFan, &[0, 1, 2, 3]).unwrap();
        assert_eq!(vec![[0, 1, 2], [0, 2, 3]], faces);
    }

    #[test]
    fn triangulate_rejects_lines() {
        assert!(triangulate(gltf::mesh::Mode::Lines, &[0, 1]).is_err());
    }

    #[test]
    fn triangulate_short_buffers() {
        assert!(triangulate(gltf::mesh::Mode::TriangleStrip, &[0, 1])
            .unwrap()
            .is_empty());
        assert!(triangulate(gltf::mesh::Mode::TriangleFan, &[0])
            .unwrap()
            .is_empty());
    }
}
