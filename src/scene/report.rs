use std::path::Path;

use serde::Serialize;

use crate::format::{self, FormatDesc};
use crate::geom::Range3;
use crate::processor;
use crate::scene::{Mesh, SceneGraph};

/// The statistics document produced from a loaded (and possibly processed)
/// scene.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "type")]
    kind: &'static str,
    file_path: String,
    meshes: Vec<MeshReport>,
    scene: SceneReport,
}

#[derive(Debug, Serialize)]
struct MeshReport {
    statistics: MeshStatistics,
    geometry: Option<Geometry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshStatistics {
    num_vertices: usize,
    num_faces: usize,
    has_normals: bool,
    has_tangents_and_bitangents: bool,
    has_bones: bool,
    has_tex_coords: bool,
    num_tex_coord_channels: usize,
    has_vertex_colors: bool,
    num_color_channels: usize,
}

#[derive(Debug, Serialize)]
struct SceneReport {
    statistics: SceneStatistics,
    geometry: Option<Geometry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneStatistics {
    num_vertices: usize,
    num_faces: usize,
    num_meshes: usize,
    num_materials: usize,
    num_textures: usize,
    num_lights: usize,
    num_cameras: usize,
    num_animations: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Geometry {
    bounding_box: BoundingBox,
    size: [f32; 3],
    center: [f32; 3],
}

#[derive(Debug, Serialize)]
struct BoundingBox {
    min: [f32; 3],
    max: [f32; 3],
}

impl Geometry {
    /// `None` for a range that never saw a point, so "no geometry" stays
    /// distinct from a zero-size box at the origin.
    fn from_range(range: &Range3) -> Option<Self> {
        if !range.is_valid() {
            return None;
        }

        Some(Self {
            bounding_box: BoundingBox {
                min: range.min().into(),
                max: range.max().into(),
            },
            size: range.size().into(),
            center: range.center().into(),
        })
    }
}

/// Builds the report for a scene. The input path is slash-normalized so the
/// document reads the same across platforms.
pub fn report(input: &Path, graph: &SceneGraph) -> Report {
    let mut scene_bounds = Range3::empty();
    let mut meshes = Vec::new();

    for mesh in &graph.meshes {
        let bounds = processor::calculate_bounding_box(mesh);
        scene_bounds.union_with(&bounds);

        meshes.push(MeshReport {
            statistics: mesh_statistics(mesh),
            geometry: Geometry::from_range(&bounds),
        });
    }

    Report {
        kind: "report",
        file_path: input.to_string_lossy().replace('\\', "/"),
        meshes,
        scene: SceneReport {
            statistics: SceneStatistics {
                num_vertices: graph.num_vertices(),
                num_faces: graph.num_faces(),
                num_meshes: graph.meshes.len(),
                num_materials: graph.counts.materials,
                num_textures: graph.counts.textures,
                num_lights: graph.counts.lights,
                num_cameras: graph.counts.cameras,
                num_animations: graph.counts.animations,
            },
            geometry: Geometry::from_range(&scene_bounds),
        },
    }
}

fn mesh_statistics(mesh: &Mesh) -> MeshStatistics {
    MeshStatistics {
        num_vertices: mesh.positions.len(),
        num_faces: mesh.faces.len(),
        has_normals: mesh.has_normals(),
        has_tangents_and_bitangents: mesh.has_tangents_and_bitangents(),
        has_bones: mesh.has_bones,
        has_tex_coords: mesh.has_tex_coords(),
        num_tex_coord_channels: mesh.num_uv_channels(),
        has_vertex_colors: mesh.has_vertex_colors(),
        num_color_channels: mesh.num_color_channels(),
    }
}

/// The uniform outcome envelope of every top-level operation.
#[derive(Debug, Serialize)]
pub struct Status {
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            kind: "status",
            status: "ok",
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "status",
            status: "error",
            error: Some(message.into()),
        }
    }
}

/// The discovery document listing every generic export format.
#[derive(Debug, Serialize)]
pub struct FormatList {
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'static str,
    list: Vec<FormatEntry>,
}

#[derive(Debug, Serialize)]
struct FormatEntry {
    id: &'static str,
    extension: &'static str,
    description: &'static str,
}

pub fn format_list() -> FormatList {
    format_list_from(format::export_formats())
}

fn format_list_from(formats: &[FormatDesc]) -> FormatList {
    FormatList {
        kind: "list",
        status: "ok",
        list: formats
            .iter()
            .map(|format| FormatEntry {
                id: format.id,
                extension: format.extension,
                description: format.description,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3A;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_scene_reports_absent_geometry() {
        let graph = SceneGraph::default();
        let document = serde_json::to_value(report(Path::new("empty.glb"), &graph)).unwrap();

        assert_eq!("report", document["type"]);
        assert!(document["scene"]["geometry"].is_null());
        assert_eq!(0, document["scene"]["statistics"]["numMeshes"]);
        assert_eq!(0, document["meshes"].as_array().unwrap().len());
    }

    #[test]
    fn report_aggregates_meshes() {
        let mesh = |offset: f32| Mesh {
            positions: vec![
                Vec3A::new(offset, 0., 0.),
                Vec3A::new(offset + 1., 1., 1.),
            ],
            faces: vec![[0, 1, 0]],
            ..Default::default()
        };
        let graph = SceneGraph {
            meshes: vec![mesh(0.), mesh(2.)],
            ..Default::default()
        };

        let document = serde_json::to_value(report(Path::new("two.glb"), &graph)).unwrap();

        assert_eq!(4, document["scene"]["statistics"]["numVertices"]);
        assert_eq!(2, document["scene"]["statistics"]["numFaces"]);
        let bounds = &document["scene"]["geometry"]["boundingBox"];
        assert_eq!(0., bounds["min"][0]);
        assert_eq!(3., bounds["max"][0]);
        assert_eq!(1.5, document["scene"]["geometry"]["center"][0]);
    }

    #[test]
    fn report_normalizes_backslashes() {
        let graph = SceneGraph::default();
        let document =
            serde_json::to_value(report(Path::new(r"scans\week1\mesh.glb"), &graph)).unwrap();

        assert_eq!("scans/week1/mesh.glb", document["filePath"]);
    }

    #[test]
    fn status_documents() {
        let ok = serde_json::to_value(Status::ok()).unwrap();
        assert_eq!("status", ok["type"]);
        assert_eq!("ok", ok["status"]);
        assert!(ok.get("error").is_none());

        let error = serde_json::to_value(Status::error("boom")).unwrap();
        assert_eq!("error", error["status"]);
        assert_eq!("boom", error["error"]);
    }

    #[test]
    fn format_list_over_an_empty_registry_is_ok() {
        let document = serde_json::to_value(format_list_from(&[])).unwrap();
        assert_eq!("list", document["type"]);
        assert_eq!("ok", document["status"]);
        assert_eq!(0, document["list"].as_array().unwrap().len());
    }

    #[test]
    fn format_list_carries_the_registry() {
        let document = serde_json::to_value(format_list()).unwrap();
        let list = document["list"].as_array().unwrap();
        assert!(!list.is_empty());
        assert_eq!("obj", list[0]["id"]);
        assert_eq!("obj", list[0]["extension"]);
    }
}
