use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::ConvertError;
use crate::options::Options;
use crate::processor;
use crate::scene::SceneGraph;

pub mod gltf;
pub mod gltfx;
pub mod obj;
pub mod ply;
pub mod stl;

use self::gltfx::{GltfxExporter, GltfxOptions};

/// Defines a type that can import an asset file into the intermediary scene.
pub trait Importer {
    /// Reads the file at `path` into a scene graph. Importers triangulate,
    /// join identical vertices, and apply the stripping switches themselves,
    /// so every importer hands the pipeline the same kind of scene.
    fn import(&self, path: &Path, settings: &ImportSettings) -> Result<SceneGraph>;

    /// The file extensions supported by the importer, used to select one for
    /// a given input file. Extensions do not include the period.
    fn extensions(&self) -> &[&str];
}

/// Defines a type that can write the intermediary scene to a single file.
pub trait Exporter {
    fn export(&self, graph: &SceneGraph, path: &Path) -> Result<()>;
}

/// Import-time stripping switches. Materials, textures, lights, cameras,
/// animations, bone weights, and vertex colors are always dropped; these
/// flags extend the set to normals/tangents and texture coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSettings {
    pub strip_normals: bool,
    pub strip_tex_coords: bool,
}

/// A generic export format of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDesc {
    pub id: &'static str,
    pub extension: &'static str,
    pub description: &'static str,
}

/// Every format the generic export path supports, in listing order.
pub fn export_formats() -> &'static [FormatDesc] {
    &[
        FormatDesc {
            id: "obj",
            extension: "obj",
            description: "Wavefront OBJ format",
        },
        FormatDesc {
            id: "ply",
            extension: "ply",
            description: "Stanford Polygon Library (ascii)",
        },
        FormatDesc {
            id: "plyb",
            extension: "ply",
            description: "Stanford Polygon Library (binary)",
        },
        FormatDesc {
            id: "stl",
            extension: "stl",
            description: "Stereolithography (ascii)",
        },
        FormatDesc {
            id: "stlb",
            extension: "stl",
            description: "Stereolithography (binary)",
        },
    ]
}

/// All stock import collaborators.
pub fn importers() -> Vec<Box<dyn Importer>> {
    vec![Box::new(gltf::GltfImporter::default())]
}

/// How a save request routes, decided before any file is touched.
#[derive(Debug, PartialEq)]
pub enum ExportPlan {
    /// The custom glTF-family path with its fully assembled options.
    Gltfx { options: GltfxOptions, path: PathBuf },
    /// A registry format handled by a generic writer.
    Generic {
        format: &'static FormatDesc,
        path: PathBuf,
        join_vertices: bool,
    },
}

impl ExportPlan {
    pub fn path(&self) -> &Path {
        match self {
            ExportPlan::Gltfx { path, .. } => path,
            ExportPlan::Generic { path, .. } => path,
        }
    }
}

/// Resolves the requested format id into an export plan. Pure: no file is
/// read or written, so an unknown format id fails before any output exists.
pub fn plan_export(options: &Options) -> Result<ExportPlan> {
    if options.format == "gltfx" || options.format == "glbx" {
        let write_binary = options.format == "glbx";
        let gltfx = GltfxOptions::from_options(options, write_binary);
        gltfx.validate()?;

        let extension = if write_binary { "glb" } else { "gltf" };
        return Ok(ExportPlan::Gltfx {
            options: gltfx,
            path: output_path(options, extension),
        });
    }

    let format = export_formats()
        .iter()
        .find(|format| format.id == options.format)
        .ok_or_else(|| ConvertError::UnknownFormat(options.format.clone()))?;

    Ok(ExportPlan::Generic {
        format,
        path: output_path(options, format.extension),
        join_vertices: options.join_vertices,
    })
}

/// Writes the scene according to the plan the options resolve to. Returns
/// the path actually written.
pub fn export_scene(graph: &SceneGraph, options: &Options) -> Result<PathBuf> {
    match plan_export(options)? {
        ExportPlan::Gltfx {
            options: gltfx,
            path,
        } => {
            log::debug!(
                "exporting custom glTF, binary: {}",
                gltfx.write_binary
            );
            GltfxExporter::new(gltfx)
                .export(graph, &path)
                .map_err(|error| ConvertError::Export {
                    path: path.clone(),
                    reason: error.to_string(),
                })?;
            Ok(path)
        }
        ExportPlan::Generic {
            format,
            path,
            join_vertices,
        } => {
            log::debug!("export format: {}", format.description);

            let mut joined;
            let graph = if join_vertices {
                log::debug!("join identical vertices");
                joined = graph.clone();
                for mesh in &mut joined.meshes {
                    processor::join_identical_vertices(mesh);
                }
                &joined
            } else {
                graph
            };

            log::debug!("writing to output file: {}", path.display());
            exporter_for(format.id)
                .export(graph, &path)
                .map_err(|error| ConvertError::Export {
                    path: path.clone(),
                    reason: error.to_string(),
                })?;
            Ok(path)
        }
    }
}

fn exporter_for(id: &str) -> Box<dyn Exporter> {
    match id {
        "obj" => Box::new(obj::ObjExporter::default()),
        "ply" => Box::new(ply::PlyExporter::ascii()),
        "plyb" => Box::new(ply::PlyExporter::binary()),
        "stl" => Box::new(stl::StlExporter::ascii()),
        "stlb" => Box::new(stl::StlExporter::binary()),
        _ => unreachable!("format id missing from the registry: {}", id),
    }
}

/// The output base name comes from the configured output path, or the input
/// path when none is set; the extension always comes from the resolved
/// format, never from the user-supplied path.
fn output_path(options: &Options, extension: &str) -> PathBuf {
    options
        .output
        .clone()
        .unwrap_or_else(|| options.input.clone())
        .with_extension(extension)
}
