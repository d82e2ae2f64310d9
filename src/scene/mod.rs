use std::path::PathBuf;

use anyhow::Result;
use glam::{Mat4, Vec3A};
use log::debug;

use crate::error::ConvertError;
use crate::format::{self, ImportSettings, Importer};
use crate::options::Options;
use crate::processor;

pub use self::graph::{Mesh, SceneGraph, SourceCounts};
pub use self::report::{format_list, FormatList, Report, Status};

mod graph;
mod report;

/// Owns one imported scene for the duration of a conversion run and drives
/// the stages in order: load, process, save, and optionally report. A failed
/// load leaves the scene invalid; later stages refuse to run on it.
pub struct Scene {
    options: Options,
    importers: Vec<Box<dyn Importer>>,
    graph: Option<SceneGraph>,
}

impl Scene {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            importers: format::importers(),
            graph: None,
        }
    }

    /// Whether a scene has been loaded.
    pub fn is_valid(&self) -> bool {
        self.graph.is_some()
    }

    /// Imports the input file. Materials, textures, lights, cameras,
    /// animations, bone weights, and vertex colors are always stripped;
    /// the strip flags extend that to normals and texture coordinates.
    /// Importers join identical vertices and triangulate unconditionally.
    pub fn load(&mut self) -> Result<()> {
        if self.options.strip_normals {
            debug!("strip normals/tangents");
        }
        if self.options.strip_tex_coords {
            debug!("strip texture coordinates");
        }
        let settings = ImportSettings {
            strip_normals: self.options.strip_normals,
            strip_tex_coords: self.options.strip_tex_coords,
        };

        let extension = self
            .options
            .input
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let importer = self
            .importers
            .iter()
            .find(|importer| importer.extensions().contains(&extension.as_str()))
            .ok_or_else(|| ConvertError::Import {
                path: self.options.input.clone(),
                reason: format!("no importer accepts {:?} files", extension),
            })?;

        match importer.import(&self.options.input, &settings) {
            Ok(graph) => {
                self.graph = Some(graph);
                Ok(())
            }
            Err(error) => Err(ConvertError::Import {
                path: self.options.input.clone(),
                reason: error.to_string(),
            }
            .into()),
        }
    }

    /// Applies the transform stages in their fixed order: swizzle, scale,
    /// align, translate, matrix transform, UV flip. Each stage runs only
    /// when its option departs from the no-op default; reordering would
    /// silently change the numbers, so the order is not configurable.
    pub fn process(&mut self) -> Result<()> {
        let graph = self.graph.as_mut().ok_or_else(no_scene)?;
        let options = &self.options;

        if let Some(swizzle) = &options.swizzle {
            debug!("swizzle: {}", swizzle);
            processor::swizzle(graph, swizzle);
        }

        if options.scale != 1. {
            debug!("scale: {}", options.scale);
            processor::scale(graph, options.scale);
        }

        if options.aligns() {
            debug!(
                "align: {:?} {:?} {:?}",
                options.align_x, options.align_y, options.align_z
            );
            processor::align(graph, options.align_x, options.align_y, options.align_z);
        }

        if options.translate != Vec3A::ZERO {
            debug!("translate: {}", options.translate);
            processor::translate(graph, options.translate);
        }

        if options.matrix != Mat4::IDENTITY {
            debug!("transform: {}", options.matrix);
            processor::transform(graph, &options.matrix);
        }

        if options.flip_uv {
            debug!("flip UVs: flip V coordinate");
            processor::flip_uvs(graph, false, true);
        }

        Ok(())
    }

    /// Writes the scene through the export dispatcher and returns the path
    /// actually written.
    pub fn save(&self) -> Result<PathBuf> {
        let graph = self.graph.as_ref().ok_or_else(no_scene)?;
        format::export_scene(graph, &self.options)
    }

    /// Builds the statistics report for the current (possibly transformed)
    /// scene.
    pub fn report(&self) -> Result<Report> {
        let graph = self.graph.as_ref().ok_or_else(no_scene)?;
        Ok(report::report(&self.options.input, graph))
    }

    /// Prints a human-readable summary of the scene to stdout.
    pub fn dump(&self) -> Result<()> {
        let graph = self.graph.as_ref().ok_or_else(no_scene)?;

        println!("File: {}", self.options.input.display());
        println!("  Meshes:     {}", graph.meshes.len());
        println!("  Materials:  {}", graph.counts.materials);
        println!("  Textures:   {}", graph.counts.textures);
        println!("  Lights:     {}", graph.counts.lights);
        println!("  Cameras:    {}", graph.counts.cameras);
        println!("  Animations: {}", graph.counts.animations);
        println!();

        for (index, mesh) in graph.meshes.iter().enumerate() {
            print!("  Mesh #{}", index);
            if mesh.name.is_empty() {
                println!();
            } else {
                println!(" - {}", mesh.name);
            }

            println!("    Vertices:     {}", mesh.positions.len());
            println!("    Faces:        {}", mesh.faces.len());
            println!("    Has Normals:  {}", mesh.has_normals());
            println!("    Has Tangents: {}", mesh.has_tangents_and_bitangents());
            println!("    UV Channels:  {}", mesh.num_uv_channels());
            println!("    Col Channels: {}", mesh.num_color_channels());
            println!();
        }

        Ok(())
    }
}

fn no_scene() -> ConvertError {
    ConvertError::Config(String::from("no scene loaded"))
}
