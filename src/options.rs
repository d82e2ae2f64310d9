use std::path::PathBuf;
use std::str::FromStr;

use glam::{Mat4, Vec3A};

use crate::error::ConvertError;
use crate::geom::Swizzle;

/// Per-axis alignment mode. The selected feature of the scene bounding box
/// is translated to zero on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Min,
    Center,
    Max,
}

impl Default for Align {
    fn default() -> Self {
        Align::None
    }
}

impl FromStr for Align {
    type Err = ConvertError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "none" => Ok(Align::None),
            "start" | "min" => Ok(Align::Min),
            "center" => Ok(Align::Center),
            "end" | "max" => Ok(Align::Max),
            _ => Err(ConvertError::Config(format!(
                "unknown alignment mode: {:?}",
                mode
            ))),
        }
    }
}

/// The configuration of a single conversion run. Built once from the CLI and
/// passed around immutably; the pipeline never mutates global state.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    /// Base name for the output; the input path when absent. The extension
    /// is always replaced by the one the resolved format dictates.
    pub output: Option<PathBuf>,
    /// Output format id: `gltfx`/`glbx` for the custom path, otherwise a
    /// generic registry id.
    pub format: String,
    pub verbose: bool,
    /// Emit a statistics report document instead of a bare status document.
    pub report: bool,

    pub join_vertices: bool,
    pub strip_normals: bool,
    pub strip_tex_coords: bool,
    pub flip_uv: bool,

    pub swizzle: Option<Swizzle>,
    pub scale: f32,
    pub align_x: Align,
    pub align_y: Align,
    pub align_z: Align,
    pub translate: Vec3A,
    pub matrix: Mat4,

    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub diffuse_map: Option<PathBuf>,
    pub occlusion_map: Option<PathBuf>,
    pub emissive_map: Option<PathBuf>,
    pub metallic_roughness_map: Option<PathBuf>,
    pub zone_map: Option<PathBuf>,
    pub normal_map: Option<PathBuf>,
    pub embed_maps: bool,
    pub use_compression: bool,
    pub object_space_normals: bool,
    pub position_quantization_bits: u32,
    pub tex_coords_quantization_bits: u32,
    pub normals_quantization_bits: u32,
    pub generic_quantization_bits: u32,
    pub compression_level: u32,
}

impl Options {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn aligns(&self) -> bool {
        self.align_x != Align::None || self.align_y != Align::None || self.align_z != Align::None
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            format: String::from("glbx"),
            verbose: false,
            report: false,
            join_vertices: false,
            strip_normals: false,
            strip_tex_coords: false,
            flip_uv: false,
            swizzle: None,
            scale: 1.,
            align_x: Align::None,
            align_y: Align::None,
            align_z: Align::None,
            translate: Vec3A::ZERO,
            matrix: Mat4::IDENTITY,
            metallic_factor: 0.1,
            roughness_factor: 0.8,
            diffuse_map: None,
            occlusion_map: None,
            emissive_map: None,
            metallic_roughness_map: None,
            zone_map: None,
            normal_map: None,
            embed_maps: false,
            use_compression: false,
            object_space_normals: false,
            position_quantization_bits: 14,
            tex_coords_quantization_bits: 12,
            normals_quantization_bits: 10,
            generic_quantization_bits: 8,
            compression_level: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_align_modes() {
        assert_eq!(Align::None, "none".parse().unwrap());
        assert_eq!(Align::Min, "min".parse().unwrap());
        assert_eq!(Align::Min, "start".parse().unwrap());
        assert_eq!(Align::Center, "center".parse().unwrap());
        assert_eq!(Align::Max, "end".parse().unwrap());
        assert!("middle".parse::<Align>().is_err());
    }

    #[test]
    fn defaults_are_no_ops() {
        let options = Options::new("cube.glb");
        assert_eq!(1., options.scale);
        assert_eq!(Mat4::IDENTITY, options.matrix);
        assert_eq!(Vec3A::ZERO, options.translate);
        assert!(options.swizzle.is_none());
        assert!(!options.aligns());
    }
}
