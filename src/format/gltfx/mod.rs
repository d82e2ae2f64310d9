pub use self::exporter::GltfxExporter;

mod exporter;

use std::path::PathBuf;

use crate::error::ConvertError;
use crate::options::Options;

/// The full configuration consumed by the custom glTF-family exporter. Built
/// by the export dispatcher from the run options; the exporter never sees the
/// global options record.
#[derive(Debug, Clone, PartialEq)]
pub struct GltfxOptions {
    pub verbose: bool,
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
    pub strip_normals: bool,
    pub strip_tex_coords: bool,
    pub write_binary: bool,
    pub quantization: QuantizationOptions,
}

/// Per-attribute quantization bit depths plus the encoder effort level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationOptions {
    pub position_bits: u32,
    pub tex_coords_bits: u32,
    pub normals_bits: u32,
    pub generic_bits: u32,
    /// Encoder effort knob carried for the options contract. The built-in
    /// quantizer has no speed/ratio trade-off and does not consume it.
    pub compression_level: u32,
}

impl GltfxOptions {
    pub fn from_options(options: &Options, write_binary: bool) -> Self {
        Self {
            verbose: options.verbose,
            metallic_factor: options.metallic_factor,
            roughness_factor: options.roughness_factor,
            diffuse_map: options.diffuse_map.clone(),
            occlusion_map: options.occlusion_map.clone(),
            emissive_map: options.emissive_map.clone(),
            metallic_roughness_map: options.metallic_roughness_map.clone(),
            zone_map: options.zone_map.clone(),
            normal_map: options.normal_map.clone(),
            embed_maps: options.embed_maps,
            use_compression: options.use_compression,
            object_space_normals: options.object_space_normals,
            strip_normals: options.strip_normals,
            strip_tex_coords: options.strip_tex_coords,
            write_binary,
            quantization: QuantizationOptions {
                position_bits: options.position_quantization_bits,
                tex_coords_bits: options.tex_coords_quantization_bits,
                normals_bits: options.normals_quantization_bits,
                generic_bits: options.generic_quantization_bits,
                compression_level: options.compression_level,
            },
        }
    }

    /// Rejects option combinations the writer cannot honor before any output
    /// file exists.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.use_compression {
            let quantization = &self.quantization;
            for (name, bits) in [
                ("position", quantization.position_bits),
                ("texcoord", quantization.tex_coords_bits),
                ("normal", quantization.normals_bits),
                ("generic", quantization.generic_bits),
            ] {
                if !(1..=16).contains(&bits) {
                    return Err(ConvertError::Config(format!(
                        "{} quantization bits must be between 1 and 16, got {}",
                        name, bits
                    )));
                }
            }
            if quantization.compression_level > 10 {
                return Err(ConvertError::Config(format!(
                    "compression level must be between 0 and 10, got {}",
                    quantization.compression_level
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        let mut options = Options::new("model.glb");
        options.use_compression = true;
        let gltfx = GltfxOptions::from_options(&options, true);
        assert!(gltfx.validate().is_ok());
    }

    #[test]
    fn validate_only_checks_quantization_when_compressing() {
        let mut options = Options::new("model.glb");
        options.position_quantization_bits = 30;
        let gltfx = GltfxOptions::from_options(&options, false);
        assert!(gltfx.validate().is_ok());

        options.use_compression = true;
        let gltfx = GltfxOptions::from_options(&options, false);
        assert!(gltfx.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_levels() {
        let mut options = Options::new("model.glb");
        options.use_compression = true;
        options.compression_level = 11;
        let gltfx = GltfxOptions::from_options(&options, true);
        assert!(gltfx.validate().is_err());
    }
}
