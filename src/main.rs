use std::path::PathBuf;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3A};
use serde::Serialize;
use structopt::StructOpt;

use meshconv::geom::Swizzle;
use meshconv::options::{Align, Options};
use meshconv::scene::{self, Scene, Status};

#[derive(Debug, StructOpt)]
#[structopt(name = "meshconv", about = "Batch 3D asset conversion pipeline")]
struct Opt {
    /// Input mesh file.
    #[structopt(parse(from_os_str), required_unless = "list-formats")]
    input: Option<PathBuf>,

    /// Output file; defaults to the input base name. The extension is
    /// always derived from the output format.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Output format id: gltfx, glbx, or a generic format id.
    #[structopt(short, long, default_value = "glbx")]
    format: String,

    /// List the generic export formats as a JSON document and exit.
    #[structopt(long)]
    list_formats: bool,

    /// Print a statistics report document instead of a bare status.
    #[structopt(short, long)]
    report: bool,

    /// Dump a scene summary to stdout instead of converting.
    #[structopt(long)]
    dump: bool,

    /// Log each pipeline decision as it is made.
    #[structopt(short, long)]
    verbose: bool,

    /// Join identical vertices again on generic export.
    #[structopt(long)]
    join_vertices: bool,

    /// Strip normals and tangents at import.
    #[structopt(long)]
    strip_normals: bool,

    /// Strip texture coordinates at import.
    #[structopt(long)]
    strip_tex_coords: bool,

    /// Flip the V texture coordinate.
    #[structopt(long)]
    flip_uv: bool,

    /// Axis swizzle spec, e.g. "x-zy".
    #[structopt(long)]
    swizzle: Option<Swizzle>,

    /// Uniform scale factor.
    #[structopt(long, default_value = "1")]
    scale: f32,

    /// X axis alignment: none, min, center, max.
    #[structopt(long, default_value = "none")]
    align_x: Align,

    /// Y axis alignment: none, min, center, max.
    #[structopt(long, default_value = "none")]
    align_y: Align,

    /// Z axis alignment: none, min, center, max.
    #[structopt(long, default_value = "none")]
    align_z: Align,

    /// Translation offset as "x,y,z".
    #[structopt(long, default_value = "0,0,0", parse(try_from_str = parse_vec3))]
    translate: Vec3A,

    /// Row-major 4x4 transform matrix as 16 comma-separated numbers.
    #[structopt(long, parse(try_from_str = parse_mat4))]
    matrix: Option<Mat4>,

    /// Metallic PBR factor for the custom glTF material.
    #[structopt(long, default_value = "0.1")]
    metallic_factor: f32,

    /// Roughness PBR factor for the custom glTF material.
    #[structopt(long, default_value = "0.8")]
    roughness_factor: f32,

    /// Base color map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    diffuse_map: Option<PathBuf>,

    /// Occlusion map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    occlusion_map: Option<PathBuf>,

    /// Emissive map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    emissive_map: Option<PathBuf>,

    /// Combined metallic/roughness map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    metallic_roughness_map: Option<PathBuf>,

    /// Zone map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    zone_map: Option<PathBuf>,

    /// Normal map for the custom glTF material.
    #[structopt(long, parse(from_os_str))]
    normal_map: Option<PathBuf>,

    /// Embed material maps instead of referencing them by URI.
    #[structopt(long)]
    embed_maps: bool,

    /// Quantize vertex attributes in the custom glTF output.
    #[structopt(long)]
    use_compression: bool,

    /// Mark the normal map as object-space.
    #[structopt(long)]
    object_space_normals: bool,

    #[structopt(long, default_value = "14")]
    position_quantization_bits: u32,

    #[structopt(long, default_value = "12")]
    tex_coords_quantization_bits: u32,

    #[structopt(long, default_value = "10")]
    normals_quantization_bits: u32,

    #[structopt(long, default_value = "8")]
    generic_quantization_bits: u32,

    #[structopt(long, default_value = "7")]
    compression_level: u32,
}

fn main() {
    let opt = Opt::from_args();

    pretty_env_logger::formatted_builder()
        .filter_level(if opt.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if opt.list_formats {
        print_document(&scene::format_list());
        return;
    }

    match run(opt) {
        Ok(Some(report)) => print_document(&report),
        Ok(None) => print_document(&Status::ok()),
        Err(error) => {
            print_document(&Status::error(error.to_string()));
            std::process::exit(1);
        }
    }
}

fn run(opt: Opt) -> Result<Option<scene::Report>> {
    let dump = opt.dump;
    let report = opt.report;

    let mut scene = Scene::new(options_from(opt)?);
    scene.load()?;

    if dump {
        scene.dump()?;
        return Ok(None);
    }

    scene.process()?;
    scene.save()?;

    if report {
        return Ok(Some(scene.report()?));
    }
    Ok(None)
}

fn options_from(opt: Opt) -> Result<Options> {
    let input = opt.input.context("no input file given")?;

    Ok(Options {
        input,
        output: opt.output,
        format: opt.format,
        verbose: opt.verbose,
        report: opt.report,
        join_vertices: opt.join_vertices,
        strip_normals: opt.strip_normals,
        strip_tex_coords: opt.strip_tex_coords,
        flip_uv: opt.flip_uv,
        swizzle: opt.swizzle,
        scale: opt.scale,
        align_x: opt.align_x,
        align_y: opt.align_y,
        align_z: opt.align_z,
        translate: opt.translate,
        matrix: opt.matrix.unwrap_or(Mat4::IDENTITY),
        metallic_factor: opt.metallic_factor,
        roughness_factor: opt.roughness_factor,
        diffuse_map: opt.diffuse_map,
        occlusion_map: opt.occlusion_map,
        emissive_map: opt.emissive_map,
        metallic_roughness_map: opt.metallic_roughness_map,
        zone_map: opt.zone_map,
        normal_map: opt.normal_map,
        embed_maps: opt.embed_maps,
        use_compression: opt.use_compression,
        object_space_normals: opt.object_space_normals,
        position_quantization_bits: opt.position_quantization_bits,
        tex_coords_quantization_bits: opt.tex_coords_quantization_bits,
        normals_quantization_bits: opt.normals_quantization_bits,
        generic_quantization_bits: opt.generic_quantization_bits,
        compression_level: opt.compression_level,
    })
}

fn print_document(document: &impl Serialize) {
    let json = serde_json::to_string_pretty(document)
        .expect("status documents always serialize");
    println!("{}", json);
}

fn parse_vec3(value: &str) -> Result<Vec3A, String> {
    let components = parse_floats(value)?;
    match components[..] {
        [x, y, z] => Ok(Vec3A::new(x, y, z)),
        _ => Err(format!("expected 3 numbers, got {}", components.len())),
    }
}

fn parse_mat4(value: &str) -> Result<Mat4, String> {
    let components = parse_floats(value)?;
    if components.len() != 16 {
        return Err(format!("expected 16 numbers, got {}", components.len()));
    }

    let mut values = [0.; 16];
    values.copy_from_slice(&components);
    // The CLI takes rows; glam stores columns.
    Ok(Mat4::from_cols_array(&values).transpose())
}

fn parse_floats(value: &str) -> Result<Vec<f32>, String> {
    value
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<f32>()
                .map_err(|error| format!("{}: {:?}", error, component))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_translate() {
        assert_eq!(Vec3A::new(1., -2., 0.5), parse_vec3("1, -2, 0.5").unwrap());
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,x").is_err());
    }

    #[test]
    fn parse_matrix_is_row_major() {
        let matrix = parse_mat4(
            "1,0,0,5, 0,1,0,6, 0,0,1,7, 0,0,0,1",
        )
        .unwrap();

        assert_eq!(
            glam::Vec3::new(5., 6., 7.),
            matrix.transform_point3(glam::Vec3::ZERO)
        );
    }
}
