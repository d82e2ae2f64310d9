use std::collections::HashMap;
use std::path::Path;
use std::{fs, mem};

use anyhow::{Context, Result};
use byteorder::{WriteBytesExt, LE};
use glam::Vec3A;
use gltf::json::{
    self,
    mesh::{Primitive, Semantic},
    validation::Checked,
};
use gltf::Glb;

use crate::processor;
use crate::scene::{Mesh, SceneGraph};

use super::GltfxOptions;

/// Writes the custom glTF-family output: glTF 2.0 with a single scene, one
/// node per mesh, an options-driven PBR material, and optionally quantized
/// vertex attributes. The text variant embeds the buffer as a base64 data
/// URI so the output stays a single file either way.
pub struct GltfxExporter {
    options: GltfxOptions,
}

// https://www.khronos.org/registry/glTF/specs/2.0/glTF-2.0.html
impl GltfxExporter {
    pub fn new(options: GltfxOptions) -> Self {
        Self { options }
    }

    pub fn export(&self, graph: &SceneGraph, path: &Path) -> Result<()> {
        let (mut root, buffer) = self.build_root(graph)?;

        if self.options.write_binary {
            if !buffer.is_empty() {
                root.buffers.push(json::Buffer {
                    byte_length: buffer.len() as u32,
                    uri: None,
                    name: None,
                    extensions: None,
                    extras: Default::default(),
                });
            }
            let bytes = to_glb_bytes(&root, &buffer)?;
            fs::write(path, bytes)
                .with_context(|| format!("unable to write {}", path.display()))?;
        } else {
            if !buffer.is_empty() {
                root.buffers.push(json::Buffer {
                    byte_length: buffer.len() as u32,
                    uri: Some(format!(
                        "data:application/octet-stream;base64,{}",
                        base64::encode(&buffer)
                    )),
                    name: None,
                    extensions: None,
                    extras: Default::default(),
                });
            }
            let json_string = json::serialize::to_string_pretty(&root)?;
            fs::write(path, json_string)
                .with_context(|| format!("unable to write {}", path.display()))?;
        }

        Ok(())
    }

    /// Assembles the document and its binary buffer without touching disk.
    fn build_root(&self, graph: &SceneGraph) -> Result<(json::Root, Vec<u8>)> {
        let mut root = json::Root::default();
        let mut buffer = Vec::new();

        if self.options.use_compression {
            let extension = String::from("KHR_mesh_quantization");
            root.extensions_used.push(extension.clone());
            root.extensions_required.push(extension);
        }

        let material = self.insert_material(&mut root, &mut buffer)?;

        let mut nodes = Vec::new();
        for mesh in &graph.meshes {
            if mesh.positions.is_empty() {
                continue;
            }
            let node = self.insert_mesh(&mut root, &mut buffer, mesh, material)?;
            nodes.push(json::Index::new(node as u32));
        }

        root.scene = Some(json::Index::new(0));
        root.scenes.push(json::Scene {
            nodes,
            name: None,
            extensions: None,
            extras: Default::default(),
        });

        root.asset = json::Asset {
            generator: Some(format!(
                "{} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            )),
            ..Default::default()
        };

        Ok((root, buffer))
    }

    /// Converts a mesh into a glTF mesh plus the node that references it.
    /// Returns the node index. Quantized positions hang the dequantization
    /// transform off the node.
    fn insert_mesh(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        mesh: &Mesh,
        material: u32,
    ) -> Result<usize> {
        let mut attributes = HashMap::new();

        let (positions, dequantize) = self.insert_positions(root, buffer, mesh)?;
        attributes.insert(
            Checked::Valid(Semantic::Positions),
            json::Index::new(positions as u32),
        );

        if mesh.has_normals() && !self.options.strip_normals {
            let normals = self.insert_normals(root, buffer, mesh)?;
            attributes.insert(
                Checked::Valid(Semantic::Normals),
                json::Index::new(normals as u32),
            );
        }

        if !self.options.strip_tex_coords {
            for (channel, uvs) in mesh.uv_channels.iter().enumerate() {
                let accessor = self.insert_uvs(root, buffer, uvs)?;
                attributes.insert(
                    Checked::Valid(Semantic::TexCoords(channel as u32)),
                    json::Index::new(accessor as u32),
                );
            }
        }

        for (channel, colors) in mesh.color_channels.iter().enumerate() {
            let accessor = self.insert_colors(root, buffer, colors)?;
            attributes.insert(
                Checked::Valid(Semantic::Colors(channel as u32)),
                json::Index::new(accessor as u32),
            );
        }

        let indices = insert_indices(root, buffer, mesh)?;

        root.meshes.push(json::Mesh {
            name: Some(mesh.name.clone()),
            primitives: vec![Primitive {
                attributes,
                extensions: None,
                indices: Some(json::Index::new(indices as u32)),
                material: Some(json::Index::new(material)),
                targets: None,
                mode: Default::default(),
                extras: Default::default(),
            }],
            extensions: None,
            weights: None,
            extras: Default::default(),
        });

        let (translation, scale) = match dequantize {
            Some((translation, scale)) => (Some(translation), Some(scale)),
            None => (None, None),
        };

        root.nodes.push(json::Node {
            name: Some(format!("mesh_{}", mesh.name)),
            mesh: Some(json::Index::new(root.meshes.len() as u32 - 1)),
            translation,
            scale,
            camera: None,
            children: None,
            extensions: None,
            matrix: None,
            rotation: None,
            skin: None,
            weights: None,
            extras: Default::default(),
        });

        Ok(root.nodes.len() - 1)
    }

    /// Positions are written as f32, or as unsigned 16-bit integers over the
    /// mesh bounding box when quantizing. In the quantized case the returned
    /// translation/scale restore object space on the mesh node.
    fn insert_positions(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        mesh: &Mesh,
    ) -> Result<(usize, Option<([f32; 3], [f32; 3])>)> {
        let bounds = processor::calculate_bounding_box(mesh);

        if !self.options.use_compression {
            let accessor = push_accessor(
                root,
                buffer,
                mesh.positions.len(),
                json::accessor::Type::Vec3,
                json::accessor::ComponentType::F32,
                false,
                Some((bounds.min().as_ref().to_vec(), bounds.max().as_ref().to_vec())),
                mem::size_of::<[f32; 3]>(),
                None,
            );
            for position in &mesh.positions {
                for &coordinate in position.as_ref() {
                    buffer.write_f32::<LE>(coordinate)?;
                }
            }
            return Ok((accessor, None));
        }

        let bits = self.options.quantization.position_bits;
        let levels = ((1u32 << bits) - 1) as f32;
        let min = bounds.min();
        let extent = bounds.size();

        let quantize = |value: f32, min: f32, extent: f32| -> u16 {
            if extent > 0. {
                ((value - min) / extent * levels).round() as u16
            } else {
                0
            }
        };

        // Vertex attributes need a stride that is a multiple of four, so the
        // three u16 components pad out to eight bytes.
        let accessor = push_accessor(
            root,
            buffer,
            mesh.positions.len(),
            json::accessor::Type::Vec3,
            json::accessor::ComponentType::U16,
            false,
            Some((
                vec![0., 0., 0.],
                vec![
                    if extent.x > 0. { levels } else { 0. },
                    if extent.y > 0. { levels } else { 0. },
                    if extent.z > 0. { levels } else { 0. },
                ],
            )),
            mem::size_of::<[u16; 3]>(),
            Some(mem::size_of::<[u16; 4]>()),
        );
        for position in &mesh.positions {
            buffer.write_u16::<LE>(quantize(position.x, min.x, extent.x))?;
            buffer.write_u16::<LE>(quantize(position.y, min.y, extent.y))?;
            buffer.write_u16::<LE>(quantize(position.z, min.z, extent.z))?;
            buffer.write_u16::<LE>(0)?;
        }

        let scale = Vec3A::new(
            if extent.x > 0. { extent.x / levels } else { 1. },
            if extent.y > 0. { extent.y / levels } else { 1. },
            if extent.z > 0. { extent.z / levels } else { 1. },
        );

        Ok((accessor, Some((min.into(), scale.into()))))
    }

    /// Normals are written as f32, or as normalized 16-bit integers snapped
    /// to the configured grid when quantizing.
    fn insert_normals(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        mesh: &Mesh,
    ) -> Result<usize> {
        if !self.options.use_compression {
            let accessor = push_accessor(
                root,
                buffer,
                mesh.normals.len(),
                json::accessor::Type::Vec3,
                json::accessor::ComponentType::F32,
                false,
                None,
                mem::size_of::<[f32; 3]>(),
                None,
            );
            for normal in &mesh.normals {
                for &component in normal.normalize_or_zero().as_ref() {
                    buffer.write_f32::<LE>(component)?;
                }
            }
            return Ok(accessor);
        }

        let grid = signed_grid(self.options.quantization.normals_bits);
        let accessor = push_accessor(
            root,
            buffer,
            mesh.normals.len(),
            json::accessor::Type::Vec3,
            json::accessor::ComponentType::I16,
            true,
            None,
            mem::size_of::<[i16; 3]>(),
            Some(mem::size_of::<[i16; 4]>()),
        );
        for normal in &mesh.normals {
            for &component in normal.normalize_or_zero().as_ref() {
                buffer.write_i16::<LE>(snap_signed(component, grid))?;
            }
            buffer.write_i16::<LE>(0)?;
        }

        Ok(accessor)
    }

    /// Texture coordinates quantize to normalized u16 only when the whole
    /// channel fits the unit square; tiling coordinates stay f32, snapped to
    /// the configured grid.
    fn insert_uvs(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        uvs: &[glam::Vec2],
    ) -> Result<usize> {
        let bits = self.options.quantization.tex_coords_bits;
        let unit = uvs
            .iter()
            .all(|uv| (0. ..=1.).contains(&uv.x) && (0. ..=1.).contains(&uv.y));

        if self.options.use_compression && unit {
            let grid = ((1u32 << bits) - 1) as f32;
            let accessor = push_accessor(
                root,
                buffer,
                uvs.len(),
                json::accessor::Type::Vec2,
                json::accessor::ComponentType::U16,
                true,
                None,
                mem::size_of::<[u16; 2]>(),
                None,
            );
            for uv in uvs {
                for &coordinate in uv.as_ref() {
                    let snapped = (coordinate * grid).round() / grid;
                    buffer.write_u16::<LE>((snapped * 65535.).round() as u16)?;
                }
            }
            return Ok(accessor);
        }

        let accessor = push_accessor(
            root,
            buffer,
            uvs.len(),
            json::accessor::Type::Vec2,
            json::accessor::ComponentType::F32,
            false,
            None,
            mem::size_of::<[f32; 2]>(),
            None,
        );
        for uv in uvs {
            for &coordinate in uv.as_ref() {
                let coordinate = if self.options.use_compression {
                    let grid = ((1u32 << bits) - 1) as f32;
                    (coordinate * grid).round() / grid
                } else {
                    coordinate
                };
                buffer.write_f32::<LE>(coordinate)?;
            }
        }

        Ok(accessor)
    }

    fn insert_colors(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        colors: &[[f32; 4]],
    ) -> Result<usize> {
        if self.options.use_compression {
            let grid = ((1u32 << self.options.quantization.generic_bits) - 1) as f32;
            let accessor = push_accessor(
                root,
                buffer,
                colors.len(),
                json::accessor::Type::Vec4,
                json::accessor::ComponentType::U16,
                true,
                None,
                mem::size_of::<[u16; 4]>(),
                None,
            );
            for color in colors {
                for &component in color {
                    let snapped = (component.clamp(0., 1.) * grid).round() / grid;
                    buffer.write_u16::<LE>((snapped * 65535.).round() as u16)?;
                }
            }
            return Ok(accessor);
        }

        let accessor = push_accessor(
            root,
            buffer,
            colors.len(),
            json::accessor::Type::Vec4,
            json::accessor::ComponentType::F32,
            false,
            None,
            mem::size_of::<[f32; 4]>(),
            None,
        );
        for color in colors {
            for &component in color {
                buffer.write_f32::<LE>(component)?;
            }
        }

        Ok(accessor)
    }

    /// Builds the single material the options describe and returns its
    /// index. Map paths become image/texture entries; the zone map and the
    /// object-space flag ride along in the material extras.
    fn insert_material(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
    ) -> Result<u32> {
        let options = &self.options;

        let mut material = json::Material::default();
        material.pbr_metallic_roughness.metallic_factor =
            json::material::StrengthFactor(options.metallic_factor);
        material.pbr_metallic_roughness.roughness_factor =
            json::material::StrengthFactor(options.roughness_factor);

        if let Some(path) = &options.diffuse_map {
            let texture = self.insert_texture(root, buffer, path)?;
            material.pbr_metallic_roughness.base_color_texture = Some(json::texture::Info {
                index: json::Index::new(texture),
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });
        }

        if let Some(path) = &options.metallic_roughness_map {
            let texture = self.insert_texture(root, buffer, path)?;
            material.pbr_metallic_roughness.metallic_roughness_texture =
                Some(json::texture::Info {
                    index: json::Index::new(texture),
                    tex_coord: 0,
                    extensions: None,
                    extras: Default::default(),
                });
        }

        if let Some(path) = &options.occlusion_map {
            let texture = self.insert_texture(root, buffer, path)?;
            material.occlusion_texture = Some(json::material::OcclusionTexture {
                index: json::Index::new(texture),
                strength: json::material::StrengthFactor(1.),
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });
        }

        if let Some(path) = &options.emissive_map {
            let texture = self.insert_texture(root, buffer, path)?;
            material.emissive_texture = Some(json::texture::Info {
                index: json::Index::new(texture),
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });
            material.emissive_factor = json::material::EmissiveFactor([1., 1., 1.]);
        }

        if let Some(path) = &options.normal_map {
            let texture = self.insert_texture(root, buffer, path)?;
            material.normal_texture = Some(json::material::NormalTexture {
                index: json::Index::new(texture),
                scale: 1.,
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });
        }

        let mut extras = serde_json::Map::new();
        if let Some(path) = &options.zone_map {
            let texture = self.insert_texture(root, buffer, path)?;
            extras.insert(
                String::from("zoneTexture"),
                serde_json::json!({ "index": texture }),
            );
        }
        if options.object_space_normals {
            extras.insert(String::from("objectSpaceNormals"), serde_json::json!(true));
        }
        if !extras.is_empty() {
            let raw = serde_json::value::RawValue::from_string(
                serde_json::Value::Object(extras).to_string(),
            )?;
            material.extras = Some(raw);
        }

        root.materials.push(material);
        Ok(root.materials.len() as u32 - 1)
    }

    /// Registers a material map as image + texture. Embedded maps go into
    /// the binary buffer (binary variant) or a base64 data URI (text
    /// variant); otherwise the image references the file by URI.
    fn insert_texture(
        &self,
        root: &mut json::Root,
        buffer: &mut Vec<u8>,
        map: &Path,
    ) -> Result<u32> {
        let image = if self.options.embed_maps {
            let bytes = fs::read(map)
                .with_context(|| format!("unable to read material map {}", map.display()))?;

            if self.options.write_binary {
                align_to(buffer, 4);
                let view = json::buffer::View {
                    buffer: json::Index::new(0),
                    byte_offset: Some(buffer.len() as u32),
                    byte_length: bytes.len() as u32,
                    byte_stride: None,
                    name: None,
                    target: None,
                    extensions: None,
                    extras: Default::default(),
                };
                buffer.extend_from_slice(&bytes);
                root.buffer_views.push(view);

                json::Image {
                    buffer_view: Some(json::Index::new(root.buffer_views.len() as u32 - 1)),
                    mime_type: Some(json::image::MimeType(mime_type(map).into())),
                    uri: None,
                    name: None,
                    extensions: None,
                    extras: Default::default(),
                }
            } else {
                json::Image {
                    buffer_view: None,
                    mime_type: None,
                    uri: Some(format!(
                        "data:{};base64,{}",
                        mime_type(map),
                        base64::encode(&bytes)
                    )),
                    name: None,
                    extensions: None,
                    extras: Default::default(),
                }
            }
        } else {
            json::Image {
                buffer_view: None,
                mime_type: None,
                uri: Some(map.to_string_lossy().replace('\\', "/")),
                name: None,
                extensions: None,
                extras: Default::default(),
            }
        };

        root.images.push(image);
        root.textures.push(json::Texture {
            name: None,
            sampler: None,
            source: json::Index::new(root.images.len() as u32 - 1),
            extensions: None,
            extras: Default::default(),
        });

        Ok(root.textures.len() as u32 - 1)
    }
}

fn insert_indices(root: &mut json::Root, buffer: &mut Vec<u8>, mesh: &Mesh) -> Result<usize> {
    let wide = mesh.positions.len() > u16::MAX as usize;
    let component_type = if wide {
        json::accessor::ComponentType::U32
    } else {
        json::accessor::ComponentType::U16
    };
    let element_size = if wide {
        mem::size_of::<u32>()
    } else {
        mem::size_of::<u16>()
    };

    let accessor = push_accessor(
        root,
        buffer,
        mesh.faces.len() * 3,
        json::accessor::Type::Scalar,
        component_type,
        false,
        None,
        element_size,
        None,
    );
    for face in &mesh.faces {
        for &index in face {
            if wide {
                buffer.write_u32::<LE>(index)?;
            } else {
                buffer.write_u16::<LE>(index as u16)?;
            }
        }
    }

    Ok(accessor)
}

/// Pushes an accessor and its backing buffer view, aligning the buffer to
/// the element size first. The caller writes the payload right after.
#[allow(clippy::too_many_arguments)]
fn push_accessor(
    root: &mut json::Root,
    buffer: &mut Vec<u8>,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    normalized: bool,
    min_max: Option<(Vec<f32>, Vec<f32>)>,
    element_size: usize,
    byte_stride: Option<usize>,
) -> usize {
    let (min, max) = match min_max {
        Some((min, max)) => (Some(min.into()), Some(max.into())),
        None => (None, None),
    };
    let stride = byte_stride.unwrap_or(element_size);

    let accessor = json::Accessor {
        buffer_view: Some(json::Index::new(root.buffer_views.len() as u32)),
        byte_offset: 0,
        count: count as u32,
        type_: Checked::Valid(type_),
        component_type: Checked::Valid(json::accessor::GenericComponentType(component_type)),
        min,
        max,
        name: None,
        normalized,
        sparse: None,
        extensions: None,
        extras: Default::default(),
    };

    align_to(buffer, 4);
    let view = json::buffer::View {
        buffer: json::Index::new(0),
        byte_offset: Some(buffer.len() as u32),
        byte_length: (count * stride) as u32,
        byte_stride: byte_stride.map(|stride| stride as u32),
        name: None,
        target: None,
        extensions: None,
        extras: Default::default(),
    };

    root.accessors.push(accessor);
    root.buffer_views.push(view);

    root.accessors.len() - 1
}

fn to_glb_bytes(root: &json::Root, buffer: &[u8]) -> Result<Vec<u8>> {
    let json_string = json::serialize::to_string(root)?;

    let bytes = Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: calculate_length(&json_string, buffer) as u32,
        },
        json: json_string.into_bytes().into(),
        bin: if buffer.is_empty() {
            None
        } else {
            Some(buffer.to_vec().into())
        },
    }
    .to_vec()?;

    Ok(bytes)
}

fn calculate_length(json: &str, bin: &[u8]) -> usize {
    const HEADER_SIZE: usize = 12;
    const CHUNK_HEADER_SIZE: usize = 8;

    let mut length = HEADER_SIZE + CHUNK_HEADER_SIZE + padded(json.len());
    if !bin.is_empty() {
        length += CHUNK_HEADER_SIZE + padded(bin.len());
    }

    length
}

fn padded(length: usize) -> usize {
    length + (4 - length % 4) % 4
}

/// The grid step count for a signed normalized attribute at `bits` depth.
fn signed_grid(bits: u32) -> f32 {
    ((1u32 << (bits - 1)) - 1).max(1) as f32
}

/// Snaps a [-1, 1] component to the grid, then spreads it across the full
/// i16 range so normalized decoding recovers the snapped value.
fn snap_signed(component: f32, grid: f32) -> i16 {
    let snapped = (component.clamp(-1., 1.) * grid).round() / grid;
    (snapped * 32767.).round() as i16
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

fn align_to(buffer: &mut Vec<u8>, n: usize) {
    while buffer.len() % n != 0 {
        buffer.push(0);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use pretty_assertions::assert_eq;

    use crate::options::Options;

    use super::*;

    fn triangle() -> SceneGraph {
        SceneGraph {
            meshes: vec![Mesh {
                name: String::from("triangle"),
                positions: vec![
                    Vec3A::new(0., 0., 0.),
                    Vec3A::new(1., 0., 0.),
                    Vec3A::new(0., 1., 2.),
                ],
                normals: vec![Vec3A::Z; 3],
                uv_channels: vec![vec![Vec2::new(0., 0.), Vec2::new(1., 0.), Vec2::new(0., 1.)]],
                faces: vec![[0, 1, 2]],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn exporter(mutate: impl FnOnce(&mut Options)) -> GltfxExporter {
        let mut options = Options::new("model.glb");
        mutate(&mut options);
        GltfxExporter::new(GltfxOptions::from_options(&options, true))
    }

    #[test]
    fn plain_root_layout() {
        let (root, buffer) = exporter(|_| {}).build_root(&triangle()).unwrap();

        assert_eq!(1, root.meshes.len());
        assert_eq!(1, root.nodes.len());
        assert_eq!(Some(String::from("mesh_triangle")), root.nodes[0].name);
        assert_eq!(1, root.scenes.len());
        // Positions, normals, uvs, indices.
        assert_eq!(4, root.accessors.len());
        assert!(root.extensions_required.is_empty());
        assert!(!buffer.is_empty());

        let positions = &root.accessors[0];
        assert_eq!(
            json::accessor::ComponentType::F32,
            positions.component_type.unwrap().0
        );
        assert_eq!(3, positions.count);
        assert!(root.nodes[0].translation.is_none());
    }

    #[test]
    fn empty_meshes_are_skipped() {
        let mut graph = triangle();
        graph.meshes.push(Mesh::default());

        let (root, _) = exporter(|_| {}).build_root(&graph).unwrap();
        assert_eq!(1, root.meshes.len());
    }

    #[test]
    fn quantized_positions_carry_a_dequantization_transform() {
        let (root, _) = exporter(|options| {
            options.use_compression = true;
        })
        .build_root(&triangle())
        .unwrap();

        assert!(root
            .extensions_required
            .contains(&String::from("KHR_mesh_quantization")));

        let positions = &root.accessors[0];
        assert_eq!(
            json::accessor::ComponentType::U16,
            positions.component_type.unwrap().0
        );
        assert!(!positions.normalized);

        let normals = &root.accessors[1];
        assert_eq!(
            json::accessor::ComponentType::I16,
            normals.component_type.unwrap().0
        );
        assert!(normals.normalized);

        let node = &root.nodes[0];
        assert_eq!(Some([0., 0., 0.]), node.translation);
        let scale = node.scale.unwrap();
        let levels = (1u32 << 14) as f32 - 1.;
        assert!((scale[0] - 1. / levels).abs() < 1e-9);
        assert!((scale[2] - 2. / levels).abs() < 1e-9);
    }

    #[test]
    fn strip_flags_drop_attributes() {
        let (root, _) = exporter(|options| {
            options.strip_normals = true;
            options.strip_tex_coords = true;
        })
        .build_root(&triangle())
        .unwrap();

        // Positions and indices only.
        assert_eq!(2, root.accessors.len());
    }

    #[test]
    fn material_binds_maps_and_factors() {
        let (root, _) = exporter(|options| {
            options.metallic_factor = 0.25;
            options.roughness_factor = 0.5;
            options.diffuse_map = Some("albedo.png".into());
            options.normal_map = Some("normals.jpg".into());
            options.zone_map = Some("zones.png".into());
            options.object_space_normals = true;
        })
        .build_root(&triangle())
        .unwrap();

        assert_eq!(1, root.materials.len());
        let material = &root.materials[0];
        assert_eq!(0.25, material.pbr_metallic_roughness.metallic_factor.0);
        assert_eq!(0.5, material.pbr_metallic_roughness.roughness_factor.0);
        assert!(material.pbr_metallic_roughness.base_color_texture.is_some());
        assert!(material.normal_texture.is_some());

        // Diffuse, normal, and zone maps each get an image + texture.
        assert_eq!(3, root.images.len());
        assert_eq!(3, root.textures.len());
        assert_eq!(
            Some(String::from("albedo.png")),
            root.images[0].uri
        );

        let extras = material.extras.as_ref().unwrap().get();
        assert!(extras.contains("zoneTexture"));
        assert!(extras.contains("objectSpaceNormals"));

        let primitive = &root.meshes[0].primitives[0];
        assert_eq!(0, primitive.material.unwrap().value());
    }

    #[test]
    fn glb_bytes_parse_back() {
        let (mut root, buffer) = exporter(|_| {}).build_root(&triangle()).unwrap();
        root.buffers.push(json::Buffer {
            byte_length: buffer.len() as u32,
            uri: None,
            name: None,
            extensions: None,
            extras: Default::default(),
        });

        let bytes = to_glb_bytes(&root, &buffer).unwrap();
        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        assert_eq!(1, gltf.meshes().count());
    }

    #[test]
    fn quantization_survives_a_decode() {
        // Quantize, then undo the quantization by hand: every position must
        // land within half a grid step of the original.
        let graph = triangle();
        let (root, buffer) = exporter(|options| {
            options.use_compression = true;
            options.position_quantization_bits = 14;
        })
        .build_root(&graph)
        .unwrap();

        let view = &root.buffer_views[0];
        let offset = view.byte_offset.unwrap() as usize;
        let node = &root.nodes[0];
        let translation = Vec3A::from(node.translation.unwrap());
        let scale = Vec3A::from(node.scale.unwrap());

        for (index, original) in graph.meshes[0].positions.iter().enumerate() {
            let base = offset + index * 8;
            let decoded = Vec3A::new(
                u16::from_le_bytes([buffer[base], buffer[base + 1]]) as f32,
                u16::from_le_bytes([buffer[base + 2], buffer[base + 3]]) as f32,
                u16::from_le_bytes([buffer[base + 4], buffer[base + 5]]) as f32,
            ) * scale
                + translation;

            let step = scale.max_element();
            assert!(decoded.abs_diff_eq(*original, step * 0.5 + 1e-6));
        }
    }
}
