use std::collections::HashMap;

use glam::{Mat3A, Mat4, Vec3A};

use crate::geom::{Range3, Swizzle};
use crate::options::Align;
use crate::scene::{Mesh, SceneGraph};

/// Remaps the axes of every directional attribute in the scene.
pub fn swizzle(graph: &mut SceneGraph, swizzle: &Swizzle) {
    for mesh in &mut graph.meshes {
        for buffer in [
            &mut mesh.positions,
            &mut mesh.normals,
            &mut mesh.tangents,
            &mut mesh.bitangents,
        ] {
            for vector in buffer.iter_mut() {
                *vector = swizzle.apply(*vector);
            }
        }
    }
}

/// Multiplies every vertex position by a uniform factor. A factor of 1.0 is
/// the caller's no-op to skip.
pub fn scale(graph: &mut SceneGraph, factor: f32) {
    for mesh in &mut graph.meshes {
        for position in &mut mesh.positions {
            *position *= factor;
        }
    }
}

/// Translates the scene so the selected feature of the pre-alignment scene
/// bounding box lands on zero, per axis independently. The box is computed
/// over the whole scene so multiple meshes stay consistent relative to one
/// another. A scene without geometry is left untouched.
pub fn align(graph: &mut SceneGraph, x: Align, y: Align, z: Align) {
    let bounds = scene_bounding_box(graph);
    if !bounds.is_valid() {
        return;
    }

    let pick = |mode: Align, min: f32, center: f32, max: f32| match mode {
        Align::None => 0.,
        Align::Min => -min,
        Align::Center => -center,
        Align::Max => -max,
    };

    let (min, center, max) = (bounds.min(), bounds.center(), bounds.max());
    let offset = Vec3A::new(
        pick(x, min.x, center.x, max.x),
        pick(y, min.y, center.y, max.y),
        pick(z, min.z, center.z, max.z),
    );

    translate(graph, offset);
}

/// Adds a constant offset to every vertex position.
pub fn translate(graph: &mut SceneGraph, offset: Vec3A) {
    for mesh in &mut graph.meshes {
        for position in &mut mesh.positions {
            *position += offset;
        }
    }
}

/// Applies an affine transform to the scene. Positions take the full matrix;
/// normals, tangents, and bitangents take the inverse transpose of its linear
/// part and are renormalized, so general transforms keep them perpendicular
/// to their surfaces.
pub fn transform(graph: &mut SceneGraph, matrix: &Mat4) {
    let normal_matrix = Mat3A::from_mat4(*matrix).inverse().transpose();

    for mesh in &mut graph.meshes {
        for position in &mut mesh.positions {
            *position = matrix.transform_point3a(*position);
        }

        for buffer in [
            &mut mesh.normals,
            &mut mesh.tangents,
            &mut mesh.bitangents,
        ] {
            for vector in buffer.iter_mut() {
                *vector = (normal_matrix * *vector).normalize_or_zero();
            }
        }
    }
}

/// Replaces `c` with `1 - c` on the selected axes of every UV channel.
/// Applying the same flip twice restores the original coordinates.
pub fn flip_uvs(graph: &mut SceneGraph, flip_u: bool, flip_v: bool) {
    for mesh in &mut graph.meshes {
        for channel in &mut mesh.uv_channels {
            for uv in channel.iter_mut() {
                if flip_u {
                    uv.x = 1. - uv.x;
                }
                if flip_v {
                    uv.y = 1. - uv.y;
                }
            }
        }
    }
}

/// Folds every vertex position of a mesh into a range. Empty meshes yield an
/// invalid range.
pub fn calculate_bounding_box(mesh: &Mesh) -> Range3 {
    Range3::from_points(mesh.positions.iter().copied())
}

/// The union of all per-mesh bounding boxes. Invalid when the scene has no
/// geometry.
pub fn scene_bounding_box(graph: &SceneGraph) -> Range3 {
    let mut bounds = Range3::empty();
    for mesh in &graph.meshes {
        bounds.union_with(&calculate_bounding_box(mesh));
    }
    bounds
}

/// Collapses bit-identical vertices and rewrites the index buffer. Vertices
/// compare across every attribute, so only true duplicates merge.
pub fn join_identical_vertices(mesh: &mut Mesh) {
    let mut lookup: HashMap<Vec<u32>, u32> = HashMap::new();
    let mut kept: Vec<u32> = Vec::new();
    let mut remap: Vec<u32> = Vec::with_capacity(mesh.positions.len());

    for index in 0..mesh.positions.len() {
        let key = vertex_key(mesh, index);
        let target = *lookup.entry(key).or_insert_with(|| {
            kept.push(index as u32);
            kept.len() as u32 - 1
        });
        remap.push(target);
    }

    if kept.len() == mesh.positions.len() {
        return;
    }

    mesh.positions = gather(&mesh.positions, &kept);
    mesh.normals = gather(&mesh.normals, &kept);
    mesh.tangents = gather(&mesh.tangents, &kept);
    mesh.bitangents = gather(&mesh.bitangents, &kept);
    for channel in &mut mesh.uv_channels {
        *channel = gather(channel, &kept);
    }
    for channel in &mut mesh.color_channels {
        *channel = gather(channel, &kept);
    }

    for face in &mut mesh.faces {
        for index in face.iter_mut() {
            *index = remap[*index as usize];
        }
    }
}

fn gather<T: Copy>(buffer: &[T], kept: &[u32]) -> Vec<T> {
    if buffer.is_empty() {
        return Vec::new();
    }
    kept.iter().map(|&index| buffer[index as usize]).collect()
}

fn vertex_key(mesh: &Mesh, index: usize) -> Vec<u32> {
    let mut key = Vec::new();

    let mut push = |value: f32| key.push(value.to_bits());
    for buffer in [&mesh.positions, &mesh.normals, &mesh.tangents, &mesh.bitangents] {
        if let Some(vector) = buffer.get(index) {
            push(vector.x);
            push(vector.y);
            push(vector.z);
        }
    }
    for channel in &mesh.uv_channels {
        if let Some(uv) = channel.get(index) {
            push(uv.x);
            push(uv.y);
        }
    }
    for channel in &mesh.color_channels {
        if let Some(color) = channel.get(index) {
            for &component in color {
                push(component);
            }
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use pretty_assertions::assert_eq;

    use super::*;

    fn cube() -> Mesh {
        let mut mesh = Mesh {
            name: String::from("cube"),
            ..Default::default()
        };
        for z in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for x in [-0.5, 0.5] {
                    mesh.positions.push(Vec3A::new(x, y, z));
                }
            }
        }
        // Corner connectivity is irrelevant to the transform stages.
        mesh.faces = vec![[0, 1, 2], [4, 5, 6]];
        mesh
    }

    fn single_mesh(mesh: Mesh) -> SceneGraph {
        SceneGraph {
            meshes: vec![mesh],
            ..Default::default()
        }
    }

    #[test]
    fn swizzle_remaps_positions_and_normals() {
        let mut graph = single_mesh(Mesh {
            positions: vec![Vec3A::new(1., 2., 3.)],
            normals: vec![Vec3A::new(0., 0., 1.)],
            ..Default::default()
        });

        swizzle(&mut graph, &"x-zy".parse().unwrap());

        assert_eq!(Vec3A::new(1., -3., 2.), graph.meshes[0].positions[0]);
        assert_eq!(Vec3A::new(0., -1., 0.), graph.meshes[0].normals[0]);
    }

    #[test]
    fn scale_composes() {
        let mut sequential = single_mesh(cube());
        scale(&mut sequential, 3.);
        scale(&mut sequential, 0.5);

        let mut combined = single_mesh(cube());
        scale(&mut combined, 1.5);

        for (a, b) in sequential.meshes[0]
            .positions
            .iter()
            .zip(&combined.meshes[0].positions)
        {
            assert!(a.abs_diff_eq(*b, 1e-6));
        }
    }

    #[test]
    fn align_center_puts_scene_center_at_origin() {
        let mut shifted = cube();
        for position in &mut shifted.positions {
            *position += Vec3A::new(10., -4., 2.);
        }
        let mut graph = single_mesh(shifted);

        align(&mut graph, Align::Center, Align::Center, Align::Center);

        let bounds = scene_bounding_box(&graph);
        assert!(bounds.center().abs_diff_eq(Vec3A::ZERO, 1e-6));
    }

    #[test]
    fn align_uses_the_scene_box_not_per_mesh_boxes() {
        let mut left = cube();
        for position in &mut left.positions {
            *position += Vec3A::new(-2., 0., 0.);
        }
        let mut right = cube();
        for position in &mut right.positions {
            *position += Vec3A::new(3., 0., 0.);
        }
        let mut graph = SceneGraph {
            meshes: vec![left, right],
            ..Default::default()
        };

        align(&mut graph, Align::Min, Align::None, Align::None);

        let bounds = scene_bounding_box(&graph);
        assert!((bounds.min().x).abs() < 1e-6);
        // The gap between the meshes survives alignment.
        let left_box = calculate_bounding_box(&graph.meshes[0]);
        let right_box = calculate_bounding_box(&graph.meshes[1]);
        assert!((right_box.min().x - left_box.min().x - 5.).abs() < 1e-6);
    }

    #[test]
    fn align_skips_scenes_without_geometry() {
        let mut graph = SceneGraph::default();
        align(&mut graph, Align::Center, Align::Center, Align::Center);
        assert_eq!(SceneGraph::default(), graph);
    }

    #[test]
    fn transform_keeps_normals_perpendicular() {
        // A surface tangent and its normal under a non-uniform scale: the
        // plain linear part would break perpendicularity, the inverse
        // transpose must not.
        let normal = Vec3A::new(1., 1., 0.).normalize();
        let tangent = Vec3A::new(1., -1., 0.);
        let mut graph = single_mesh(Mesh {
            positions: vec![Vec3A::ZERO, tangent],
            normals: vec![normal, normal],
            ..Default::default()
        });

        let matrix = Mat4::from_scale(glam::Vec3::new(2., 1., 1.));
        transform(&mut graph, &matrix);

        let mesh = &graph.meshes[0];
        let transformed_tangent = mesh.positions[1] - mesh.positions[0];
        assert!(mesh.normals[0].dot(transformed_tangent).abs() < 1e-6);
        assert!((mesh.normals[0].length() - 1.).abs() < 1e-6);
    }

    #[test]
    fn flip_uvs_is_an_involution() {
        let original = vec![Vec2::new(0.25, 0.75), Vec2::new(0., 1.), Vec2::new(0.125, 0.625)];
        let mut graph = single_mesh(Mesh {
            positions: vec![Vec3A::ZERO; 3],
            uv_channels: vec![original.clone()],
            ..Default::default()
        });

        flip_uvs(&mut graph, false, true);
        assert_ne!(original, graph.meshes[0].uv_channels[0]);
        flip_uvs(&mut graph, false, true);
        assert_eq!(original, graph.meshes[0].uv_channels[0]);

        flip_uvs(&mut graph, true, true);
        flip_uvs(&mut graph, true, true);
        assert_eq!(original, graph.meshes[0].uv_channels[0]);
    }

    #[test]
    fn bounding_box_of_empty_mesh_is_invalid() {
        assert!(!calculate_bounding_box(&Mesh::default()).is_valid());
        assert!(!scene_bounding_box(&SceneGraph::default()).is_valid());
    }

    #[test]
    fn join_identical_vertices_collapses_duplicates() {
        // A quad written as two independent triangles shares an edge.
        let mut mesh = Mesh {
            positions: vec![
                Vec3A::new(0., 0., 0.),
                Vec3A::new(1., 0., 0.),
                Vec3A::new(1., 1., 0.),
                Vec3A::new(0., 0., 0.),
                Vec3A::new(1., 1., 0.),
                Vec3A::new(0., 1., 0.),
            ],
            faces: vec![[0, 1, 2], [3, 4, 5]],
            ..Default::default()
        };

        join_identical_vertices(&mut mesh);

        assert_eq!(4, mesh.positions.len());
        assert_eq!(vec![[0, 1, 2], [0, 2, 3]], mesh.faces);
    }

    #[test]
    fn join_respects_differing_attributes() {
        // Same position, different normal: a hard edge must survive.
        let mut mesh = Mesh {
            positions: vec![Vec3A::ZERO, Vec3A::ZERO],
            normals: vec![Vec3A::X, Vec3A::Y],
            faces: vec![[0, 1, 0]],
            ..Default::default()
        };

        join_identical_vertices(&mut mesh);

        assert_eq!(2, mesh.positions.len());
    }
}
