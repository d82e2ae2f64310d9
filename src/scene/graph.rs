use glam::{Vec2, Vec3A};

/// The intermediary scene produced by an importer and consumed by the
/// transform stages and exporters. Non-geometric components are dropped at
/// import; their source-document counts are retained for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    pub meshes: Vec<Mesh>,
    pub counts: SourceCounts,
}

impl SceneGraph {
    pub fn num_vertices(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.positions.len()).sum()
    }

    pub fn num_faces(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.faces.len()).sum()
    }
}

/// Component counts recorded from the source document before stripping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub materials: usize,
    pub textures: usize,
    pub lights: usize,
    pub cameras: usize,
    pub animations: usize,
}

/// The geometry of a single mesh, stored as per-attribute buffers. Optional
/// attributes are empty when absent; non-empty attribute buffers always match
/// `positions` in length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3A>,
    pub normals: Vec<Vec3A>,
    pub tangents: Vec<Vec3A>,
    pub bitangents: Vec<Vec3A>,
    /// UV mapping channels, outermost per channel.
    pub uv_channels: Vec<Vec<Vec2>>,
    /// RGBA vertex color channels, outermost per channel.
    pub color_channels: Vec<Vec<[f32; 4]>>,
    /// Triangle list indexing into the attribute buffers.
    pub faces: Vec<[u32; 3]>,
    /// Whether the source mesh was skinned. The weights themselves are
    /// dropped at import.
    pub has_bones: bool,
}

impl Mesh {
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_tangents_and_bitangents(&self) -> bool {
        !self.tangents.is_empty() && !self.bitangents.is_empty()
    }

    pub fn has_tex_coords(&self) -> bool {
        self.uv_channels.first().map_or(false, |uv| !uv.is_empty())
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.color_channels
            .first()
            .map_or(false, |colors| !colors.is_empty())
    }

    pub fn num_uv_channels(&self) -> usize {
        self.uv_channels.len()
    }

    pub fn num_color_channels(&self) -> usize {
        self.color_channels.len()
    }
}
