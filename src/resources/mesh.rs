use cgmath::{Deg, Matrix3, Matrix4, Vector3, Vector4};

use crate::{
    data_structures::model::ModelVertex,
    resources::nif::{AttributeStream, ComponentType, MeshData},
};

/// Sanity bound on the index count of a single mesh.
pub const DEFAULT_MAX_INDEX_COUNT: usize = 10_000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("required attribute '{0}' is missing")]
    MissingAttribute(&'static str),
    #[error("attribute '{name}' must be {expected} f32 components")]
    BadAttribute { name: &'static str, expected: u8 },
    #[error("mismatch between positions ({positions}) and texcoords ({tex_coords})")]
    LengthMismatch { positions: usize, tex_coords: usize },
    #[error("invalid index count {count} (allowed 1..={max})")]
    IndexCount { count: usize, max: usize },
    #[error("index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Vertex and index lists ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

/**
 * Model assets are authored Z-up and facing the other way. Rotating +90° about X and
 * then +180° about Y brings them into the scene's Y-up frame.
 */
pub fn orientation_fix() -> Matrix4<f32> {
    Matrix4::from_angle_x(Deg(90.0)) * Matrix4::from_angle_y(Deg(180.0))
}

/**
 * Converts one mesh node into the shared vertex layout.
 *
 * Positions and texture coordinates are required and must have the same length.
 * Normals are optional: vertices past the end of the normal stream point up.
 * Only position, uv and normal come from the asset, everything else keeps the
 * `ModelVertex` defaults.
 */
pub fn build_geometry(mesh: &MeshData, max_index_count: usize) -> Result<Geometry, GeometryError> {
    let positions = vec3_stream(mesh, "position")?.ok_or(GeometryError::MissingAttribute("position"))?;
    let tex_coords = vec2_stream(mesh, "texcoord")?.ok_or(GeometryError::MissingAttribute("texcoord"))?;
    let normals = vec3_stream(mesh, "normal")?.unwrap_or_default();

    if positions.len() != tex_coords.len() {
        return Err(GeometryError::LengthMismatch {
            positions: positions.len(),
            tex_coords: tex_coords.len(),
        });
    }

    let fix = orientation_fix();
    let normal_fix = Matrix3::from_cols(fix.x.truncate(), fix.y.truncate(), fix.z.truncate());

    let vertices = positions
        .iter()
        .zip(tex_coords.iter())
        .enumerate()
        .map(|(i, (position, uv))| {
            let position = fix * Vector4::new(position[0], position[1], position[2], 1.0);
            let normal = normals
                .get(i)
                .map_or(Vector3::unit_y(), |n| normal_fix * Vector3::from(*n));
            ModelVertex {
                position: position.truncate().into(),
                // the renderer samples with the origin at the top left
                tex_coords: [uv[0], 1.0 - uv[1]],
                normal: normal.into(),
                ..Default::default()
            }
        })
        .collect::<Vec<_>>();

    let indices = mesh.indices.clone();
    if indices.is_empty() || indices.len() > max_index_count {
        return Err(GeometryError::IndexCount {
            count: indices.len(),
            max: max_index_count,
        });
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(GeometryError::IndexOutOfRange {
            index,
            vertices: vertices.len(),
        });
    }

    Ok(Geometry { vertices, indices })
}

fn f32_stream<'a>(
    mesh: &'a MeshData,
    name: &'static str,
    components: u8,
) -> Result<Option<&'a [f32]>, GeometryError> {
    let Some((desc, stream)) = mesh.stream(name) else {
        return Ok(None);
    };
    match stream {
        AttributeStream::F32(values)
            if desc.component_type == ComponentType::F32 && desc.components == components =>
        {
            Ok(Some(values.as_slice()))
        }
        _ => Err(GeometryError::BadAttribute {
            name,
            expected: components,
        }),
    }
}

fn vec3_stream(mesh: &MeshData, name: &'static str) -> Result<Option<Vec<[f32; 3]>>, GeometryError> {
    Ok(f32_stream(mesh, name, 3)?.map(|values| {
        values
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    }))
}

fn vec2_stream(mesh: &MeshData, name: &'static str) -> Result<Option<Vec<[f32; 2]>>, GeometryError> {
    Ok(f32_stream(mesh, name, 2)?.map(|values| values.chunks_exact(2).map(|c| [c[0], c[1]]).collect()))
}
