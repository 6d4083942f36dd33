//! Vertex layout and mesh handles.

use std::mem;

/// Anything that can describe its own GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The single vertex layout used by every mesh in a scene.
///
/// Only position, texture coordinates and normals are sourced from model
/// assets. The remaining attributes exist so one shader can serve every
/// mesh; they always carry the values from [`ModelVertex::default`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
    pub morph_position: [f32; 3],
    pub blend_indices: [u8; 4],
    pub blend_weights: [f32; 4],
}

impl Default for ModelVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            tex_coords: [0.0; 2],
            normal: [0.0, 1.0, 0.0],
            // opaque white so untextured vertices don't tint the fallback texture
            color: [255; 4],
            tangent: [0.0; 3],
            binormal: [0.0; 3],
            morph_position: [0.0; 3],
            blend_indices: [0; 4],
            blend_weights: [0.0; 4],
        }
    }
}

/**
 * Offsets follow the field order of `ModelVertex`. Every field is 4-byte aligned
 * so `repr(C)` introduces no padding and the stride equals the sum of the fields.
 */
impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 15]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 18]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Uint8x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Opaque identifier of an uploaded mesh, issued by an [`Uploader`](crate::context::Uploader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// A mesh that has been uploaded and is ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub handle: MeshHandle,
    pub num_elements: u32,
}

/// The GPU buffers behind a [`MeshHandle`], owned by [`GpuContext`](crate::context::GpuContext).
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_no_padding() {
        let last = ModelVertex::desc().attributes.last().unwrap().offset as usize;
        assert_eq!(last + mem::size_of::<[f32; 4]>(), mem::size_of::<ModelVertex>());
        assert_eq!(mem::size_of::<ModelVertex>(), 92);
    }

    #[test]
    fn defaults_are_white_and_zeroed() {
        let v = ModelVertex::default();
        assert_eq!(v.color, [255; 4]);
        assert_eq!(v.blend_indices, [0; 4]);
        assert_eq!(v.blend_weights, [0.0; 4]);
        assert_eq!(v.morph_position, [0.0; 3]);
    }
}
