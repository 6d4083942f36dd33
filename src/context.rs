//! GPU context and the upload seam used by the scene loader.
//!
//! The loader never touches `wgpu` directly. It hands finished vertex/index
//! lists and decoded textures to an [`Uploader`] and keeps only the opaque
//! handles it gets back. [`GpuContext`] is the `wgpu` implementation; tests
//! and tools can substitute a recorder.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{GpuMesh, MeshHandle, ModelVertex},
        texture::Texture,
    },
    resources::dds::DdsTexture,
};

/// Opaque texture identifier. [`NO_TEXTURE`] is never issued for a real texture.
pub type TextureHandle = u32;

/// "No texture" sentinel; callers substitute a fallback at draw time.
pub const NO_TEXTURE: TextureHandle = 0;

/// Destination for geometry and textures produced by the loader.
pub trait Uploader {
    fn upload_mesh(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> anyhow::Result<MeshHandle>;

    /// Must never return [`NO_TEXTURE`] on success.
    fn upload_texture(&mut self, label: &str, texture: &DdsTexture)
    -> anyhow::Result<TextureHandle>;

    fn release_mesh(&mut self, handle: MeshHandle);
}

/// Owns the device/queue and every resource uploaded through it.
#[derive(Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    meshes: HashMap<MeshHandle, GpuMesh>,
    textures: HashMap<TextureHandle, Texture>,
    fallback: Texture,
    next_mesh: u32,
    next_texture: TextureHandle,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let fallback = Texture::create_white(&device, &queue);
        Self {
            device,
            queue,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            fallback,
            next_mesh: 0,
            next_texture: NO_TEXTURE,
        }
    }

    /// Create a context without a window, e.g. for tools and integration tests.
    ///
    /// BC texture compression is requested when the adapter offers it; without
    /// it every texture upload fails and objects fall back to white.
    pub async fn new_headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let required_features = adapter.features() & wgpu::Features::TEXTURE_COMPRESSION_BC;
        log::info!(
            "Headless adapter {:?}, BC compression: {}",
            adapter.get_info().name,
            !required_features.is_empty()
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("xblock-ngin headless device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        Ok(Self::new(device, queue))
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&GpuMesh> {
        self.meshes.get(&handle)
    }

    /// Resolves a handle for drawing, substituting the white fallback for
    /// [`NO_TEXTURE`] and unknown handles.
    pub fn texture(&self, handle: TextureHandle) -> &Texture {
        self.textures.get(&handle).unwrap_or(&self.fallback)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl Uploader for GpuContext {
    fn upload_mesh(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> anyhow::Result<MeshHandle> {
        let num_elements = u32::try_from(indices.len())?;
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", label)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.next_mesh += 1;
        let handle = MeshHandle(self.next_mesh);
        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                num_elements,
            },
        );
        Ok(handle)
    }

    fn upload_texture(
        &mut self,
        label: &str,
        texture: &DdsTexture,
    ) -> anyhow::Result<TextureHandle> {
        let texture = Texture::from_dds(&self.device, &self.queue, texture, label)?;
        self.next_texture += 1;
        self.textures.insert(self.next_texture, texture);
        Ok(self.next_texture)
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        if let Some(mesh) = self.meshes.remove(&handle) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }
}
