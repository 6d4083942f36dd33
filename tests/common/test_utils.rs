#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use xblock_ngin::{
    LoaderConfig, TextureHandle, Uploader,
    data_structures::model::{MeshHandle, ModelVertex},
    resources::dds::DdsTexture,
};

/// Uploader that only counts what it receives.
#[derive(Default)]
pub(crate) struct RecordingUploader {
    pub meshes: Vec<(String, usize)>,
    pub textures: Vec<(String, u32, u32)>,
    pub released: Vec<MeshHandle>,
}

impl Uploader for RecordingUploader {
    fn upload_mesh(
        &mut self,
        label: &str,
        _vertices: &[ModelVertex],
        indices: &[u32],
    ) -> anyhow::Result<MeshHandle> {
        self.meshes.push((label.to_string(), indices.len()));
        Ok(MeshHandle(self.meshes.len() as u32))
    }

    fn upload_texture(
        &mut self,
        label: &str,
        texture: &DdsTexture,
    ) -> anyhow::Result<TextureHandle> {
        self.textures
            .push((label.to_string(), texture.width, texture.height));
        Ok(self.textures.len() as TextureHandle)
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        self.released.push(handle);
    }
}

/// A level laid out on disk: `models/`, `textures/` and a descriptor.
pub(crate) struct TestLevel {
    pub dir: tempfile::TempDir,
    pub config: LoaderConfig,
}

impl TestLevel {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = LoaderConfig::with_roots(dir.path().join("models"), dir.path().join("textures"));
        fs::create_dir_all(&config.model_root).expect("model root");
        fs::create_dir_all(&config.texture_root).expect("texture root");
        Self { dir, config }
    }

    pub fn model(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        write(&self.config.model_root.join(relative), bytes)
    }

    pub fn texture(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        write(&self.config.texture_root.join(relative), bytes)
    }

    pub fn descriptor(&self, entities: &str) -> PathBuf {
        write(
            &self.dir.path().join("level.xblock"),
            format!("<?xml version=\"1.0\"?>\n<game>\n<entitySet>\n{entities}\n</entitySet>\n</game>\n")
                .as_bytes(),
        )
    }
}

fn write(path: &Path, bytes: &[u8]) -> PathBuf {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, bytes).expect("write fixture");
    path.to_path_buf()
}

pub(crate) fn entity(model: &str, name: &str, position: &str, rotation: &str) -> String {
    format!(
        r#"<entity modelName="{model}" name="{name}">
  <property name="Position"><set value="{position}"/></property>
  <property name="Rotation"><set value="{rotation}"/></property>
</entity>"#
    )
}

/// A model file with one unit quad (position + texcoord, 4 vertices, 6 indices).
pub(crate) fn quad_model(node_name: &str) -> Vec<u8> {
    let mut bytes = b"Gamebryo File Format, Version 20.2.0.7\n".to_vec();
    bytes.extend_from_slice(&0x1402_0007u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());

    put_string(&mut bytes, node_name);
    bytes.extend_from_slice(&(-1i32).to_le_bytes());
    bytes.push(0b10);

    bytes.extend_from_slice(&2u32.to_le_bytes());
    for (name, components) in [("position", 3u8), ("texcoord", 2u8)] {
        put_string(&mut bytes, name);
        bytes.push(0);
        bytes.push(components);
    }
    bytes.extend_from_slice(&4u32.to_le_bytes());
    let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
    let tex_coords = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    for v in positions.iter().chain(tex_coords.iter()) {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let indices = [0u32, 1, 2, 0, 2, 3];
    bytes.extend_from_slice(&(indices.len() as u32).to_le_bytes());
    for i in indices {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes
}

fn put_string(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// A single-level DXT1 texture of the given size.
pub(crate) fn dxt1_texture(width: u32, height: u32) -> Vec<u8> {
    let mut header = vec![0u8; 124];
    header[0..4].copy_from_slice(&124u32.to_le_bytes());
    header[8..12].copy_from_slice(&height.to_le_bytes());
    header[12..16].copy_from_slice(&width.to_le_bytes());
    let size = width.div_ceil(4) * height.div_ceil(4) * 8;
    header[16..20].copy_from_slice(&size.to_le_bytes());
    header[24..28].copy_from_slice(&1u32.to_le_bytes());
    header[80..84].copy_from_slice(b"DXT1");

    let mut bytes = b"DDS ".to_vec();
    bytes.extend(header);
    bytes.resize(bytes.len() + size as usize, 0x55);
    bytes
}
