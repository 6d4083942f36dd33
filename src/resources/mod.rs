use std::path::{Path, PathBuf};

use crate::{
    context::{NO_TEXTURE, TextureHandle, Uploader},
    data_structures::{
        entity::EntityRecord,
        model::Mesh,
        scene_graph::{Scene, SceneObject},
    },
    resources::{
        index::{AssetIndex, normalize_model_name},
        mesh::{DEFAULT_MAX_INDEX_COUNT, build_geometry},
        nif::{ParsedAsset, read_asset},
        texture::TextureResolver,
    },
};

/**
 * This module contains all logic for loading a level from external files:
 * the `.xblock` descriptor, the `.nif` model tree and the `.dds` textures.
 */
pub mod dds;
pub mod index;
pub mod mesh;
pub mod nif;
pub mod texture;
pub mod xblock;

/// Default half edge length of the box used to pick scene objects.
pub const DEFAULT_PICK_HALF_EXTENT: f32 = 75.0;

const PROGRESS_BAR_WIDTH: usize = 50;

/// Where assets live and the thresholds applied while loading them.
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    /// Searched recursively for model files.
    pub model_root: PathBuf,
    /// Holds the texture folders; also the root of the fallback search.
    pub texture_root: PathBuf,
    pub asset_extension: String,
    pub texture_extension: String,
    /// Model files below this many bytes are reported but still parsed.
    pub min_asset_size: u64,
    pub max_index_count: usize,
    pub pick_half_extent: f32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            model_root: PathBuf::from("resources/models"),
            texture_root: PathBuf::from("resources/textures/textures"),
            asset_extension: "nif".to_string(),
            texture_extension: "dds".to_string(),
            min_asset_size: 64,
            max_index_count: DEFAULT_MAX_INDEX_COUNT,
            pick_half_extent: DEFAULT_PICK_HALF_EXTENT,
        }
    }
}

impl LoaderConfig {
    /// Default thresholds with the given asset roots.
    pub fn with_roots(model_root: impl Into<PathBuf>, texture_root: impl Into<PathBuf>) -> Self {
        Self {
            model_root: model_root.into(),
            texture_root: texture_root.into(),
            ..Default::default()
        }
    }
}

/**
 * Loads every entity of the descriptor at `descriptor_path` into a [`Scene`].
 *
 * Entities are processed in descriptor order and each mesh node of an entity's
 * model becomes one [`SceneObject`]. Nothing here is fatal: an entity whose model
 * is missing or broken is logged and skipped, a mesh that can't be built is
 * skipped on its own, and a missing texture leaves the object with
 * [`NO_TEXTURE`]. An unreadable descriptor or model root yields an empty scene.
 */
pub fn load_scene(
    descriptor_path: &Path,
    config: &LoaderConfig,
    uploader: &mut dyn Uploader,
) -> Scene {
    let source = descriptor_path.display().to_string();

    let index = match AssetIndex::build(&config.model_root, &config.asset_extension) {
        Ok(index) => index,
        Err(err) => {
            log::error!("Failed to index models: {err:#}");
            return Scene::empty(source);
        }
    };

    let descriptor = match xblock::Descriptor::load(descriptor_path) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            log::error!("Failed to load descriptor {source}: {err}");
            return Scene::empty(source);
        }
    };

    let mut textures = TextureResolver::new(&config.texture_root, &config.texture_extension);
    let mut objects = Vec::new();
    // progress counts every <entity> element, including ones the parser skipped
    let total = descriptor.len();
    for (i, entity) in descriptor.entities.iter().enumerate() {
        log::info!("{}", progress_bar(i + 1, total, PROGRESS_BAR_WIDTH));
        if let Some(entity) = entity {
            load_entity(entity, &index, &mut textures, config, uploader, &mut objects);
        }
    }

    log::info!(
        "Finished loading {} scene objects from {source}",
        objects.len()
    );
    Scene::new(source, objects)
}

fn load_entity(
    entity: &EntityRecord,
    index: &AssetIndex,
    textures: &mut TextureResolver,
    config: &LoaderConfig,
    uploader: &mut dyn Uploader,
    objects: &mut Vec<SceneObject>,
) {
    let Some(asset_path) = index.lookup(&entity.model_name) else {
        log::warn!(
            "Could not find model for {}: {}",
            entity.name,
            normalize_model_name(&entity.model_name)
        );
        return;
    };

    let asset = match read_asset(asset_path, config.min_asset_size)
        .and_then(|bytes| ParsedAsset::from_bytes(&bytes))
    {
        Ok(asset) => asset,
        Err(err) => {
            log::error!("Failed to parse model {}: {err}", asset_path.display());
            return;
        }
    };

    let model_path = asset_path.display().to_string();
    // one texture per model file, looked up once the first mesh is on the GPU
    let mut texture: Option<TextureHandle> = None;
    for (node, mesh) in asset.mesh_nodes() {
        if !mesh.has_attribute("texcoord") {
            log::warn!(
                "Skipping mesh without texcoord: {} ({})",
                entity.name,
                node.name
            );
            continue;
        }
        let geometry = match build_geometry(mesh, config.max_index_count) {
            Ok(geometry) => geometry,
            Err(err) => {
                log::warn!(
                    "Skipping mesh {} of {}: {err}",
                    node.name,
                    model_path
                );
                continue;
            }
        };
        let label = format!("{}/{}", entity.name, node.name);
        let handle = match uploader.upload_mesh(&label, &geometry.vertices, &geometry.indices) {
            Ok(handle) => handle,
            Err(err) => {
                log::error!("Failed to upload mesh {label}: {err:#}");
                continue;
            }
        };
        let texture_handle =
            *texture.get_or_insert_with(|| textures.load(asset_path, &entity.name, uploader));

        objects.push(SceneObject::new(
            &entity.name,
            &model_path,
            entity.position,
            entity.rotation,
            node.transform.as_ref(),
            Mesh {
                name: node.name.clone(),
                handle,
                num_elements: geometry.indices.len() as u32,
            },
            texture_handle,
        ));
    }

    if texture.is_none() {
        log::warn!("No usable mesh in {} for {}", model_path, entity.name);
    } else if texture == Some(NO_TEXTURE) {
        log::info!("{} will be drawn with the fallback texture", entity.name);
    }
}

/// `[=====>    ] 50% (1/2)` style progress line.
pub fn progress_bar(current: usize, total: usize, width: usize) -> String {
    let progress = if total == 0 {
        1.0
    } else {
        current as f32 / total as f32
    };
    let pos = (width as f32 * progress) as usize;
    let bar: String = (0..width)
        .map(|i| match i.cmp(&pos) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        })
        .collect();
    format!(
        "[{bar}] {}% ({current}/{total})",
        (progress * 100.0) as u32
    )
}
