//! Finding and uploading the texture that belongs to a model asset.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    context::{NO_TEXTURE, TextureHandle, Uploader},
    resources::dds::DdsTexture,
};

/// Folder name used when a model sits too close to the filesystem root to
/// have a grandparent directory.
pub const UNKNOWN_FOLDER: &str = "unknown";

/// `<stem>.<texture_extension>` for the model at `asset_path`.
pub fn expected_texture_name(asset_path: &Path, texture_extension: &str) -> Option<String> {
    let stem = asset_path.file_stem()?.to_str()?;
    Some(format!("{stem}.{texture_extension}"))
}

/**
 * The best guess for a model's texture: textures are grouped by the name of the
 * folder two levels above the model, e.g. `meshes/rocks/lod0/rock01.nif` maps to
 * `<texture_root>/rocks/rock01.dds`. Backslashes are normalised so descriptors
 * written on Windows resolve the same way.
 */
pub fn primary_candidate(texture_root: &Path, asset_path: &Path, file_name: &str) -> PathBuf {
    let folder = asset_path
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_FOLDER);
    let joined = format!(
        "{}/{}/{}",
        texture_root.to_string_lossy().trim_end_matches(['/', '\\']),
        folder,
        file_name
    );
    PathBuf::from(joined.replace('\\', "/"))
}

/// Where a texture was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Primary(PathBuf),
    Fallback(PathBuf),
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Primary(path) | Resolution::Fallback(path) => path,
        }
    }
}

/// Resolves model assets to texture files below one texture root.
///
/// The fallback search walks the whole root once and remembers every file
/// name it saw (first occurrence wins), so later misses don't rescan the tree.
pub struct TextureResolver {
    root: PathBuf,
    extension: String,
    by_file_name: Option<HashMap<String, PathBuf>>,
}

impl TextureResolver {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            by_file_name: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&mut self, asset_path: &Path) -> Option<Resolution> {
        let file_name = expected_texture_name(asset_path, &self.extension)?;
        let primary = primary_candidate(&self.root, asset_path, &file_name);
        if primary.is_file() {
            return Some(Resolution::Primary(primary));
        }
        self.fallback(&file_name)
            .map(|path| Resolution::Fallback(path.to_path_buf()))
    }

    /// Resolves, decodes and uploads the texture for `asset_path`.
    ///
    /// Every failure degrades to [`NO_TEXTURE`] with a warning naming `owner`.
    pub fn load(
        &mut self,
        asset_path: &Path,
        owner: &str,
        uploader: &mut dyn Uploader,
    ) -> TextureHandle {
        let Some(resolution) = self.resolve(asset_path) else {
            log::warn!(
                "No texture found for {owner}: {}",
                expected_texture_name(asset_path, &self.extension)
                    .unwrap_or_else(|| asset_path.display().to_string())
            );
            return NO_TEXTURE;
        };
        let path = resolution.path();
        let handle = match upload(path, uploader) {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!(
                    "Failed to load texture {} for {owner}: {err:#}",
                    path.display()
                );
                return NO_TEXTURE;
            }
        };
        if let Resolution::Fallback(path) = &resolution {
            log::info!("Fallback matched texture: {}", path.display());
        }
        handle
    }

    fn fallback(&mut self, file_name: &str) -> Option<&Path> {
        let root = &self.root;
        let extension = &self.extension;
        let index = self
            .by_file_name
            .get_or_insert_with(|| scan_file_names(root, extension));
        index.get(file_name).map(PathBuf::as_path)
    }
}

fn upload(path: &Path, uploader: &mut dyn Uploader) -> anyhow::Result<TextureHandle> {
    let bytes = fs::read(path)?;
    let dds = DdsTexture::from_bytes(&bytes)?;
    let label = path.to_string_lossy();
    let handle = uploader.upload_texture(&label, &dds)?;
    if handle == NO_TEXTURE {
        anyhow::bail!("uploader returned the reserved handle {NO_TEXTURE}");
    }
    Ok(handle)
}

fn scan_file_names(root: &Path, extension: &str) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Failed to traverse {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_texture = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == extension);
        if !is_texture {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            let normalized = PathBuf::from(path.to_string_lossy().replace('\\', "/"));
            index.entry(name.to_string()).or_insert(normalized);
        }
    }
    log::info!(
        "Scanned {} .{} textures under {}",
        index.len(),
        extension,
        root.display()
    );
    index
}
