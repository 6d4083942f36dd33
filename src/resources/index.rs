//! Case-insensitive lookup from model names to asset files.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

/// Maps lowercased file stems to the files found under one root.
///
/// Built once per scene load and only read afterwards. Stems that collide
/// (e.g. `Rock.nif` and `rock.NIF` in different folders) resolve to whichever
/// file the walk visited last, so lookups are best effort.
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    entries: HashMap<String, PathBuf>,
}

impl AssetIndex {
    /// Recursively indexes every regular file under `root` with the given
    /// extension (compared without the dot and ignoring ASCII case).
    pub fn build(root: &Path, extension: &str) -> anyhow::Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("asset root {} is not a directory", root.display());
        }
        let mut entries = HashMap::new();
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
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if !matches {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                log::warn!("Skipping asset with non UTF-8 name: {}", path.display());
                continue;
            };
            let key = stem.to_lowercase();
            if let Some(previous) = entries.insert(key, path.to_path_buf()) {
                log::info!(
                    "Asset {} shadows {} (same normalized name)",
                    path.display(),
                    previous.display()
                );
            }
        }
        log::info!(
            "Indexed {} .{} assets under {}",
            entries.len(),
            extension,
            root.display()
        );
        Ok(Self { entries })
    }

    pub fn lookup(&self, model_name: &str) -> Option<&Path> {
        self.entries
            .get(&normalize_model_name(model_name))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Descriptor model names may end in one `_` that asset files don't have.
pub fn normalize_model_name(model_name: &str) -> String {
    model_name
        .strip_suffix('_')
        .unwrap_or(model_name)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn normalizes_a_single_trailing_underscore() {
        assert_eq!(normalize_model_name("Rock01_"), "rock01");
        assert_eq!(normalize_model_name("Rock01__"), "rock01_");
        assert_eq!(normalize_model_name("ROCK"), "rock");
        assert_eq!(normalize_model_name(""), "");
    }

    #[test]
    fn lookup_is_case_and_extension_agnostic() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("world").join("meshes");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("foo.nif"), b"x").unwrap();
        fs::write(nested.join("Bar.NIF"), b"x").unwrap();
        fs::write(nested.join("foo.dds"), b"x").unwrap();
        fs::write(nested.join("readme.txt"), b"x").unwrap();

        let index = AssetIndex::build(dir.path(), "nif").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("Foo_"), Some(nested.join("foo.nif").as_path()));
        assert_eq!(index.lookup("FOO"), Some(nested.join("foo.nif").as_path()));
        assert_eq!(index.lookup("bar_"), Some(nested.join("Bar.NIF").as_path()));
        assert_eq!(index.lookup("readme"), None);
    }

    #[test]
    fn colliding_stems_keep_the_last_visited_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a").join("Rock.nif"), b"x").unwrap();
        fs::write(dir.path().join("b").join("rock.nif"), b"x").unwrap();

        let index = AssetIndex::build(dir.path(), "nif").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup("rock"),
            Some(dir.path().join("b").join("rock.nif").as_path())
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AssetIndex::build(&dir.path().join("missing"), "nif").is_err());
    }
}
