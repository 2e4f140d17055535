use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

pub trait Serializer {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>>;
    fn deserialize<T: serde::de::DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

/// Compact JSON, matching the layout of the inventory files in use.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: serde::Serialize>(&self, data: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(data).map_err(Into::into)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(Into::into)
    }
}

pub trait FileSerializer {
    fn save_to_file<T, S: Serializer>(&self, path: &Path, data: &T, serializer: &S) -> Result<()>
    where
        T: Serialize;
    fn load_from_file<T, S: Serializer>(&self, path: &Path, serializer: &S) -> Result<T>
    where
        T: DeserializeOwned;
}

pub struct FileUtils;

impl FileSerializer for FileUtils {
    /// Replace `path` wholesale. The content is written to a sibling temp file first,
    /// so readers never observe a half-written document.
    fn save_to_file<T, S: Serializer>(&self, path: &Path, data: &T, serializer: &S) -> Result<()>
    where
        T: serde::Serialize,
    {
        let content = serializer.serialize(data)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to stage {}", path.display()))?;
        file.write_all(&content)?;
        file.persist(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn load_from_file<T, S: Serializer>(&self, path: &Path, serializer: &S) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let content =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serializer
            .deserialize(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}
