use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::error::LoadError;

/// Load-by-identifier access to model and media assets.
pub trait AssetSource {
    /// Returns the raw bytes stored under `id`.
    fn fetch(&self, id: &str) -> Result<Vec<u8>>;

    /// Returns the asset stored under `id` decoded as UTF-8 text.
    fn fetch_text(&self, id: &str) -> Result<String> {
        let bytes = self.fetch(id)?;
        String::from_utf8(bytes).map_err(|err| anyhow!("asset {id} is not valid UTF-8: {err}"))
    }
}

impl<T> AssetSource for Arc<T>
where
    T: AssetSource + ?Sized,
{
    fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        (**self).fetch(id)
    }
}

/// Assets resolved relative to a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let relative = Path::new(id);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(anyhow!("asset id {id} escapes the asset directory"));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for DirAssetSource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        let path = self.resolve(id)?;
        let mut file =
            File::open(&path).with_context(|| format!("unable to open {}", path.display()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .with_context(|| format!("unable to read {}", path.display()))?;
        Ok(data)
    }
}

/// Assets already resident in memory, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    entries: HashMap<String, Arc<[u8]>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.entries
            .insert(id.into(), Arc::from(data.into_boxed_slice()));
    }

    pub fn with(mut self, id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(id, data);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        self.entries
            .get(id)
            .map(|data| data.to_vec())
            .ok_or_else(|| anyhow!("asset not found: {id}"))
    }
}

/// Media payload handed to an audio sink once a load completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub id: String,
    pub data: Arc<[u8]>,
}

impl AudioBuffer {
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            data: Arc::from(data.into_boxed_slice()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Fetches an audio track, mapping failures onto the [`LoadError`] taxonomy.
pub fn load_audio(source: &dyn AssetSource, id: &str) -> Result<AudioBuffer, LoadError> {
    let data = source
        .fetch(id)
        .with_context(|| format!("failed to fetch audio track {id}"))
        .map_err(|err| LoadError::asset(id, &err))?;
    if data.is_empty() {
        return Err(LoadError::Empty { id: id.to_string() });
    }
    Ok(AudioBuffer::new(id, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_source_returns_inserted_bytes() {
        let source = MemoryAssetSource::new().with("Audio/a.mp3", b"ID3".to_vec());
        assert_eq!(source.fetch("Audio/a.mp3").unwrap(), b"ID3");
        assert!(source.fetch("Audio/b.mp3").is_err());
    }

    #[test]
    fn dir_source_reads_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Audio")).unwrap();
        let mut file = File::create(dir.path().join("Audio/a.mp3")).unwrap();
        file.write_all(b"abc").unwrap();

        let source = DirAssetSource::new(dir.path());
        assert_eq!(source.fetch("Audio/a.mp3").unwrap(), b"abc");
        assert_eq!(source.fetch_text("Audio/a.mp3").unwrap(), "abc");
    }

    #[test]
    fn dir_source_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirAssetSource::new(dir.path());
        assert!(source.fetch("../secret").is_err());
    }

    #[test]
    fn empty_audio_is_a_load_error() {
        let source = MemoryAssetSource::new().with("silence.mp3", Vec::new());
        assert_eq!(
            load_audio(&source, "silence.mp3"),
            Err(LoadError::Empty {
                id: "silence.mp3".into()
            })
        );
    }

    #[test]
    fn missing_audio_is_an_asset_error() {
        let source = MemoryAssetSource::new();
        match load_audio(&source, "missing.mp3") {
            Err(LoadError::Asset { id, .. }) => assert_eq!(id, "missing.mp3"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
