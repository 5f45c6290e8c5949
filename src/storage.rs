use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Flag,
    Config,
    Platform,
}

#[derive(Debug, Clone)]
pub struct DataLocation {
    pub dir: PathBuf,
    pub source: LocationSource,
}

impl LocationSource {
    pub fn label(&self) -> &'static str {
        match self {
            LocationSource::Flag => "flag",
            LocationSource::Config => "config",
            LocationSource::Platform => "default",
        }
    }
}

/// Picks the data directory: command-line flag, then config, then the
/// platform data directory.
pub fn locate_data(flag: Option<PathBuf>, configured: Option<PathBuf>) -> Result<DataLocation> {
    if let Some(dir) = flag {
        return Ok(DataLocation {
            dir,
            source: LocationSource::Flag,
        });
    }
    if let Some(dir) = configured {
        return Ok(DataLocation {
            dir,
            source: LocationSource::Config,
        });
    }
    let dirs = ProjectDirs::from("", "", "moodplanner").context("locating data directory")?;
    Ok(DataLocation {
        dir: dirs.data_dir().to_path_buf(),
        source: LocationSource::Platform,
    })
}

/// Key-value persistence for whole serialized blobs.
pub trait BlobStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBlobStore { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)
    }
}

/// In-memory collection mirrored to a single blob. Loaded once, rewritten in
/// full after every mutation.
#[derive(Debug)]
pub struct Collection<T, S = FileBlobStore> {
    key: &'static str,
    store: S,
    items: Vec<T>,
}

impl<T, S> Collection<T, S>
where
    T: Serialize + DeserializeOwned,
    S: BlobStore,
{
    /// Reads the stored collection, or calls `fallback` when the blob is
    /// missing, unreadable or undecodable.
    pub fn load_or_else(store: S, key: &'static str, fallback: impl FnOnce() -> Vec<T>) -> Self {
        let items = match read_items(&store, key) {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::debug!(key, "no stored collection, using default");
                fallback()
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable collection");
                fallback()
            }
        };
        Collection { key, store, items }
    }

    pub fn load(store: S, key: &'static str) -> Self {
        Self::load_or_else(store, key, Vec::new)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Applies `f` and rewrites the blob. A failed write leaves the in-memory
    /// change in place.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items);
        self.persist();
        result
    }

    pub fn persist(&self) {
        if let Err(err) = self.try_persist() {
            tracing::warn!(key = self.key, error = %err, "failed to save collection");
        }
    }

    fn try_persist(&self) -> Result<()> {
        let encoded = serde_json::to_vec(&self.items).context("serializing collection")?;
        self.store
            .set(self.key, &encoded)
            .with_context(|| format!("writing {}", self.key))?;
        tracing::trace!(key = self.key, count = self.items.len(), "collection saved");
        Ok(())
    }
}

fn read_items<T: DeserializeOwned>(store: &impl BlobStore, key: &str) -> Result<Option<Vec<T>>> {
    let bytes = match store.get(key).with_context(|| format!("reading {}", key))? {
        Some(bytes) => bytes,
        None => return Ok(None),
    };
    let items = serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", key))?;
    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
    struct Item {
        id: String,
        n: u32,
    }

    fn item(id: &str, n: u32) -> Item {
        Item { id: id.into(), n }
    }

    #[test]
    fn missing_blob_uses_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let c: Collection<Item> =
            Collection::load_or_else(FileBlobStore::new(dir.path()), "things", || {
                vec![item("seed", 0)]
            });
        assert_eq!(c.items(), &[item("seed", 0)]);
    }

    #[test]
    fn mutation_is_written_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut c: Collection<Item> = Collection::load(FileBlobStore::new(dir.path()), "things");
        c.mutate(|items| items.push(item("a", 1)));
        c.mutate(|items| items.push(item("b", 2)));

        let reloaded: Collection<Item> =
            Collection::load(FileBlobStore::new(dir.path()), "things");
        assert_eq!(reloaded.items(), c.items());
        assert!(dir.path().join("things.json").exists());
        assert!(!dir.path().join("things.json.tmp").exists());
    }

    #[test]
    fn corrupt_blob_falls_back_silently() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("things.json"), b"{not json").unwrap();
        let c: Collection<Item> = Collection::load(FileBlobStore::new(dir.path()), "things");
        assert!(c.items().is_empty());
    }

    #[test]
    fn wrong_shape_falls_back_silently() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("things.json"), br#"{"id": "x"}"#).unwrap();
        let c: Collection<Item> =
            Collection::load_or_else(FileBlobStore::new(dir.path()), "things", || {
                vec![item("default", 9)]
            });
        assert_eq!(c.items(), &[item("default", 9)]);
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a plain file where the data directory should be
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();
        let mut c: Collection<Item> = Collection::load(FileBlobStore::new(&blocker), "things");
        c.mutate(|items| items.push(item("a", 1)));
        assert_eq!(c.items(), &[item("a", 1)]);
    }

    #[test]
    fn overwrite_replaces_whole_blob() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileBlobStore::new(dir.path());
        store.set("k", b"[1,2,3]").unwrap();
        store.set("k", b"[]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"[]"[..]));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn flag_beats_config_for_data_dir() {
        let loc = locate_data(Some("/tmp/a".into()), Some("/tmp/b".into())).unwrap();
        assert_eq!(loc.dir, PathBuf::from("/tmp/a"));
        assert_eq!(loc.source, LocationSource::Flag);
        let loc = locate_data(None, Some("/tmp/b".into())).unwrap();
        assert_eq!(loc.source, LocationSource::Config);
    }
}
