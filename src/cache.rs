//! Filesystem-backed cache of annotation records, keyed by resource
//! identifier. The cache is an explicit object constructed once per run and
//! passed by reference to whatever needs it; a hit is functionally
//! indistinguishable from a fresh read of the record.
//!
//! Discovery works through a pointer file in the home directory
//! (`~/.mergecounts-cache`) whose first line names the cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use hashbrown::HashMap;
use log::{debug, info};
use serde_json::Value;

/// File name of the cache pointer, resolved under the home directory.
pub const CACHE_POINTER_NAME: &str = ".mergecounts-cache";

/// Default pointer location: `~/.mergecounts-cache`.
pub fn default_pointer() -> anyhow::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CACHE_POINTER_NAME))
        .context("could not determine the home directory for the cache pointer")
}

/// Resolves the cache directory named by `pointer`, if one has been created.
/// A pointer naming a directory that no longer exists is an error rather
/// than a silent miss.
pub fn cache_folder(pointer: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !pointer.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(pointer)?;
    let location = match contents.lines().next() {
        Some(line) if !line.trim().is_empty() => PathBuf::from(line.trim()),
        _ => bail!("cache pointer {} is empty", pointer.display()),
    };
    if !location.exists() {
        bail!(
            "cache pointed to in {} does not exist: {}",
            pointer.display(),
            location.display()
        );
    }
    Ok(Some(location))
}

/// Creates a fresh cache directory and records it in `pointer`. Refuses to
/// overwrite an existing cache.
pub fn create_new_cache_folder(pointer: &Path) -> anyhow::Result<PathBuf> {
    if let Some(existing) = cache_folder(pointer)? {
        bail!("refusing to overwrite existing cache: {}", existing.display());
    }
    let location = tempfile::tempdir()?.keep();
    fs::write(pointer, location.to_string_lossy().as_bytes())?;
    info!(
        "created new cache folder pointer at {} to {}",
        pointer.display(),
        location.display()
    );
    Ok(location)
}

/// Removes the cache directory and the pointer, silently succeeding when
/// either is already gone.
pub fn clean_cache(pointer: &Path) -> anyhow::Result<()> {
    match cache_folder(pointer) {
        Ok(Some(location)) => {
            debug!("removing cache folder: {}", location.display());
            fs::remove_dir_all(&location)?;
        },
        _ => debug!("no cache folder to delete"),
    }
    if pointer.exists() {
        debug!("removing cache folder pointer");
        fs::remove_file(pointer)?;
    }
    Ok(())
}

/// In-memory view of the persisted record cache. Entries live as one JSON
/// file per resource identifier under `<root>/records/`.
#[derive(Debug)]
pub struct FileCache {
    root:    PathBuf,
    records: HashMap<String, Value>,
}

impl FileCache {
    /// Opens (and hydrates) the cache rooted at `root`.
    pub fn at(root: PathBuf) -> anyhow::Result<Self> {
        let mut cache = FileCache {
            root,
            records: HashMap::new(),
        };
        cache.hydrate()?;
        Ok(cache)
    }

    /// Opens the cache named by the pointer file, creating a new cache
    /// directory when none exists yet.
    pub fn discover(pointer: &Path) -> anyhow::Result<Self> {
        let root = match cache_folder(pointer)? {
            Some(existing) => existing,
            None => create_new_cache_folder(pointer)?,
        };
        Self::at(root)
    }

    /// Directory this cache persists into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    fn hydrate(&mut self) -> anyhow::Result<()> {
        let dir = self.records_dir();
        if !dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let value = serde_json::from_str(&fs::read_to_string(&path)?)
                .with_context(|| format!("parsing cached record {}", path.display()))?;
            self.records.insert(id, value);
        }
        info!("loaded {} entries from the record cache", self.records.len());
        Ok(())
    }

    /// Cache lookup. A hit carries exactly what [FileCache::insert] stored.
    pub fn get(
        &self,
        id: &str,
    ) -> Option<&Value> {
        let result = self.records.get(id);
        match result {
            Some(_) => debug!("cache HIT on record for id: {}", id),
            None => debug!("cache MISS on record for id: {}", id),
        }
        result
    }

    /// Records an entry in memory and persists it to the filesystem.
    pub fn insert(
        &mut self,
        id: &str,
        record: Value,
    ) -> anyhow::Result<()> {
        let dir = self.records_dir();
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(format!("{id}.json")),
            serde_json::to_string(&record)?,
        )?;
        self.records.insert(id.to_string(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn miss_insert_hit() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::at(dir.path().to_path_buf()).unwrap();

        assert!(cache.get("file-1").is_none());
        cache
            .insert("file-1", json!({"sample_name": "SJE001"}))
            .unwrap();
        assert_eq!(
            cache.get("file-1").unwrap()["sample_name"],
            json!("SJE001")
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn hydrates_persisted_entries() {
        let dir = TempDir::new().unwrap();
        {
            let mut cache = FileCache::at(dir.path().to_path_buf()).unwrap();
            cache.insert("a", json!({"x": 1})).unwrap();
            cache.insert("b", json!({"x": 2})).unwrap();
        }

        let reopened = FileCache::at(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("b").unwrap()["x"], json!(2));
    }

    #[test]
    fn pointer_lifecycle() {
        let dir = TempDir::new().unwrap();
        let pointer = dir.path().join("pointer");

        assert!(cache_folder(&pointer).unwrap().is_none());
        let created = create_new_cache_folder(&pointer).unwrap();
        assert_eq!(cache_folder(&pointer).unwrap().unwrap(), created);

        // A second create must refuse to clobber the existing cache.
        assert!(create_new_cache_folder(&pointer).is_err());

        clean_cache(&pointer).unwrap();
        assert!(!pointer.exists());
        assert!(!created.exists());
        // Cleaning an absent cache silently succeeds.
        clean_cache(&pointer).unwrap();
    }

    #[test]
    fn stale_pointer_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pointer = dir.path().join("pointer");
        fs::write(&pointer, "/definitely/not/a/real/cache/dir").unwrap();
        assert!(cache_folder(&pointer).is_err());
    }

    #[test]
    fn discover_creates_then_reuses() {
        let dir = TempDir::new().unwrap();
        let pointer = dir.path().join("pointer");

        let mut first = FileCache::discover(&pointer).unwrap();
        first.insert("id", json!({"k": "v"})).unwrap();
        let root = first.root().to_path_buf();

        let second = FileCache::discover(&pointer).unwrap();
        assert_eq!(second.root(), root);
        assert_eq!(second.len(), 1);

        clean_cache(&pointer).unwrap();
    }
}
