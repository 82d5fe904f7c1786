//! Filesystem access for one configured root, plus the two backend variants
//! `--backend` selects between (spec.md §4.C): `simple-dir` (always rescans)
//! and `cached-dir` (wraps a per-root listing cache, spec.md §4.D).
//!
//! Grounded on the trait-plus-tagged-construction shape of
//! [`crate::filename`]'s neighbor in the teacher, `server/src/tokenizer.rs`
//! (`Tokenizer` trait + `create_tokenizer(name)` factory).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Opaque shard key for the Catalog Cache, assigned by index into the
/// configured roots list at startup rather than keying on `PathBuf` itself.
pub type RootId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub filename: String,
    pub size: u64,
    pub mtime: SystemTime,
}

pub trait StorageBackend: Send + Sync {
    /// Enumerate visible files one level deep under `root`. Unordered.
    fn list_artifacts(&self, root: &Path) -> Result<Vec<RawEntry>, AppError>;
    fn open(&self, root: &Path, filename: &str) -> Result<File, AppError>;
    /// Write `data` to `root/filename` atomically (temp file + rename).
    /// Does not check for collisions against other roots — that is a
    /// catalog-level concern since it spans roots this backend can't see.
    fn create(&self, root: &Path, filename: &str, data: &[u8]) -> Result<(), AppError>;
    fn remove(&self, root: &Path, filename: &str) -> Result<(), AppError>;
    /// Hex-encoded SHA-256 of the file's contents, memoized by
    /// (path, len, mtime).
    fn digest(&self, root: &Path, filename: &str) -> Result<String, AppError>;
    /// Drop any cached listing for `root`. A no-op for backends that don't
    /// cache.
    fn invalidate(&self, _root: &Path) {}
}

/// True for a path component (or bare filename) that makes the entry
/// invisible per spec.md §3: begins with `.`.
fn is_hidden_component(name: &str) -> bool {
    name.starts_with('.')
}

#[derive(Default)]
struct DigestCache {
    entries: DashMap<PathBuf, (u64, SystemTime, String)>,
}

impl DigestCache {
    fn get_or_compute(&self, path: &Path, len: u64, mtime: SystemTime) -> std::io::Result<String> {
        if let Some(entry) = self.entries.get(path) {
            if entry.0 == len && entry.1 == mtime {
                return Ok(entry.2.clone());
            }
        }
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        let hex_digest = hex::encode(hasher.finalize());
        self.entries.insert(path.to_path_buf(), (len, mtime, hex_digest.clone()));
        Ok(hex_digest)
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn tmp_path_for(root: &Path, filename: &str) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    root.join(format!(".pindex-tmp-{}-{}-{filename}", std::process::id(), n))
}

/// Bare filesystem backend: every `list_artifacts` call rescans the
/// directory. No caching beyond the digest memoization spec.md §4.C
/// requires regardless of backend choice.
#[derive(Default)]
pub struct SimpleDirBackend {
    digests: DigestCache,
}

impl SimpleDirBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, root: &Path, filename: &str) -> Result<PathBuf, AppError> {
        if filename.contains('/') || filename.contains('\\') || is_hidden_component(filename) {
            return Err(AppError::NotFound(filename.to_string()));
        }
        Ok(root.join(filename))
    }
}

impl StorageBackend for SimpleDirBackend {
    fn list_artifacts(&self, root: &Path) -> Result<Vec<RawEntry>, AppError> {
        let read_dir = match fs::read_dir(root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if is_hidden_component(name) {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            out.push(RawEntry {
                filename: name.to_string(),
                size: meta.len(),
                mtime: meta.modified()?,
            });
        }
        Ok(out)
    }

    fn open(&self, root: &Path, filename: &str) -> Result<File, AppError> {
        let path = self.resolve(root, filename)?;
        File::open(path).map_err(Into::into)
    }

    fn create(&self, root: &Path, filename: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.resolve(root, filename)?;
        fs::create_dir_all(root)?;
        let tmp = tmp_path_for(root, filename);
        let write_result = (|| -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(data)?;
            f.sync_all()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        })();
        if write_result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        write_result.map_err(Into::into)
    }

    fn remove(&self, root: &Path, filename: &str) -> Result<(), AppError> {
        let path = self.resolve(root, filename)?;
        fs::remove_file(path).map_err(Into::into)
    }

    fn digest(&self, root: &Path, filename: &str) -> Result<String, AppError> {
        let path = self.resolve(root, filename)?;
        let meta = fs::metadata(&path)?;
        self.digests
            .get_or_compute(&path, meta.len(), meta.modified()?)
            .map_err(Into::into)
    }
}

struct CachedListing {
    entries: Vec<RawEntry>,
    #[allow(dead_code)]
    fetched_at: Instant,
}

/// Wraps [`SimpleDirBackend`] and caches each root's listing until an
/// explicit invalidation, per spec.md §4.D. Roots are identified by
/// [`RootId`] (index into the configured roots list) rather than `PathBuf`.
pub struct CachingDirBackend {
    inner: SimpleDirBackend,
    root_ids: Vec<(PathBuf, RootId)>,
    cache: DashMap<RootId, RwLock<CachedListing>>,
}

impl CachingDirBackend {
    pub fn new(roots: &[PathBuf]) -> Self {
        let root_ids = roots.iter().cloned().zip(0..).collect();
        Self { inner: SimpleDirBackend::new(), root_ids, cache: DashMap::new() }
    }

    fn root_id(&self, root: &Path) -> Option<RootId> {
        self.root_ids.iter().find(|(p, _)| p == root).map(|(_, id)| *id)
    }
}

impl StorageBackend for CachingDirBackend {
    fn list_artifacts(&self, root: &Path) -> Result<Vec<RawEntry>, AppError> {
        let Some(root_id) = self.root_id(root) else {
            return self.inner.list_artifacts(root);
        };

        if let Some(cached) = self.cache.get(&root_id) {
            let guard = cached.read().unwrap();
            return Ok(guard.entries.clone());
        }

        let entries = self.inner.list_artifacts(root)?;
        self.cache.insert(
            root_id,
            RwLock::new(CachedListing { entries: entries.clone(), fetched_at: Instant::now() }),
        );
        Ok(entries)
    }

    fn open(&self, root: &Path, filename: &str) -> Result<File, AppError> {
        self.inner.open(root, filename)
    }

    fn create(&self, root: &Path, filename: &str, data: &[u8]) -> Result<(), AppError> {
        self.inner.create(root, filename, data)?;
        self.invalidate(root);
        Ok(())
    }

    fn remove(&self, root: &Path, filename: &str) -> Result<(), AppError> {
        self.inner.remove(root, filename)?;
        self.invalidate(root);
        Ok(())
    }

    fn digest(&self, root: &Path, filename: &str) -> Result<String, AppError> {
        self.inner.digest(root, filename)
    }

    fn invalidate(&self, root: &Path) {
        if let Some(root_id) = self.root_id(root) {
            self.cache.remove(&root_id);
        }
    }
}

/// Build the configured backend variant. Unknown names fall back to
/// `cached-dir`, matching the teacher's `create_tokenizer`'s
/// fall-back-to-default-for-unknown-names behavior.
pub fn build_backend(name: &str, roots: &[PathBuf]) -> Arc<dyn StorageBackend> {
    match name {
        "simple-dir" => Arc::new(SimpleDirBackend::new()),
        _ => Arc::new(CachingDirBackend::new(roots)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn simple_dir_roundtrip_create_list_open_remove() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SimpleDirBackend::new();

        backend.create(dir.path(), "test-1.0.tar.gz", b"hello").unwrap();
        let listed = backend.list_artifacts(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "test-1.0.tar.gz");

        let mut f = backend.open(dir.path(), "test-1.0.tar.gz").unwrap();
        let mut buf = String::new();
        f.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello");

        backend.remove(dir.path(), "test-1.0.tar.gz").unwrap();
        assert!(backend.list_artifacts(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn dotfiles_are_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SimpleDirBackend::new();
        backend.create(dir.path(), "visible-1.0.tar.gz", b"x").unwrap();
        std::fs::write(dir.path().join(".hidden-1.0.tar.gz"), b"x").unwrap();

        let listed = backend.list_artifacts(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "visible-1.0.tar.gz");
    }

    #[test]
    fn open_rejects_hidden_and_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SimpleDirBackend::new();
        assert!(matches!(backend.open(dir.path(), ".hidden"), Err(AppError::NotFound(_))));
        assert!(matches!(backend.open(dir.path(), "../escape"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn digest_is_memoized_until_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SimpleDirBackend::new();
        backend.create(dir.path(), "test-1.0.tar.gz", b"hello").unwrap();
        let d1 = backend.digest(dir.path(), "test-1.0.tar.gz").unwrap();
        let d2 = backend.digest(dir.path(), "test-1.0.tar.gz").unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
    }

    #[test]
    fn caching_backend_serves_stale_listing_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let roots = vec![dir.path().to_path_buf()];
        let backend = CachingDirBackend::new(&roots);

        assert!(backend.list_artifacts(dir.path()).unwrap().is_empty());
        // Created behind the cache's back: should not be reflected yet.
        std::fs::write(dir.path().join("sneaky-1.0.tar.gz"), b"x").unwrap();
        assert!(backend.list_artifacts(dir.path()).unwrap().is_empty());

        backend.invalidate(dir.path());
        assert_eq!(backend.list_artifacts(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn caching_backend_create_invalidates_its_own_root() {
        let dir = tempfile::tempdir().unwrap();
        let roots = vec![dir.path().to_path_buf()];
        let backend = CachingDirBackend::new(&roots);

        backend.create(dir.path(), "test-1.0.tar.gz", b"hi").unwrap();
        assert_eq!(backend.list_artifacts(dir.path()).unwrap().len(), 1);
    }
}
