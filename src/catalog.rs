//! Project/Catalog views derived from a [`StorageBackend`], plus the
//! multi-root upload/removal semantics that span backends (spec.md §3, §4.C,
//! §4.D).
//!
//! Grounded on `RepoState`/the `DashMap<String, CachedStub>` shape in the
//! teacher's `server/src/types.rs`: one shared handle wrapping an `Arc<dyn
//! Trait>`, cloned cheaply into every handler via axum's `State<T>`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::AppError;
use crate::filename::{parse_filename, ArtifactKind};
use crate::normalize::canonical;
use crate::storage::{build_backend, RawEntry, StorageBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub root: PathBuf,
    pub size: u64,
    pub mtime: SystemTime,
    pub project_raw: String,
    pub version: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn canonical_project(&self) -> String {
        canonical(&self.project_raw)
    }

    fn from_raw(root: &PathBuf, entry: RawEntry) -> Option<Self> {
        let parsed = parse_filename(&entry.filename).ok()?;
        Some(Self {
            filename: entry.filename,
            root: root.clone(),
            size: entry.size,
            mtime: entry.mtime,
            project_raw: parsed.project_raw,
            version: parsed.version,
            kind: parsed.kind,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub canonical_name: String,
    pub artifacts: Vec<Artifact>,
}

impl Project {
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> =
            self.artifacts.iter().map(|a| a.version.clone()).collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

/// A point-in-time view over every configured root. A pure function of
/// filesystem state at the moment it was built (spec.md §3).
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    artifacts: Vec<Artifact>,
}

impl Catalog {
    /// Distinct canonical project names, ascending.
    pub fn project_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.artifacts.iter().map(Artifact::canonical_project).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn project(&self, canonical_name: &str) -> Option<Project> {
        let artifacts: Vec<Artifact> = self
            .artifacts
            .iter()
            .filter(|a| a.canonical_project() == canonical_name)
            .cloned()
            .collect();
        if artifacts.is_empty() {
            return None;
        }
        Some(Project { canonical_name: canonical_name.to_string(), artifacts })
    }

    /// Every visible artifact across every root, for the flat `/packages/`
    /// listing.
    pub fn all_artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn project_count(&self) -> usize {
        self.project_names().len()
    }
}

/// Owns the configured roots and the storage backend; the single shared
/// handle every handler reaches through `State<Arc<Catalog Handle>>` (mirrors
/// the teacher's `Arc<ServerState>` construction in `server/src/main.rs`).
pub struct CatalogHandle {
    backend: Arc<dyn StorageBackend>,
    roots: Vec<PathBuf>,
}

impl CatalogHandle {
    pub fn new(roots: Vec<PathBuf>, backend_name: &str) -> Self {
        let backend = build_backend(backend_name, &roots);
        Self { backend, roots }
    }

    /// Build a fresh `Catalog` snapshot from the current backend state
    /// across all roots.
    pub fn snapshot(&self) -> Result<Catalog, AppError> {
        let mut artifacts = Vec::new();
        for root in &self.roots {
            for raw in self.backend.list_artifacts(root)? {
                if let Some(artifact) = Artifact::from_raw(root, raw) {
                    artifacts.push(artifact);
                }
            }
        }
        Ok(Catalog { artifacts })
    }

    pub fn open_artifact(&self, filename: &str) -> Result<(PathBuf, std::fs::File), AppError> {
        for root in &self.roots {
            match self.backend.open(root, filename) {
                Ok(file) => return Ok((root.clone(), file)),
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AppError::NotFound(filename.to_string()))
    }

    pub fn digest(&self, root: &PathBuf, filename: &str) -> Result<String, AppError> {
        self.backend.digest(root, filename)
    }

    /// Upload a fresh artifact. Rejects a basename collision against *any*
    /// configured root (spec.md §3), and writes into the first configured
    /// root (spec.md §6: "first wins for ambiguous writes").
    pub fn upload(&self, filename: &str, data: &[u8]) -> Result<(), AppError> {
        parse_filename(filename)?;

        for root in &self.roots {
            if self.backend.list_artifacts(root)?.iter().any(|e| e.filename == filename) {
                return Err(AppError::Conflict(filename.to_string()));
            }
        }

        let Some(target) = self.roots.first() else {
            return Err(AppError::ConfigError("no roots configured".to_string()));
        };
        self.backend.create(target, filename, data)
    }

    /// Remove every artifact whose parsed (canonical project, version)
    /// matches, across all roots. Returns the count removed.
    pub fn remove(&self, name: &str, version: &str) -> Result<usize, AppError> {
        let canonical_name = canonical(name);
        let mut removed = 0;
        for root in &self.roots {
            for entry in self.backend.list_artifacts(root)? {
                let Ok(parsed) = parse_filename(&entry.filename) else { continue };
                if canonical(&parsed.project_raw) == canonical_name && parsed.version == version {
                    self.backend.remove(root, &entry.filename)?;
                    removed += 1;
                }
            }
        }
        if removed == 0 {
            return Err(AppError::NotFound(format!("{name} ({version}) not found")));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with(files: &[&str]) -> (tempfile::TempDir, CatalogHandle) {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            std::fs::write(dir.path().join(f), b"x").unwrap();
        }
        let handle = CatalogHandle::new(vec![dir.path().to_path_buf()], "simple-dir");
        (dir, handle)
    }

    #[test]
    fn snapshot_groups_by_canonical_project() {
        let (_dir, handle) = handle_with(&["FooBar-1.0.zip", "FooBar-1.1.zip", "other-2.0.tar.gz"]);
        let catalog = handle.snapshot().unwrap();
        assert_eq!(catalog.project_names(), vec!["foobar", "other"]);
        let project = catalog.project("foobar").unwrap();
        assert_eq!(project.artifacts.len(), 2);
    }

    #[test]
    fn invisible_files_never_appear() {
        let (_dir, handle) = handle_with(&[".hidden-1.0.tar.gz", "visible-1.0.tar.gz"]);
        let catalog = handle.snapshot().unwrap();
        assert_eq!(catalog.project_names(), vec!["visible"]);
    }

    #[test]
    fn upload_rejects_basename_collision() {
        let (_dir, handle) = handle_with(&["test-1.0.tar.gz"]);
        let err = handle.upload("test-1.0.tar.gz", b"data").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn upload_then_snapshot_reflects_new_artifact() {
        let (_dir, handle) = handle_with(&[]);
        handle.upload("test-1.0.tar.gz", b"data").unwrap();
        let catalog = handle.snapshot().unwrap();
        assert_eq!(catalog.project_names(), vec!["test"]);
    }

    #[test]
    fn remove_deletes_matching_version_across_kinds() {
        let (_dir, handle) =
            handle_with(&["foo_bar-1.0.tar.gz", "foo_bar-1.0-py2.py3-none-any.whl", "foo_bar-2.0.tar.gz"]);
        let removed = handle.remove("foo-bar", "1.0").unwrap();
        assert_eq!(removed, 2);
        let catalog = handle.snapshot().unwrap();
        let project = catalog.project("foo-bar").unwrap();
        assert_eq!(project.artifacts.len(), 1);
        assert_eq!(project.artifacts[0].version, "2.0");
    }

    #[test]
    fn remove_not_found_is_an_error() {
        let (_dir, handle) = handle_with(&[]);
        let err = handle.remove("nope", "1.0").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
