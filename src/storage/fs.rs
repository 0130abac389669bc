//! Directory-backed object store
//!
//! Objects live at `<root>/<bucket>/<key>`. Keys are relative paths; any key
//! that would escape its bucket directory is rejected.
//!
//! Writes are staged in a temporary file next to the target and renamed into
//! place, so a key only ever holds a complete object.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{ObjectStore, Visibility};
use crate::error::{DubError, Result};

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a bucket/key pair to a file path
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let escapes = |p: &Path| {
            p.components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        };

        if bucket.is_empty()
            || key.is_empty()
            || escapes(Path::new(bucket))
            || escapes(Path::new(key))
        {
            return Err(DubError::transfer(
                bucket,
                key,
                "object path escapes the store root",
                None,
            ));
        }

        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FsStore {
    fn exists(&self, bucket: &str, key: &str) -> bool {
        let path = match self.object_path(bucket, key) {
            Ok(path) => path,
            Err(e) => {
                warn!("Existence check failed for {}/{}: {}", bucket, key, e);
                return false;
            }
        };

        match fs::metadata(&path) {
            Ok(metadata) => metadata.is_file(),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Existence check failed for {}: {}", path.display(), e);
                } else {
                    debug!("No object at {}", path.display());
                }
                false
            }
        }
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;

        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DubError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            } else {
                DubError::transfer(bucket, key, e.to_string(), Some(Box::new(e)))
            }
        })
    }

    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, visibility: Visibility) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        let failed =
            |e: std::io::Error| DubError::transfer(bucket, key, e.to_string(), Some(Box::new(e)));

        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(failed)?;

        let mut staged = NamedTempFile::new_in(parent).map_err(failed)?;
        staged.write_all(&bytes).map_err(failed)?;
        staged.as_file().sync_all().map_err(failed)?;
        staged.persist(&path).map_err(|e| failed(e.error))?;

        debug!(
            "Stored {} bytes at {} ({})",
            bytes.len(),
            path.display(),
            visibility
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_put_creates_nested_keys() {
        let (_dir, store) = create_store();
        store
            .put("exports", "p1/dub.wav", b"RIFF".to_vec(), Visibility::PublicRead)
            .unwrap();

        assert!(store.root().join("exports/p1/dub.wav").is_file());
        assert!(store.exists("exports", "p1/dub.wav"));
        assert_eq!(store.get("exports", "p1/dub.wav").unwrap(), b"RIFF".to_vec());
    }

    #[test]
    fn test_put_overwrites_without_leftovers() {
        let (_dir, store) = create_store();
        store
            .put("exports", "p1/dub.wav", b"first".to_vec(), Visibility::PublicRead)
            .unwrap();
        store
            .put("exports", "p1/dub.wav", b"second".to_vec(), Visibility::PublicRead)
            .unwrap();

        assert_eq!(store.get("exports", "p1/dub.wav").unwrap(), b"second".to_vec());
        let entries: Vec<_> = fs::read_dir(store.root().join("exports/p1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["dub.wav"]);
    }

    #[test]
    fn test_failed_put_leaves_no_object() {
        let (_dir, store) = create_store();
        // A non-empty directory at the key makes the final rename fail
        let blocked = store.root().join("exports/p1/dub.wav");
        fs::create_dir_all(blocked.join("inner")).unwrap();

        let err = store
            .put("exports", "p1/dub.wav", b"RIFF".to_vec(), Visibility::PublicRead)
            .unwrap_err();

        assert!(matches!(err, DubError::Transfer { .. }));
        assert!(!store.exists("exports", "p1/dub.wav"));
        let entries: Vec<_> = fs::read_dir(store.root().join("exports/p1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["dub.wav"]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = create_store();
        let err = store.get("exports", "missing.wav").unwrap_err();
        assert!(matches!(err, DubError::NotFound { .. }));
        assert!(!store.exists("exports", "missing.wav"));
    }

    #[test]
    fn test_directory_is_not_an_object() {
        let (_dir, store) = create_store();
        store
            .put("exports", "p1/dub.wav", vec![0], Visibility::Private)
            .unwrap();
        assert!(!store.exists("exports", "p1"));
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let (_dir, store) = create_store();

        let err = store
            .put("exports", "../outside.wav", vec![0], Visibility::Private)
            .unwrap_err();
        assert!(matches!(err, DubError::Transfer { .. }));
        assert!(store.object_path("exports", "/etc/passwd").is_err());
        assert!(store.object_path("..", "a.wav").is_err());
        assert!(!store.exists("exports", "../outside.wav"));
    }
}
