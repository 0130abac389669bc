//! In-memory object store

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{ObjectStore, Visibility};
use crate::error::{DubError, Result};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    visibility: Visibility,
}

/// Thread-safe in-memory object store
///
/// Counts `get` and `put` calls so callers can verify how much storage I/O
/// a job performed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as an upload
    pub fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                visibility: Visibility::Private,
            },
        );
    }

    /// Read an object without counting it as a fetch
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.bytes.clone())
    }

    /// Visibility the object was stored with
    pub fn visibility(&self, bucket: &str, key: &str) -> Option<Visibility> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.visibility)
    }

    /// Number of `get` calls served so far, including misses
    pub fn get_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `put` calls served so far
    pub fn put_count(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn exists(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .read()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.object(bucket, key).ok_or_else(|| DubError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, visibility: Visibility) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject { bytes, visibility },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("clips", "a.wav").unwrap_err();
        assert!(matches!(err, DubError::NotFound { .. }));
        assert_eq!(store.get_count(), 1);
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new();
        store
            .put("exports", "p1/out.wav", vec![1, 2, 3], Visibility::PublicRead)
            .unwrap();

        assert!(store.exists("exports", "p1/out.wav"));
        assert!(!store.exists("other", "p1/out.wav"));
        assert_eq!(store.get("exports", "p1/out.wav").unwrap(), vec![1, 2, 3]);
        assert_eq!(
            store.visibility("exports", "p1/out.wav"),
            Some(Visibility::PublicRead)
        );
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.get_count(), 1);
    }

    #[test]
    fn test_insert_is_not_counted() {
        let store = MemoryStore::new();
        store.insert("clips", "a.wav", vec![0]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.put_count(), 0);
        assert_eq!(store.object("clips", "a.wav"), Some(vec![0]));
        assert_eq!(store.get_count(), 0);
    }
}
