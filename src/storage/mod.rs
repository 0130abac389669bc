//! Object Storage Gateway
//!
//! The export pipeline talks to object storage through the narrow
//! `ObjectStore` capability: existence check, full-object get, buffered put.
//! Two gateways ship with the crate:
//! - `MemoryStore`: in-process store used by tests and embedding callers
//! - `FsStore`: directory-backed store used by the CLI

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use std::fmt;

use crate::error::Result;

/// Access level applied to an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Readable only with credentials
    #[default]
    Private,
    /// Readable by anyone holding the object URL
    PublicRead,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::PublicRead => write!(f, "public-read"),
        }
    }
}

/// Storage capability consumed by the export pipeline
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists.
    ///
    /// Never fails: any lookup or access failure is reported as `false`.
    fn exists(&self, bucket: &str, key: &str) -> bool;

    /// Fetch an object fully into memory
    ///
    /// # Errors
    /// * `NotFound` - the object does not exist
    /// * `Transfer` - the object could not be read
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Upload a fully buffered object, replacing any existing one
    ///
    /// # Errors
    /// * `Transfer` - the object could not be written
    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, visibility: Visibility) -> Result<()>;
}
