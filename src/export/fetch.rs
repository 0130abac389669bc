//! Region Fetcher
//!
//! Resolves a region's clip to an object key and pulls its encoded bytes.
//! The URL's scheme and host carry no storage meaning: clips always live in
//! the configured regions bucket, keyed by the URL path.

use url::Url;

use crate::error::{DubError, Result};
use crate::export::region::Region;
use crate::storage::ObjectStore;

/// Extract the object key from a region URL
///
/// Absolute URLs use their path; relative references are resolved as paths.
/// Leading separators are stripped. The path stays percent-encoded.
pub fn object_key_from_url(raw: &str) -> std::result::Result<String, url::ParseError> {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost/")?.join(raw)?
        }
        Err(e) => return Err(e),
    };

    Ok(parsed.path().trim_start_matches('/').to_string())
}

/// Pulls region clips from the regions bucket
pub struct RegionFetcher<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
}

impl<'a> RegionFetcher<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Bucket clips are fetched from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for a region's clip
    pub fn object_key(&self, region: &Region) -> Result<String> {
        object_key_from_url(&region.url).map_err(|e| {
            DubError::transfer(
                &self.bucket,
                &region.url,
                "region url cannot be resolved to an object key",
                Some(Box::new(e)),
            )
        })
    }

    /// Fetch a region's encoded clip
    ///
    /// # Errors
    /// * `NotFound` - the clip is absent from the regions bucket
    /// * `Transfer` - the clip could not be read
    pub fn fetch(&self, region: &Region) -> Result<Vec<u8>> {
        let key = self.object_key(region)?;
        self.store.get(&self.bucket, &key)
    }
}
