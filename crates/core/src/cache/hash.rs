//! Cache key generation for stored entries.

use sha2::{Digest, Sha256};
use url::Url;

/// Normalize a request URL for cache matching.
///
/// The fragment never reaches the server, so it is dropped. Query strings
/// are kept verbatim.
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// Compute the cache key for a request URL.
pub fn compute_entry_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_url(url).as_str().as_bytes());
    hex::encode(hasher.finalize())
}
