//! Content checksums for rendered files.
//!
//! Used by `--check` to compare a rendered config against the file already on
//! disk without printing either.

use sha2::{Digest, Sha256};

use crate::constants::CHECKSUM_PREFIX;

/// SHA-256 of `content`, formatted as `sha256:<hex>`.
///
/// ```
/// use containerd_templates::templating::checksum;
///
/// assert_eq!(
///     checksum(""),
///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{CHECKSUM_PREFIX}{}", hex::encode(hasher.finalize()))
}
