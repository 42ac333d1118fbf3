//! Content digests for extracted binaries.
//!
//! Two builds of the same sources with the same options are expected to
//! produce byte-identical binaries; the digest makes that checkable from the
//! build summary without keeping both files around.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type ArtifactDigest = [u8; 32];

/// SHA-256 of a binary.
pub fn artifact_digest(bytes: &[u8]) -> ArtifactDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Format a digest as a lowercase hex string.
pub fn digest_hex(digest: &ArtifactDigest) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
