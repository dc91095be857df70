use sha2::{Digest, Sha256};

/// SHA-256 over `version.to_be_bytes() || 0x00 || canonical_bytes`, hex-encoded.
///
/// Mirrors the versioned-hash convention used elsewhere in this lineage
/// (canonical-form hashing): embedding the config version in the digest means
/// a future change to folding/collapsing rules can never silently collide
/// with an older hash for the same visible text.
pub fn hash_canonical_bytes(version: u32, canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.to_be_bytes());
    hasher.update([0u8]);
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
