use sha2::{Digest, Sha256};

/// Stable digest of everything that makes two requests "the same call":
/// caller identity (api key or client address), HTTP method, path, and the
/// serialized body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Each field is length-prefixed so the digest stays unambiguous across
/// field boundaries.
pub fn fingerprint(identity: &str, method: &str, path: &str, body: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    for field in [identity.as_bytes(), method.as_bytes(), path.as_bytes(), body] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    Fingerprint(hex::encode(hasher.finalize()))
}
