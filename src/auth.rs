use hex::encode;
use sha2::{Digest, Sha256};

/// Decides whether a presented credential may perform write operations.
pub trait AuthPolicy: Send + Sync {
    fn verify(&self, credential: Option<&str>) -> bool;
}

/// Shared-secret policy. Only the SHA-256 digest of the secret is kept, and
/// digests are compared in constant time.
pub struct StaticTokenPolicy {
    digest: [u8; 32],
}

impl StaticTokenPolicy {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: digest(secret),
        }
    }

    /// Short hex prefix of the secret's digest, safe to log.
    pub fn fingerprint(&self) -> String {
        encode(self.digest)[0..12].to_string()
    }
}

impl AuthPolicy for StaticTokenPolicy {
    fn verify(&self, credential: Option<&str>) -> bool {
        match credential {
            Some(candidate) => constant_time_eq(&digest(candidate), &self.digest),
            None => false,
        }
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
