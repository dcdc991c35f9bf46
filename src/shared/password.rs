use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Hex digest of the password. Deterministic on purpose: offline sign-in and
/// the pending-password-change flow compare stored digests for equality, and
/// the digest doubles as the credential sent to the remote auth provider so
/// the plaintext never leaves the process.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}
