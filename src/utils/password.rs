use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Lowest cost bcrypt accepts. Used for tests and benches.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// Random bytes per bearer token (128 bits).
const TOKEN_BYTES: usize = 16;

/// Hash a secret (password or bearer token) with bcrypt at the given cost.
pub fn digest(secret: &str, cost: u32) -> Result<String> {
    bcrypt::hash(secret, cost).context("Failed to hash secret")
}

/// Verify a secret against a stored bcrypt digest.
///
/// bcrypt compares the recomputed hash in constant time.
pub fn verify_digest(secret: &str, digest: &str) -> Result<bool> {
    bcrypt::verify(secret, digest).context("Failed to verify digest")
}

/// Generate a URL-safe random bearer token.
pub fn new_token() -> Result<String> {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to read random bytes: {e}"))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}
