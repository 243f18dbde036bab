//! API key generation and hashing.

use sha2::{Digest, Sha256};

/// Prefix for production connector keys. Identifies keys in logs
/// without exposing the secret part.
pub const API_KEY_PREFIX: &str = "dukaan_sk_live_";

/// Length of the random hex portion of the key.
pub const API_KEY_HEX_LENGTH: usize = 32;

/// Generates a new API key: the prefix plus 32 hex characters from the
/// operating system's CSPRNG. Shown to the operator once; only the
/// hash is stored.
#[must_use]
pub fn generate_api_key() -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;
    let mut random_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut random_bytes);
    format!("{API_KEY_PREFIX}{}", hex::encode(random_bytes))
}

/// SHA-256 hash of a key as a hex string; this is what the `stores`
/// table holds.
#[must_use]
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
