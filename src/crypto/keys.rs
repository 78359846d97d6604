//! Shard key material.
//!
//! Each shard has its own pepper - a server-side 256-bit key that encrypts
//! that shard's half of the ciphertext. The two peppers are supplied
//! independently and are never derivable from one another, so compromising
//! one store alone recovers nothing.

use secrecy::{ExposeSecret, Secret};
use zeroize::Zeroize;

use crate::error::{Result, VaultError};

/// Key length for AES-256
pub const KEY_LEN: usize = 32;

/// Nonce length for AES-GCM
pub const NONCE_LEN: usize = 12;

/// Shard pepper - a secret key with automatic zeroization
#[derive(Clone)]
pub struct Pepper {
    inner: Secret<[u8; KEY_LEN]>,
}

impl Pepper {
    /// Create a pepper from raw bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            inner: Secret::new(bytes),
        }
    }

    /// Parse a pepper from its 64-character hex form.
    ///
    /// This is the format peppers are deployed in; anything else is a fatal
    /// configuration error.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        if hex_key.len() != KEY_LEN * 2 {
            return Err(VaultError::Configuration(format!(
                "pepper must be {} hex chars, got {}",
                KEY_LEN * 2,
                hex_key.len()
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(hex_key, &mut bytes)
            .map_err(|e| VaultError::Configuration(format!("pepper is not valid hex: {}", e)))?;

        let pepper = Self::new(bytes);
        bytes.zeroize();
        Ok(pepper)
    }

    /// Expose the key bytes (use with caution)
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.inner.expose_secret()
    }

    /// Generate a random pepper
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }
}

/// Generate a random nonce for AES-GCM
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    use rand::RngCore;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}
