//! AEAD encryption for shard parts.
//!
//! AES-256-GCM under a per-shard pepper. The output token is self-contained
//! (nonce prepended to the ciphertext), so each stored part can be decrypted
//! independently of the other.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use super::keys::{generate_nonce, Pepper, NONCE_LEN};
use crate::error::{Result, VaultError};

/// GCM authentication tag length
const TAG_LEN: usize = 16;

/// Encrypted token with nonce prepended
pub struct CipherToken {
    /// Nonce (12 bytes)
    pub nonce: Vec<u8>,
    /// Ciphertext with authentication tag
    pub ciphertext: Vec<u8>,
}

impl CipherToken {
    /// Serialize to bytes (nonce || ciphertext)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.nonce.len() + self.ciphertext.len());
        result.extend_from_slice(&self.nonce);
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Decryption("token too short".into()));
        }

        Ok(Self {
            nonce: data[..NONCE_LEN].to_vec(),
            ciphertext: data[NONCE_LEN..].to_vec(),
        })
    }
}

/// Encrypt a payload under a shard pepper, returning the token bytes
pub fn encrypt(pepper: &Pepper, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(pepper.expose())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let nonce_bytes = generate_nonce();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let token = CipherToken {
        nonce: nonce_bytes.to_vec(),
        ciphertext,
    };
    Ok(token.to_bytes())
}

/// Decrypt a token under a shard pepper.
///
/// Fails with a `Decryption` error on tampered or truncated tokens and on
/// key mismatch. The returned buffer zeroizes itself on drop.
pub fn decrypt(pepper: &Pepper, token_bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(pepper.expose())
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let token = CipherToken::from_bytes(token_bytes)?;
    let nonce = Nonce::from_slice(&token.nonce);

    let plaintext = cipher
        .decrypt(nonce, token.ciphertext.as_slice())
        .map_err(|_| VaultError::Decryption("authentication failed".into()))?;

    Ok(Zeroizing::new(plaintext))
}
