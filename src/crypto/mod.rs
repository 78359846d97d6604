//! Cryptographic core.
//!
//! Per-shard AES-256-GCM under independent peppers.

pub mod aead;
pub mod keys;

pub use aead::*;
pub use keys::*;
