//! Key Management Module
//!
//! Parses the multihash-encoded account identifiers and private keys used by
//! the node and signs transaction payloads with ed25519.

mod keys;

pub use keys::{AccountId, PrivateKey};
