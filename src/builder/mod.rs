//! Payload Construction Module
//!
//! - `TransactionBuilder`: fixed instructions and metadata plus a fresh nonce
//! - `NonceSource`: pluggable, seedable nonce draw

mod nonce;
mod transaction;


pub use nonce::{DEFAULT_NONCE_RANGE, NonceSource, SeededNonce, ThreadRngNonce};
pub use transaction::{LOG_MESSAGE, METADATA_KEY, TransactionBuilder};
