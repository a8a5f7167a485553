//! Synthetic load generator for a ledger node.
//!
//! Continuously builds small, harmless transactions and submits them to a
//! node's Torii endpoint in concurrent batches separated by a fixed pause.
//! Submissions are fire-and-forget: failures are counted, never retried.

pub mod types; // Transaction payload, instructions, metadata and outcomes.
pub mod error; // Error enums for startup and per-submission failures.
pub mod config; // Environment / TOML configuration, read once at startup.
pub mod crypto; // Account ids, multihash keys and ed25519 signing.
pub mod builder; // Fixed-payload transaction builder with a pluggable nonce source.
pub mod client; // Ledger client seam and the Torii HTTP implementation.
pub mod producer; // Loop driver and batch executor.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use builder::TransactionBuilder;
pub use client::{LedgerClient, ToriiClient};
pub use producer::{BatchExecutor, LoopDriver};
