//! Transaction Builder Module
//!
//! Produces the payload of every dummy transaction. The instruction list and
//! the metadata entry never change during a run; only the nonce is redrawn on
//! each call, which keeps consecutive payloads from hashing to the same value
//! inside the node's duplicate-detection window.

use super::nonce::{NonceSource, ThreadRngNonce};
use crate::types::{Executable, Instruction, Level, Metadata, Name, TransactionRequest};
use serde_json::{Value, json};
use std::sync::Arc;

/// Message logged by the node for every produced transaction
pub const LOG_MESSAGE: &str = "Hello, world!";
/// Metadata key attached to every produced transaction
pub const METADATA_KEY: &str = "foo";

/// Builds `TransactionRequest`s with a fixed body and a fresh nonce
#[derive(Clone)]
pub struct TransactionBuilder {
    /// Instructions shared by every transaction of the run
    executable: Executable,
    /// Metadata shared by every transaction of the run
    metadata: Metadata,
    /// Where nonces come from (thread RNG in production, seeded in tests)
    nonces: Arc<dyn NonceSource>,
}

impl TransactionBuilder {
    /// Creates a builder with the default payload and the given nonce source
    pub fn new(nonces: Arc<dyn NonceSource>) -> Self {
        Self {
            executable: default_executable(),
            metadata: default_metadata(),
            nonces,
        }
    }

    /// Replaces the instruction list
    pub fn with_executable(mut self, executable: Executable) -> Self {
        self.executable = executable;
        self
    }

    /// Replaces the metadata map
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds the next transaction
    ///
    /// Only touches shared state through the nonce source, so it can be
    /// called from any number of concurrent submissions.
    pub fn build(&self) -> TransactionRequest {
        TransactionRequest {
            executable: self.executable.clone(),
            nonce: self.nonces.next_nonce(),
            metadata: self.metadata.clone(),
        }
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngNonce::default()))
    }
}

impl std::fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("executable", &self.executable)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn default_executable() -> Executable {
    Executable::Instructions(vec![Instruction::Log {
        level: Level::Info,
        msg: LOG_MESSAGE.to_string(),
    }])
}

/// One entry holding every JSON value kind, to exercise the node's metadata decoding
fn default_metadata() -> Metadata {
    let value: Value = json!(["a", 1, false, null, [], {}]);
    let key = Name::try_from(METADATA_KEY.to_string())
        .unwrap_or_else(|err| unreachable!("constant metadata key is valid: {err}"));
    Metadata::from([(key, value)])
}
