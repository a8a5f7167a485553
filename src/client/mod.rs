//! Ledger Client Module
//!
//! The producer only needs one operation from the ledger: submit a payload.
//! `LedgerClient` is that seam; `ToriiClient` signs and posts transactions to
//! a node's Torii HTTP endpoint.

mod torii;

pub use torii::{ClientConfig, SignedTransaction, ToriiClient, TransactionPayload};

use crate::error::SubmitError;
use crate::types::{SubmitOptions, TransactionRequest, TxHash};
use async_trait::async_trait;

/// Anything that can deliver a transaction to the ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Signs and submits `request`
    ///
    /// With `options.verify == false` this returns as soon as the node has
    /// accepted the transaction for processing.
    async fn submit(
        &self,
        request: TransactionRequest,
        options: SubmitOptions,
    ) -> Result<TxHash, SubmitError>;
}
