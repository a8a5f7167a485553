//! Transaction Production Module
//!
//! - `LoopDriver`: batch, pause, repeat until shutdown
//! - `BatchExecutor`: bounded fan-out/fan-in of one batch
//! - `OutcomeObserver` / `Stats`: optional view on individual outcomes

mod driver;
mod executor;
mod observer;


pub use driver::{DriverState, LoopDriver, ProducerSettings};
pub use executor::{BatchExecutor, BatchReport};
pub use observer::{NoopObserver, OutcomeObserver, Stats};

use crate::builder::TransactionBuilder;
use crate::client::LedgerClient;
use crate::error::SubmitError;
use crate::types::{SubmitOptions, TxHash};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Returns the production `submit_one`: build a fresh transaction and submit it
///
/// Each call yields an independent future that owns its request end to end.
pub fn submitter<C>(
    client: Arc<C>,
    builder: Arc<TransactionBuilder>,
    options: SubmitOptions,
) -> impl Fn() -> BoxFuture<'static, Result<TxHash, SubmitError>>
where
    C: LedgerClient + ?Sized + 'static,
{
    move || -> BoxFuture<'static, Result<TxHash, SubmitError>> {
        let client = Arc::clone(&client);
        let builder = Arc::clone(&builder);
        Box::pin(async move { client.submit(builder.build(), options).await })
    }
}
