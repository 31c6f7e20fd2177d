use std::future::Future;

use async_trait::async_trait;
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use crate::{
    account::{Account, AccountRef},
    error::{LedgerError, LedgerResult},
    record::{HistoryFilter, TransactionRecord},
};

pub mod bank_processor;
pub mod transfer;

/// The operations the banking core offers to whatever sits in front of it.
#[async_trait]
pub trait TransactionProcessor: Send + Sync {
    async fn deposit(&self, account: AccountRef, amount: Decimal) -> LedgerResult<Account>;

    async fn withdraw(&self, account: AccountRef, amount: Decimal) -> LedgerResult<Account>;

    async fn transfer(
        &self,
        origin: AccountRef,
        destination: AccountRef,
        amount: Decimal,
    ) -> LedgerResult<TransactionRecord>;

    /// Newest first, read lazily. Polling the stream again after it ended
    /// requires a new call.
    fn history(&self, filter: HistoryFilter)
    -> BoxStream<'static, LedgerResult<TransactionRecord>>;
}

/// Runs `operation` on its own task so that dropping the caller's future
/// does not abandon it halfway.
pub(crate) async fn run_to_completion<T, F>(operation: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(operation)
        .await
        .unwrap_or_else(|err| Err(LedgerError::Interrupted(err.to_string())))
}
