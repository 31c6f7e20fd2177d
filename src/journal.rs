use std::sync::Arc;

use futures::{
    StreamExt, TryStreamExt, future,
    stream::{self, BoxStream},
};
use tracing::debug;

use crate::{
    clock::Clock,
    error::{LedgerError, LedgerResult},
    record::{NewRecord, RecordQuery, TransactionId, TransactionRecord},
    store::{StoreError, TransactionStore},
};

/// Append-only journal of completed movements.
#[derive(Clone)]
pub struct TransactionJournal {
    store: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl TransactionJournal {
    pub fn new(store: Arc<dyn TransactionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Checks the record shape, stamps it and hands it to the store.
    pub async fn append(&self, record: NewRecord) -> LedgerResult<TransactionRecord> {
        record.validate()?;
        let record = record.into_record(TransactionId::generate(), self.clock.now());
        debug!(id = %record.id, kind = %record.kind, amount = %record.amount, "appending record");
        Ok(self.store.append(record).await?)
    }

    /// Newest first. Nothing is read until the stream is polled, and every
    /// call reads the store afresh.
    pub fn history(
        &self,
        query: RecordQuery,
    ) -> BoxStream<'static, LedgerResult<TransactionRecord>> {
        let store = Arc::clone(&self.store);
        let account = query.account.clone();
        stream::once(async move { store.find(account.as_ref()).await })
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, StoreError>)))
            .try_flatten()
            .map_err(LedgerError::from)
            .try_filter(move |record| future::ready(query.matches(record)))
            .boxed()
    }
}
