//! Store wrappers that fail or stall on demand.
//!
//! They sit in front of a real store and are used to exercise the paths
//! where a collaborator gives out halfway through an operation.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    account::{Account, AccountId, AccountNumber},
    record::TransactionRecord,
};

use super::{AccountStore, StoreError, StoreResult, TransactionStore};

pub struct FaultyAccountStore {
    inner: Arc<dyn AccountStore>,
    failing_saves: Mutex<HashSet<AccountId>>,
    save_delay: Mutex<Option<Duration>>,
}

impl FaultyAccountStore {
    pub fn new(inner: Arc<dyn AccountStore>) -> Self {
        Self {
            inner,
            failing_saves: Mutex::new(HashSet::new()),
            save_delay: Mutex::new(None),
        }
    }

    /// Every following save of `id` fails with [`StoreError::Unavailable`].
    pub fn fail_saves_for(&self, id: AccountId) {
        self.failing_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// Every following save sleeps for `delay` before reaching the store.
    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    pub fn heal(&self) {
        self.failing_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.save_delay.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl AccountStore for FaultyAccountStore {
    async fn find_by_id(&self, id: &AccountId) -> StoreResult<Option<Account>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_number(&self, number: &AccountNumber) -> StoreResult<Option<Account>> {
        self.inner.find_by_number(number).await
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Vec<Account>> {
        self.inner.find_by_owner(owner).await
    }

    async fn insert(&self, account: Account) -> StoreResult<Account> {
        self.inner.insert(account).await
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        let delay = *self.save_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failing_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&account.id());
        if failing {
            return Err(StoreError::Unavailable(format!(
                "save of {} refused",
                account.number()
            )));
        }
        self.inner.save(account).await
    }
}

pub struct FaultyTransactionStore {
    inner: Arc<dyn TransactionStore>,
    failing_appends: AtomicBool,
}

impl FaultyTransactionStore {
    pub fn new(inner: Arc<dyn TransactionStore>) -> Self {
        Self {
            inner,
            failing_appends: AtomicBool::new(false),
        }
    }

    pub fn fail_appends(&self, failing: bool) {
        self.failing_appends.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionStore for FaultyTransactionStore {
    async fn append(&self, record: TransactionRecord) -> StoreResult<TransactionRecord> {
        if self.failing_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "append of {} record refused",
                record.kind
            )));
        }
        self.inner.append(record).await
    }

    async fn find(&self, account: Option<&AccountNumber>) -> StoreResult<Vec<TransactionRecord>> {
        self.inner.find(account).await
    }
}
