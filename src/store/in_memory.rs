use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    account::{Account, AccountId, AccountNumber},
    record::TransactionRecord,
};

use super::{AccountStore, StoreError, StoreResult, TransactionStore};

#[derive(Default)]
struct AccountTable {
    by_id: HashMap<AccountId, Account>,
    by_number: HashMap<AccountNumber, AccountId>,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    table: RwLock<AccountTable>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: &AccountId) -> StoreResult<Option<Account>> {
        let table = self.table.read().await;
        Ok(table.by_id.get(id).cloned())
    }

    async fn find_by_number(&self, number: &AccountNumber) -> StoreResult<Option<Account>> {
        let table = self.table.read().await;
        Ok(table
            .by_number
            .get(number)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Vec<Account>> {
        let table = self.table.read().await;
        let mut accounts: Vec<Account> = table
            .by_id
            .values()
            .filter(|account| account.owner() == owner)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.number().cmp(b.number()));
        Ok(accounts)
    }

    async fn insert(&self, account: Account) -> StoreResult<Account> {
        let mut table = self.table.write().await;
        if table.by_number.contains_key(account.number()) {
            return Err(StoreError::DuplicateNumber(account.number().clone()));
        }
        table.by_number.insert(account.number().clone(), account.id());
        table.by_id.insert(account.id(), account.clone());
        Ok(account)
    }

    async fn save(&self, account: Account) -> StoreResult<Account> {
        let mut table = self.table.write().await;
        let Some(stored) = table.by_id.get_mut(&account.id()) else {
            return Err(StoreError::UnknownAccount(account.id()));
        };
        *stored = account.clone();
        Ok(account)
    }
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<Vec<TransactionRecord>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, record: TransactionRecord) -> StoreResult<TransactionRecord> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(record)
    }

    async fn find(&self, account: Option<&AccountNumber>) -> StoreResult<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        // reversed first so that equal timestamps keep the latest append on top
        let mut found: Vec<TransactionRecord> = records
            .iter()
            .rev()
            .filter(|record| account.is_none_or(|account| record.involves(account)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(found)
    }
}
