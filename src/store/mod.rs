use async_trait::async_trait;
use thiserror::Error;

use crate::{
    account::{Account, AccountId, AccountNumber},
    record::TransactionRecord,
};

pub mod faulty;
pub mod in_memory;

/// Failures reported by the persistence collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Account number `{0}` is already taken")]
    DuplicateNumber(AccountNumber),
    #[error("Account {0} was never inserted")]
    UnknownAccount(AccountId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of accounts. A successful return means the write landed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: &AccountId) -> StoreResult<Option<Account>>;

    async fn find_by_number(&self, number: &AccountNumber) -> StoreResult<Option<Account>>;

    async fn find_by_owner(&self, owner: &str) -> StoreResult<Vec<Account>>;

    /// Stores a new account, refusing a number that is already in use.
    async fn insert(&self, account: Account) -> StoreResult<Account>;

    /// Overwrites an existing account.
    async fn save(&self, account: Account) -> StoreResult<Account>;
}

/// Append-only log of transaction records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn append(&self, record: TransactionRecord) -> StoreResult<TransactionRecord>;

    /// Records where `account` is origin or destination (all records when
    /// `None`), newest first.
    async fn find(&self, account: Option<&AccountNumber>) -> StoreResult<Vec<TransactionRecord>>;
}
