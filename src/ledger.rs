use std::{collections::HashMap, sync::Arc};

use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::{
    account::{Account, AccountId, AccountRef},
    clock::Clock,
    command::{BalanceAction, BalanceCommand, OpenAccountCommand},
    error::{LedgerError, LedgerResult},
    numbering::AccountNumberGenerator,
    policy::AccountType,
    store::{AccountStore, StoreError},
};

/// How many fresh numbers `create` draws before giving up on collisions.
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// One async mutex per account id. Read-check-write on an account happens
/// under its mutex, so two movements on the same account never interleave.
#[derive(Default)]
struct AccountLocks {
    /// Never pruned: holds at most one slot per account ever moved.
    slots: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    async fn acquire(&self, id: AccountId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(id).or_default())
        };
        slot.lock_owned().await
    }
}

/// Owns account balances: opens accounts and applies deposits and
/// withdrawals under the balance policy, persisting each mutation.
#[derive(Clone)]
pub struct AccountLedger {
    store: Arc<dyn AccountStore>,
    numbers: Arc<dyn AccountNumberGenerator>,
    clock: Arc<dyn Clock>,
    locks: Arc<AccountLocks>,
}

impl AccountLedger {
    pub fn new(
        store: Arc<dyn AccountStore>,
        numbers: Arc<dyn AccountNumberGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            numbers,
            clock,
            locks: Arc::default(),
        }
    }

    pub async fn create(
        &self,
        owner: &str,
        kind: AccountType,
        initial_deposit: Decimal,
    ) -> LedgerResult<Account> {
        self.open(OpenAccountCommand::new(owner, kind, initial_deposit)?)
            .await
    }

    pub async fn open(&self, command: OpenAccountCommand) -> LedgerResult<Account> {
        let mut attempt = 1;
        loop {
            let number = self
                .numbers
                .next_number()
                .ok_or(LedgerError::NumbersExhausted)?;
            let account = Account::open(AccountId::generate(), number, &command, self.clock.now());
            match self.store.insert(account).await {
                Ok(account) => {
                    info!(
                        account = %account.number(),
                        owner = account.owner(),
                        kind = %account.kind(),
                        balance = %account.balance(),
                        "account opened"
                    );
                    return Ok(account);
                }
                Err(StoreError::DuplicateNumber(number)) if attempt < MAX_NUMBER_ATTEMPTS => {
                    warn!(%number, attempt, "account number already taken, drawing another");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub async fn get(&self, account: &AccountRef) -> LedgerResult<Account> {
        let found = match account {
            AccountRef::Id(id) => self.store.find_by_id(id).await?,
            AccountRef::Number(number) => self.store.find_by_number(number).await?,
        };
        found.ok_or_else(|| LedgerError::NotFound(account.clone()))
    }

    pub async fn accounts_of(&self, owner: &str) -> LedgerResult<Vec<Account>> {
        Ok(self.store.find_by_owner(owner).await?)
    }

    /// Sum of the balances of every account `owner` holds.
    pub async fn total_balance(&self, owner: &str) -> LedgerResult<Decimal> {
        self.accounts_of(owner)
            .await?
            .iter()
            .try_fold(Decimal::ZERO, |total, account| {
                total.checked_add(account.balance())
            })
            .ok_or_else(|| LedgerError::TotalOverflow {
                owner: owner.to_string(),
            })
    }

    pub async fn deposit(&self, account: &AccountRef, amount: Decimal) -> LedgerResult<Account> {
        self.apply_to_ref(account, BalanceCommand::new(BalanceAction::Deposit, amount)?)
            .await
    }

    pub async fn withdraw(&self, account: &AccountRef, amount: Decimal) -> LedgerResult<Account> {
        self.apply_to_ref(account, BalanceCommand::new(BalanceAction::Withdraw, amount)?)
            .await
    }

    async fn apply_to_ref(
        &self,
        account: &AccountRef,
        command: BalanceCommand,
    ) -> LedgerResult<Account> {
        let account = self.get(account).await?;
        self.apply(account.id(), command).await
    }

    /// Re-reads the account under its lock, checks the command against the
    /// fresh balance and persists the result. Returns once the save landed.
    pub(crate) async fn apply(
        &self,
        id: AccountId,
        command: BalanceCommand,
    ) -> LedgerResult<Account> {
        let _guard = self.locks.acquire(id).await;
        let mut account = self
            .store
            .find_by_id(&id)
            .await?
            .ok_or(LedgerError::NotFound(AccountRef::Id(id)))?;

        let event = match account.handle_balance_command(command) {
            Ok(event) => event,
            Err(err) => {
                warn!(account = %account.number(), balance = %account.balance(), "{err}");
                return Err(err.into());
            }
        };
        account.apply(&event);
        debug!(account = %account.number(), action = ?command.action, "persisting balance");
        let account = self.store.save(account).await?;
        info!(
            account = %account.number(),
            action = ?command.action,
            amount = %command.amount.value(),
            balance = %account.balance(),
            "balance updated"
        );
        Ok(account)
    }
}
