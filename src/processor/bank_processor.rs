use std::sync::Arc;

use async_trait::async_trait;
use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use rust_decimal::Decimal;
use tracing::error;

use crate::{
    account::{Account, AccountRef},
    clock::{Clock, SystemClock},
    command::{BalanceAction, BalanceCommand, OpenAccountCommand, TransferCommand},
    config::TellerConfig,
    error::{LedgerError, LedgerResult},
    journal::TransactionJournal,
    ledger::AccountLedger,
    numbering::{AccountNumberGenerator, SequenceNumberGenerator},
    record::{HistoryFilter, NewRecord, RecordQuery, TransactionRecord},
    store::{
        AccountStore, TransactionStore,
        in_memory::{InMemoryAccountStore, InMemoryTransactionStore},
    },
};

use super::{TransactionProcessor, run_to_completion, transfer::TransferOrchestrator};

/// Ledger, journal and transfers wired over one pair of stores.
#[derive(Clone)]
pub struct BankProcessor {
    ledger: AccountLedger,
    journal: TransactionJournal,
    transfers: TransferOrchestrator,
}

impl BankProcessor {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        numbers: Arc<dyn AccountNumberGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = AccountLedger::new(accounts, numbers, Arc::clone(&clock));
        let journal = TransactionJournal::new(transactions, clock);
        let transfers = TransferOrchestrator::new(ledger.clone(), journal.clone());
        Self {
            ledger,
            journal,
            transfers,
        }
    }

    pub fn in_memory(config: &TellerConfig) -> Self {
        Self::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryTransactionStore::new()),
            Arc::new(SequenceNumberGenerator::from_config(config)),
            Arc::new(SystemClock),
        )
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn journal(&self) -> &TransactionJournal {
        &self.journal
    }

    pub async fn open_account(&self, command: OpenAccountCommand) -> LedgerResult<Account> {
        self.ledger.open(command).await
    }

    pub async fn execute_transfer(
        &self,
        command: TransferCommand,
    ) -> LedgerResult<TransactionRecord> {
        self.transfers.transfer(command).await
    }

    /// Deposit or withdrawal plus its record, detached from the caller.
    pub async fn execute_balance(
        &self,
        account: AccountRef,
        command: BalanceCommand,
    ) -> LedgerResult<Account> {
        run_to_completion(self.clone().move_balance(account, command)).await
    }

    async fn move_balance(
        self,
        account: AccountRef,
        command: BalanceCommand,
    ) -> LedgerResult<Account> {
        let target = self.ledger.get(&account).await?;
        let updated = self.ledger.apply(target.id(), command).await?;

        let number = updated.number().clone();
        let record = match command.action {
            BalanceAction::Deposit => NewRecord::deposit(number.clone(), command.amount),
            BalanceAction::Withdraw => NewRecord::withdraw(number.clone(), command.amount),
        };
        if let Err(err) = self.journal.append(record).await {
            error!(
                account = %number,
                action = ?command.action,
                amount = %command.amount.value(),
                "balance changed but the record was not written: {err}"
            );
            return Err(LedgerError::Unrecorded {
                kind: command.action.record_type(),
                account: number,
                amount: command.amount.value(),
                source: Box::new(err),
            });
        }
        Ok(updated)
    }
}

#[async_trait]
impl TransactionProcessor for BankProcessor {
    async fn deposit(&self, account: AccountRef, amount: Decimal) -> LedgerResult<Account> {
        let command = BalanceCommand::new(BalanceAction::Deposit, amount)?;
        self.execute_balance(account, command).await
    }

    async fn withdraw(&self, account: AccountRef, amount: Decimal) -> LedgerResult<Account> {
        let command = BalanceCommand::new(BalanceAction::Withdraw, amount)?;
        self.execute_balance(account, command).await
    }

    async fn transfer(
        &self,
        origin: AccountRef,
        destination: AccountRef,
        amount: Decimal,
    ) -> LedgerResult<TransactionRecord> {
        let command = TransferCommand::new(origin, destination, amount)?;
        self.execute_transfer(command).await
    }

    fn history(
        &self,
        filter: HistoryFilter,
    ) -> BoxStream<'static, LedgerResult<TransactionRecord>> {
        match filter.account.clone() {
            None => self.journal.history(RecordQuery::new(None, &filter)),
            // numbers are taken as-is so records of closed accounts stay reachable
            Some(AccountRef::Number(number)) => {
                self.journal.history(RecordQuery::new(Some(number), &filter))
            }
            Some(account @ AccountRef::Id(_)) => {
                let ledger = self.ledger.clone();
                let journal = self.journal.clone();
                stream::once(async move {
                    let resolved = ledger.get(&account).await?;
                    let query = RecordQuery::new(Some(resolved.number().clone()), &filter);
                    Ok::<_, LedgerError>(journal.history(query))
                })
                .try_flatten()
                .boxed()
            }
        }
    }
}
