//! Moving money between two accounts.
//!
//! A transfer is a withdraw leg, a deposit leg and a record append, each
//! persisted on its own. There is no transaction spanning them, so a failure
//! after the withdraw leg committed is reported as a
//! [`PartialTransferFailure`] naming the legs that went through. Nothing is
//! rolled back automatically.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    account::AccountNumber,
    command::{ArgumentError, BalanceCommand, TransferCommand},
    error::{LedgerError, LedgerResult},
    journal::TransactionJournal,
    ledger::AccountLedger,
    policy,
    record::{NewRecord, TransactionRecord},
};

use super::run_to_completion;

/// Steps of a transfer, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    Validate,
    ResolveOrigin,
    ResolveDestination,
    CheckFunds,
    Withdraw,
    Deposit,
    Record,
}

#[derive(Debug, Error)]
#[error(
    "Transfer of {amount} from {origin} to {destination} failed at {failed:?} after {completed:?} committed: {source}"
)]
pub struct PartialTransferFailure {
    pub origin: AccountNumber,
    pub destination: AccountNumber,
    pub amount: Decimal,
    /// Legs that were persisted before the failure.
    pub completed: Vec<TransferStep>,
    pub failed: TransferStep,
    #[source]
    pub source: Box<LedgerError>,
}

impl PartialTransferFailure {
    pub fn withdraw_committed(&self) -> bool {
        self.completed.contains(&TransferStep::Withdraw)
    }

    pub fn deposit_committed(&self) -> bool {
        self.completed.contains(&TransferStep::Deposit)
    }
}

#[derive(Clone)]
pub struct TransferOrchestrator {
    ledger: AccountLedger,
    journal: TransactionJournal,
}

impl TransferOrchestrator {
    pub fn new(ledger: AccountLedger, journal: TransactionJournal) -> Self {
        Self { ledger, journal }
    }

    /// Once started the transfer runs to its end even if the returned
    /// future is dropped.
    pub async fn transfer(&self, command: TransferCommand) -> LedgerResult<TransactionRecord> {
        run_to_completion(self.clone().execute(command)).await
    }

    async fn execute(self, command: TransferCommand) -> LedgerResult<TransactionRecord> {
        let TransferCommand {
            origin,
            destination,
            amount,
            note,
        } = command;
        debug!(
            step = ?TransferStep::Validate,
            %origin,
            %destination,
            amount = %amount.value(),
            "transfer requested"
        );

        let (from, to) = tokio::join!(self.ledger.get(&origin), self.ledger.get(&destination));
        debug!(step = ?TransferStep::ResolveOrigin, %origin);
        let from = from?;
        debug!(step = ?TransferStep::ResolveDestination, %destination);
        let to = to?;
        // one side given by id, the other by number
        if from.id() == to.id() {
            return Err(ArgumentError::SameAccountTransfer(origin).into());
        }

        debug!(
            step = ?TransferStep::CheckFunds,
            account = %from.number(),
            balance = %from.balance()
        );
        policy::can_withdraw(from.kind(), from.balance(), amount)?;

        // nothing committed yet, the error goes back untouched
        debug!(step = ?TransferStep::Withdraw, account = %from.number());
        self.ledger
            .apply(from.id(), BalanceCommand::withdraw(amount))
            .await?;

        let partial = |completed: Vec<TransferStep>, failed, source| {
            let failure = PartialTransferFailure {
                origin: from.number().clone(),
                destination: to.number().clone(),
                amount: amount.value(),
                completed,
                failed,
                source: Box::new(source),
            };
            error!(
                origin = %failure.origin,
                destination = %failure.destination,
                amount = %failure.amount,
                completed = ?failure.completed,
                failed = ?failure.failed,
                "transfer left partial state: {}",
                failure.source
            );
            LedgerError::PartialTransfer(failure)
        };

        debug!(step = ?TransferStep::Deposit, account = %to.number());
        if let Err(err) = self
            .ledger
            .apply(to.id(), BalanceCommand::deposit(amount))
            .await
        {
            return Err(partial(
                vec![TransferStep::Withdraw],
                TransferStep::Deposit,
                err,
            ));
        }

        debug!(step = ?TransferStep::Record);
        let record = NewRecord::transfer(from.number().clone(), to.number().clone(), amount)
            .with_note(note);
        match self.journal.append(record).await {
            Ok(record) => {
                info!(
                    id = %record.id,
                    origin = %from.number(),
                    destination = %to.number(),
                    amount = %record.amount,
                    "transfer completed"
                );
                Ok(record)
            }
            Err(err) => Err(partial(
                vec![TransferStep::Withdraw, TransferStep::Deposit],
                TransferStep::Record,
                err,
            )),
        }
    }
}
