use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::{AccountError, AccountNumber, AccountRef},
    command::ArgumentError,
    policy::PolicyViolation,
    processor::transfer::PartialTransferFailure,
    record::TransactionType,
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Rejected before anything was touched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
    #[error("Account not found: {0}")]
    NotFound(AccountRef),
    /// The balance rules refused the movement; nothing was touched.
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] AccountError),
    #[error(transparent)]
    PartialTransfer(#[from] PartialTransferFailure),
    /// A single deposit or withdrawal committed but its record did not.
    #[error("{kind} of {amount} on {account} was applied but not recorded: {source}")]
    Unrecorded {
        kind: TransactionType,
        account: AccountNumber,
        amount: Decimal,
        #[source]
        source: Box<LedgerError>,
    },
    /// The task running the operation died; how far it got is unknown.
    #[error("Operation interrupted before completion: {0}")]
    Interrupted(String),
    #[error("Total balance of owner `{owner}` would leave the representable range")]
    TotalOverflow { owner: String },
    #[error("No account numbers left to issue")]
    NumbersExhausted,
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// True when some part of the operation may have committed, so the
    /// caller cannot assume that nothing happened.
    pub fn leaves_partial_state(&self) -> bool {
        matches!(
            self,
            LedgerError::PartialTransfer(_)
                | LedgerError::Unrecorded { .. }
                | LedgerError::Interrupted(_)
        )
    }
}

impl From<PolicyViolation> for LedgerError {
    fn from(violation: PolicyViolation) -> Self {
        LedgerError::InvariantViolation(violation.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
