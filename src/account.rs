use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    command::{ArgumentError, BalanceAction, BalanceCommand, OpenAccountCommand},
    policy::{self, AccountType, PolicyViolation},
};

/// Surrogate identity assigned when the account is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human facing account number, immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either read path into the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Id(AccountId),
    Number(AccountNumber),
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => id.fmt(f),
            AccountRef::Number(number) => number.fmt(f),
        }
    }
}

/// Anything that parses as a UUID is an id, everything else a number.
impl FromStr for AccountRef {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ArgumentError::BlankAccountRef);
        }
        Ok(match Uuid::parse_str(s) {
            Ok(id) => AccountRef::Id(AccountId(id)),
            Err(_) => AccountRef::Number(AccountNumber::new(s)),
        })
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        AccountRef::Id(id)
    }
}

impl From<AccountNumber> for AccountRef {
    fn from(number: AccountNumber) -> Self {
        AccountRef::Number(number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEvent {
    amount: Decimal,
    kind: AccountEventKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("Balance of {number} would leave the representable range")]
    BalanceOverflow { number: AccountNumber },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    number: AccountNumber,
    owner: String,
    kind: AccountType,
    balance: Decimal,
    opened_at: DateTime<Utc>,
}

impl Account {
    pub fn open(
        id: AccountId,
        number: AccountNumber,
        command: &OpenAccountCommand,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            owner: command.owner.clone(),
            kind: command.kind,
            balance: command.initial_deposit.value(),
            opened_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn number(&self) -> &AccountNumber {
        &self.number
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> AccountType {
        self.kind
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited => {
                self.balance += event.amount;
            }
            AccountEventKind::Withdrawn => {
                self.balance -= event.amount;
            }
        }
    }

    pub fn handle_balance_command(
        &self,
        command: BalanceCommand,
    ) -> Result<AccountEvent, AccountError> {
        let amount = command.amount.value();
        match command.action {
            BalanceAction::Deposit => {
                if self.balance.checked_add(amount).is_none() {
                    return Err(AccountError::BalanceOverflow {
                        number: self.number.clone(),
                    });
                }
                Ok(AccountEvent {
                    amount,
                    kind: AccountEventKind::Deposited,
                })
            }
            BalanceAction::Withdraw => {
                policy::can_withdraw(self.kind, self.balance, command.amount)?;
                Ok(AccountEvent {
                    amount,
                    kind: AccountEventKind::Withdrawn,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::command::{Amount, OperationKind};

    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn account(kind: AccountType, initial: &str) -> Account {
        let command = OpenAccountCommand::new("12345678", kind, dec(initial)).unwrap();
        Account::open(
            AccountId::generate(),
            AccountNumber::new("ACC00100001"),
            &command,
            Utc::now(),
        )
    }

    fn amount(value: &str) -> Amount {
        Amount::new(dec(value), OperationKind::Deposit).unwrap()
    }

    #[test]
    fn open_uses_initial_deposit() {
        let acc = account(AccountType::Checking, "25.50");
        assert_eq!(acc.balance(), dec("25.50"));
        assert_eq!(acc.kind(), AccountType::Checking);
        assert_eq!(acc.owner(), "12345678");
        assert_eq!(acc.number().as_str(), "ACC00100001");
    }

    #[test]
    fn apply_events() {
        let mut acc = account(AccountType::Savings, "10");
        acc.apply(&AccountEvent {
            amount: dec("10"),
            kind: AccountEventKind::Deposited,
        });
        assert_eq!(acc.balance(), dec("20"));
        // event is the source of truth, there's no more validation happening
        acc.apply(&AccountEvent {
            amount: dec("25"),
            kind: AccountEventKind::Withdrawn,
        });
        assert_eq!(acc.balance(), dec("-5"));
    }

    #[test]
    fn handle_balance_command() {
        let mut acc = account(AccountType::Savings, "100.00");

        let withdrawal = BalanceCommand::withdraw(amount("100.01"));
        let err = acc.handle_balance_command(withdrawal).unwrap_err();
        assert!(matches!(
            err,
            AccountError::Policy(PolicyViolation::SavingsOverdrawn { .. })
        ));
        assert_eq!(acc.balance(), dec("100.00"));

        let deposit_evt = acc
            .handle_balance_command(BalanceCommand::deposit(amount("0.01")))
            .unwrap();
        assert_eq!(deposit_evt.kind, AccountEventKind::Deposited);
        acc.apply(&deposit_evt);

        let withdrawal_evt = acc.handle_balance_command(withdrawal).unwrap();
        assert_eq!(withdrawal_evt.kind, AccountEventKind::Withdrawn);
        acc.apply(&withdrawal_evt);
        assert_eq!(acc.balance(), dec("0.00"));
    }

    #[test]
    fn deposit_then_withdraw_round_trips() {
        let mut acc = account(AccountType::Checking, "0.01");
        let withdrawal = acc
            .handle_balance_command(BalanceCommand::withdraw(amount("500.01")))
            .unwrap();
        acc.apply(&withdrawal);
        assert_eq!(acc.balance(), dec("-500.00"));

        let before = acc.balance();
        let deposit = acc
            .handle_balance_command(BalanceCommand::deposit(amount("73.19")))
            .unwrap();
        acc.apply(&deposit);
        let withdrawal = acc
            .handle_balance_command(BalanceCommand::withdraw(amount("73.19")))
            .unwrap();
        acc.apply(&withdrawal);
        assert_eq!(acc.balance(), before);
    }

    #[test]
    fn deposit_overflow_is_rejected() {
        let mut acc = account(AccountType::Savings, "1");
        acc.balance = Decimal::MAX;
        let err = acc
            .handle_balance_command(BalanceCommand::deposit(amount("1")))
            .unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
    }

    #[test]
    fn account_ref_parsing() {
        let id = AccountId::generate();
        assert_eq!(
            id.to_string().parse::<AccountRef>().unwrap(),
            AccountRef::Id(id)
        );
        assert_eq!(
            " ACC00100001 ".parse::<AccountRef>().unwrap(),
            AccountRef::Number(AccountNumber::new("ACC00100001"))
        );
        assert_eq!(
            "".parse::<AccountRef>().unwrap_err(),
            ArgumentError::BlankAccountRef
        );
    }
}
