use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{account::AccountRef, policy::AccountType, record::TransactionType};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAction {
    Deposit,
    Withdraw,
}

impl BalanceAction {
    pub fn operation(self) -> OperationKind {
        match self {
            BalanceAction::Deposit => OperationKind::Deposit,
            BalanceAction::Withdraw => OperationKind::Withdraw,
        }
    }

    pub fn record_type(self) -> TransactionType {
        match self {
            BalanceAction::Deposit => TransactionType::Deposit,
            BalanceAction::Withdraw => TransactionType::Withdraw,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Amount is required for {operation:?}")]
    AmountRequired { operation: OperationKind },
    #[error("Amount must be greater than zero for {operation:?}, got {amount}")]
    NonPositiveAmount {
        operation: OperationKind,
        amount: Decimal,
    },
    #[error("`{field}` is required for {operation:?}")]
    MissingField {
        operation: OperationKind,
        field: &'static str,
    },
    #[error("Account reference must not be blank")]
    BlankAccountRef,
    #[error("Owner reference must not be blank")]
    BlankOwner,
    #[error("Unknown account type `{0}`")]
    UnknownAccountType(String),
    #[error("Unknown transaction type `{0}`")]
    UnknownTransactionType(String),
    #[error("Origin and destination of a transfer must differ, both are `{0}`")]
    SameAccountTransfer(AccountRef),
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord {
        kind: TransactionType,
        reason: &'static str,
    },
}

/// Strictly positive monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(amount: Decimal, operation: OperationKind) -> Result<Self, ArgumentError> {
        if amount > Decimal::ZERO {
            Ok(Self(amount))
        } else {
            Err(ArgumentError::NonPositiveAmount { operation, amount })
        }
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceCommand {
    pub action: BalanceAction,
    pub amount: Amount,
}

impl BalanceCommand {
    pub fn new(action: BalanceAction, amount: Decimal) -> Result<Self, ArgumentError> {
        Ok(Self {
            action,
            amount: Amount::new(amount, action.operation())?,
        })
    }

    pub fn deposit(amount: Amount) -> Self {
        Self {
            action: BalanceAction::Deposit,
            amount,
        }
    }

    pub fn withdraw(amount: Amount) -> Self {
        Self {
            action: BalanceAction::Withdraw,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAccountCommand {
    pub owner: String,
    pub kind: AccountType,
    pub initial_deposit: Amount,
}

impl OpenAccountCommand {
    pub fn new(
        owner: &str,
        kind: AccountType,
        initial_deposit: Decimal,
    ) -> Result<Self, ArgumentError> {
        let initial_deposit = Amount::new(initial_deposit, OperationKind::Open)?;
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(ArgumentError::BlankOwner);
        }
        Ok(Self {
            owner: owner.to_string(),
            kind,
            initial_deposit,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommand {
    pub origin: AccountRef,
    pub destination: AccountRef,
    pub amount: Amount,
    pub note: Option<String>,
}

impl TransferCommand {
    pub fn new(
        origin: AccountRef,
        destination: AccountRef,
        amount: Decimal,
    ) -> Result<Self, ArgumentError> {
        let amount = Amount::new(amount, OperationKind::Transfer)?;
        if origin == destination {
            return Err(ArgumentError::SameAccountTransfer(origin));
        }
        Ok(Self {
            origin,
            destination,
            amount,
            note: None,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = (!note.trim().is_empty()).then_some(note);
        self
    }
}

/// Raw, unvalidated fields of one operation as it arrives from the outside.
#[derive(Debug, Clone, Default)]
pub struct OperationFields {
    pub account: Option<String>,
    pub destination: Option<String>,
    pub amount: Option<Decimal>,
    pub owner: Option<String>,
    pub account_type: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankCommand {
    Open(OpenAccountCommand),
    Balance {
        account: AccountRef,
        command: BalanceCommand,
    },
    Transfer(TransferCommand),
}

impl BankCommand {
    pub fn parse_command(
        kind: OperationKind,
        fields: &OperationFields,
    ) -> Result<Self, ArgumentError> {
        let amount = fields
            .amount
            .ok_or(ArgumentError::AmountRequired { operation: kind })?;
        match kind {
            OperationKind::Open => {
                let owner = Self::required(kind, "owner", &fields.owner)?;
                let account_type =
                    Self::required(kind, "account_type", &fields.account_type)?.parse()?;
                Ok(Self::Open(OpenAccountCommand::new(
                    owner,
                    account_type,
                    amount,
                )?))
            }
            OperationKind::Deposit => {
                Self::parse_balance_command(BalanceAction::Deposit, fields, amount)
            }
            OperationKind::Withdraw => {
                Self::parse_balance_command(BalanceAction::Withdraw, fields, amount)
            }
            OperationKind::Transfer => {
                let origin = Self::required(kind, "account", &fields.account)?.parse()?;
                let destination =
                    Self::required(kind, "destination", &fields.destination)?.parse()?;
                let command = TransferCommand::new(origin, destination, amount)?;
                Ok(Self::Transfer(match &fields.note {
                    Some(note) => command.with_note(note.as_str()),
                    None => command,
                }))
            }
        }
    }

    fn parse_balance_command(
        action: BalanceAction,
        fields: &OperationFields,
        amount: Decimal,
    ) -> Result<Self, ArgumentError> {
        let command = BalanceCommand::new(action, amount)?;
        let account = Self::required(action.operation(), "account", &fields.account)?.parse()?;
        Ok(Self::Balance { account, command })
    }

    fn required<'a>(
        operation: OperationKind,
        field: &'static str,
        value: &'a Option<String>,
    ) -> Result<&'a str, ArgumentError> {
        match value.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ArgumentError::MissingField { operation, field }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::account::AccountNumber;

    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn number(value: &str) -> AccountRef {
        AccountRef::Number(AccountNumber::new(value))
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("-0.01")]
    fn non_positive_amounts_are_rejected(#[case] raw: &str) {
        let err = BalanceCommand::new(BalanceAction::Withdraw, dec(raw)).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::NonPositiveAmount {
                operation: OperationKind::Withdraw,
                ..
            }
        ));
    }

    #[test]
    fn positive_amount_is_kept_as_is() {
        let command = BalanceCommand::new(BalanceAction::Deposit, dec("0.01")).unwrap();
        assert_eq!(command.amount.value(), dec("0.01"));
        assert_eq!(command.action, BalanceAction::Deposit);
    }

    #[test]
    fn open_requires_positive_deposit_and_owner() {
        let err = OpenAccountCommand::new("12345678", AccountType::Savings, dec("0")).unwrap_err();
        assert!(matches!(err, ArgumentError::NonPositiveAmount { .. }));
        let err = OpenAccountCommand::new("  ", AccountType::Savings, dec("10")).unwrap_err();
        assert_eq!(err, ArgumentError::BlankOwner);
        let command = OpenAccountCommand::new(" 42 ", AccountType::Checking, dec("10")).unwrap();
        assert_eq!(command.owner, "42");
    }

    #[test]
    fn transfer_to_itself_is_rejected() {
        let err = TransferCommand::new(number("ACC1"), number("ACC1"), dec("10.00")).unwrap_err();
        assert_eq!(err, ArgumentError::SameAccountTransfer(number("ACC1")));
        assert_eq!(
            err.to_string(),
            "Origin and destination of a transfer must differ, both are `ACC1`"
        );
    }

    #[test]
    fn transfer_checks_amount_before_accounts() {
        let err = TransferCommand::new(number("ACC1"), number("ACC1"), dec("0")).unwrap_err();
        assert!(matches!(err, ArgumentError::NonPositiveAmount { .. }));
    }

    #[test]
    fn blank_note_is_dropped() {
        let command = TransferCommand::new(number("ACC1"), number("ACC2"), dec("1"))
            .unwrap()
            .with_note("   ");
        assert_eq!(command.note, None);
    }

    #[test]
    fn parse_commands() {
        let open = BankCommand::parse_command(
            OperationKind::Open,
            &OperationFields {
                amount: Some(dec("100")),
                owner: Some("12345678".into()),
                account_type: Some("savings".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(
            open,
            BankCommand::Open(OpenAccountCommand {
                kind: AccountType::Savings,
                ..
            })
        ));

        let transfer = BankCommand::parse_command(
            OperationKind::Transfer,
            &OperationFields {
                account: Some("ACC1".into()),
                destination: Some("ACC2".into()),
                amount: Some(dec("5")),
                note: Some("rent".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let BankCommand::Transfer(transfer) = transfer else {
            panic!("expected a transfer");
        };
        assert_eq!(transfer.origin, number("ACC1"));
        assert_eq!(transfer.note.as_deref(), Some("rent"));
    }

    #[test]
    fn parse_reports_missing_fields() {
        let err = BankCommand::parse_command(OperationKind::Deposit, &OperationFields::default())
            .unwrap_err();
        assert_eq!(
            err,
            ArgumentError::AmountRequired {
                operation: OperationKind::Deposit
            }
        );

        let err = BankCommand::parse_command(
            OperationKind::Withdraw,
            &OperationFields {
                amount: Some(dec("1")),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ArgumentError::MissingField {
                operation: OperationKind::Withdraw,
                field: "account"
            }
        );

        let err = BankCommand::parse_command(
            OperationKind::Open,
            &OperationFields {
                amount: Some(dec("1")),
                owner: Some("1".into()),
                account_type: Some("gold".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, ArgumentError::UnknownAccountType("gold".into()));
    }
}
