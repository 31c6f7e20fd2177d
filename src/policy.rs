use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::{Amount, ArgumentError};

/// Lowest balance a checking account may reach: -500.00
pub const CHECKING_OVERDRAFT_LIMIT: Decimal = Decimal::from_parts(50_000, 0, 0, true, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Savings,
    Checking,
}

impl AccountType {
    /// Balance the account must never go below.
    pub fn floor(self) -> Decimal {
        match self {
            AccountType::Savings => Decimal::ZERO,
            AccountType::Checking => CHECKING_OVERDRAFT_LIMIT,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => f.write_str("SAVINGS"),
            AccountType::Checking => f.write_str("CHECKING"),
        }
    }
}

impl FromStr for AccountType {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("savings") {
            Ok(AccountType::Savings)
        } else if trimmed.eq_ignore_ascii_case("checking") {
            Ok(AccountType::Checking)
        } else {
            Err(ArgumentError::UnknownAccountType(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Savings balance cannot go negative: {balance} - {amount}")]
    SavingsOverdrawn { balance: Decimal, amount: Decimal },
    #[error("Checking overdraft limit exceeded ({limit}): {balance} - {amount}")]
    OverdraftLimitExceeded {
        balance: Decimal,
        amount: Decimal,
        limit: Decimal,
    },
}

/// Decides whether `amount` may leave an account of `kind` holding `balance`.
///
/// Pure and total over the account types: the only inputs are the three
/// arguments, and `Amount` already guarantees a positive value.
pub fn can_withdraw(
    kind: AccountType,
    balance: Decimal,
    amount: Amount,
) -> Result<(), PolicyViolation> {
    let amount = amount.value();
    // an unrepresentable result is certainly below any floor
    let admitted = balance
        .checked_sub(amount)
        .is_some_and(|candidate| candidate >= kind.floor());
    if admitted {
        return Ok(());
    }
    match kind {
        AccountType::Savings => Err(PolicyViolation::SavingsOverdrawn { balance, amount }),
        AccountType::Checking => Err(PolicyViolation::OverdraftLimitExceeded {
            balance,
            amount,
            limit: CHECKING_OVERDRAFT_LIMIT,
        }),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use crate::command::OperationKind;

    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn amount(value: &str) -> Amount {
        Amount::new(dec(value), OperationKind::Withdraw).unwrap()
    }

    #[test]
    fn overdraft_limit_is_minus_five_hundred() {
        assert_eq!(CHECKING_OVERDRAFT_LIMIT, dec("-500.00"));
        assert_eq!(CHECKING_OVERDRAFT_LIMIT.to_string(), "-500.00");
    }

    #[rstest]
    #[case(AccountType::Savings, "100.00", "100.00", true)]
    #[case(AccountType::Savings, "100.00", "100.01", false)]
    #[case(AccountType::Savings, "0", "0.01", false)]
    #[case(AccountType::Checking, "100.00", "600.00", true)]
    #[case(AccountType::Checking, "100.00", "600.01", false)]
    #[case(AccountType::Checking, "-500.00", "0.01", false)]
    #[case(AccountType::Checking, "-499.99", "0.01", true)]
    fn withdrawal_decisions(
        #[case] kind: AccountType,
        #[case] balance: &str,
        #[case] requested: &str,
        #[case] allowed: bool,
    ) {
        assert_eq!(
            can_withdraw(kind, dec(balance), amount(requested)).is_ok(),
            allowed
        );
    }

    #[test]
    fn rejection_names_the_rule() {
        let err = can_withdraw(AccountType::Savings, dec("10"), amount("11")).unwrap_err();
        assert_eq!(
            err,
            PolicyViolation::SavingsOverdrawn {
                balance: dec("10"),
                amount: dec("11")
            }
        );
        let err = can_withdraw(AccountType::Checking, dec("10"), amount("511")).unwrap_err();
        assert!(matches!(err, PolicyViolation::OverdraftLimitExceeded { .. }));
        assert_eq!(
            err.to_string(),
            "Checking overdraft limit exceeded (-500.00): 10 - 511"
        );
    }

    #[test]
    fn extreme_balance_is_rejected_not_overflowed() {
        let err = can_withdraw(AccountType::Checking, Decimal::MIN, amount("1")).unwrap_err();
        assert!(matches!(err, PolicyViolation::OverdraftLimitExceeded { .. }));
    }

    #[rstest]
    #[case("savings", AccountType::Savings)]
    #[case("SAVINGS", AccountType::Savings)]
    #[case(" Checking ", AccountType::Checking)]
    fn parses_account_type(#[case] raw: &str, #[case] expected: AccountType) {
        assert_eq!(raw.parse::<AccountType>().unwrap(), expected);
    }

    #[test]
    fn unknown_account_type_is_an_argument_error() {
        let err = "brokerage".parse::<AccountType>().unwrap_err();
        assert!(matches!(err, ArgumentError::UnknownAccountType(raw) if raw == "brokerage"));
    }

    proptest! {
        #[test]
        fn admitted_withdrawal_never_crosses_floor(
            cents in -50_000i64..1_000_000,
            requested in 1i64..1_000_000,
            checking in any::<bool>(),
        ) {
            let kind = if checking { AccountType::Checking } else { AccountType::Savings };
            let balance = Decimal::new(cents, 2);
            let requested = Amount::new(Decimal::new(requested, 2), OperationKind::Withdraw).unwrap();
            let decision = can_withdraw(kind, balance, requested);
            prop_assert_eq!(decision.is_ok(), balance - requested.value() >= kind.floor());
        }
    }
}
