use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    account::{AccountNumber, AccountRef},
    command::{Amount, ArgumentError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionType {
    const ALL: [TransactionType; 3] = [
        TransactionType::Deposit,
        TransactionType::Withdraw,
        TransactionType::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ArgumentError::UnknownTransactionType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One completed money movement. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub origin: Option<AccountNumber>,
    pub destination: Option<AccountNumber>,
    pub note: Option<String>,
}

impl TransactionRecord {
    pub fn involves(&self, account: &AccountNumber) -> bool {
        self.origin.as_ref() == Some(account) || self.destination.as_ref() == Some(account)
    }
}

/// A record before the journal assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub origin: Option<AccountNumber>,
    pub destination: Option<AccountNumber>,
    pub note: Option<String>,
}

impl NewRecord {
    pub fn deposit(destination: AccountNumber, amount: Amount) -> Self {
        Self {
            kind: TransactionType::Deposit,
            amount: amount.value(),
            origin: None,
            destination: Some(destination),
            note: None,
        }
    }

    pub fn withdraw(origin: AccountNumber, amount: Amount) -> Self {
        Self {
            kind: TransactionType::Withdraw,
            amount: amount.value(),
            origin: Some(origin),
            destination: None,
            note: None,
        }
    }

    pub fn transfer(origin: AccountNumber, destination: AccountNumber, amount: Amount) -> Self {
        Self {
            kind: TransactionType::Transfer,
            amount: amount.value(),
            origin: Some(origin),
            destination: Some(destination),
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Shape only: which account references must be present for the type,
    /// and a positive amount. Balances are not the journal's business.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let malformed = |reason| ArgumentError::MalformedRecord {
            kind: self.kind,
            reason,
        };
        if self.amount <= Decimal::ZERO {
            return Err(malformed("amount must be greater than zero"));
        }
        match (self.kind, &self.origin, &self.destination) {
            (TransactionType::Deposit, None, Some(_)) => Ok(()),
            (TransactionType::Deposit, ..) => {
                Err(malformed("needs a destination and no origin"))
            }
            (TransactionType::Withdraw, Some(_), None) => Ok(()),
            (TransactionType::Withdraw, ..) => {
                Err(malformed("needs an origin and no destination"))
            }
            (TransactionType::Transfer, Some(origin), Some(destination)) => {
                if origin == destination {
                    Err(malformed("origin and destination must differ"))
                } else {
                    Ok(())
                }
            }
            (TransactionType::Transfer, ..) => {
                Err(malformed("needs both an origin and a destination"))
            }
        }
    }

    pub fn into_record(self, id: TransactionId, timestamp: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            id,
            kind: self.kind,
            amount: self.amount,
            timestamp,
            origin: self.origin,
            destination: self.destination,
            note: self.note,
        }
    }
}

/// Caller facing history filter. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub account: Option<AccountRef>,
    pub kind: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, account: impl Into<AccountRef>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn of_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn since(mut self, day: NaiveDate) -> Self {
        self.from = Some(day);
        self
    }

    pub fn until(mut self, day: NaiveDate) -> Self {
        self.to = Some(day);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    Only(TransactionType),
    /// The requested type is not one we know; nothing can match.
    Nothing,
}

impl KindFilter {
    pub fn parse(kind: Option<&str>) -> Self {
        match kind {
            None => KindFilter::Any,
            // unknown names filter everything out instead of failing the query
            Some(raw) => raw.parse().map_or(KindFilter::Nothing, KindFilter::Only),
        }
    }

    pub fn matches(self, kind: TransactionType) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Only(only) => only == kind,
            KindFilter::Nothing => false,
        }
    }
}

/// Inclusive day bounds in UTC: `[from 00:00, day after to 00:00)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayWindow {
    start: Option<DateTime<Utc>>,
    end_exclusive: Option<DateTime<Utc>>,
}

impl DayWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            start: from.map(start_of_day),
            // the last representable day has no successor, so no upper bound applies
            end_exclusive: to.and_then(|day| day.succ_opt()).map(start_of_day),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start)
            && self.end_exclusive.is_none_or(|end| instant < end)
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Compiled form of a [`HistoryFilter`] once the account is known by number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub account: Option<AccountNumber>,
    pub kind: KindFilter,
    pub window: DayWindow,
}

impl RecordQuery {
    pub fn new(account: Option<AccountNumber>, filter: &HistoryFilter) -> Self {
        Self {
            account,
            kind: KindFilter::parse(filter.kind.as_deref()),
            window: DayWindow::new(filter.from, filter.to),
        }
    }

    /// Type and date checks; the account part is left to the store.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.kind.matches(record.kind) && self.window.contains(record.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;

    use crate::command::OperationKind;

    use super::*;

    fn amount(value: i64) -> Amount {
        Amount::new(Decimal::from(value), OperationKind::Deposit).unwrap()
    }

    fn number(value: &str) -> AccountNumber {
        AccountNumber::new(value)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builders_produce_valid_shapes() {
        assert!(NewRecord::deposit(number("A"), amount(1)).validate().is_ok());
        assert!(NewRecord::withdraw(number("A"), amount(1)).validate().is_ok());
        assert!(
            NewRecord::transfer(number("A"), number("B"), amount(1))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn shape_violations_are_rejected() {
        let mut deposit = NewRecord::deposit(number("A"), amount(1));
        deposit.origin = Some(number("B"));
        assert!(matches!(
            deposit.validate(),
            Err(ArgumentError::MalformedRecord {
                kind: TransactionType::Deposit,
                ..
            })
        ));

        let mut withdraw = NewRecord::withdraw(number("A"), amount(1));
        withdraw.origin = None;
        assert!(withdraw.validate().is_err());

        let same = NewRecord::transfer(number("A"), number("A"), amount(1));
        assert_eq!(
            same.validate().unwrap_err().to_string(),
            "Malformed TRANSFER record: origin and destination must differ"
        );

        let mut half = NewRecord::transfer(number("A"), number("B"), amount(1));
        half.destination = None;
        assert!(half.validate().is_err());

        let mut free = NewRecord::deposit(number("A"), amount(1));
        free.amount = Decimal::ZERO;
        assert!(free.validate().is_err());
    }

    #[rstest]
    #[case("withdraw", KindFilter::Only(TransactionType::Withdraw))]
    #[case("WITHDRAW", KindFilter::Only(TransactionType::Withdraw))]
    #[case("Transfer", KindFilter::Only(TransactionType::Transfer))]
    #[case("refund", KindFilter::Nothing)]
    fn kind_filter_is_case_insensitive(#[case] raw: &str, #[case] expected: KindFilter) {
        assert_eq!(KindFilter::parse(Some(raw)), expected);
    }

    #[test]
    fn unknown_kind_matches_nothing() {
        let filter = KindFilter::parse(Some("refund"));
        assert!(
            TransactionType::ALL
                .into_iter()
                .all(|kind| !filter.matches(kind))
        );
        assert!(KindFilter::parse(None).matches(TransactionType::Deposit));
    }

    #[test]
    fn day_window_is_inclusive_at_day_granularity() {
        let window = DayWindow::new(Some(day(2024, 3, 1)), Some(day(2024, 3, 1)));
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let next_midnight = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        assert!(window.contains(midnight));
        assert!(window.contains(next_midnight - TimeDelta::milliseconds(1)));
        assert!(!window.contains(midnight - TimeDelta::milliseconds(1)));
        assert!(!window.contains(next_midnight));
    }

    #[test]
    fn inverted_window_is_simply_empty() {
        let window = DayWindow::new(Some(day(2024, 3, 2)), Some(day(2024, 3, 1)));
        let noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let next_noon = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        assert!(!window.contains(noon));
        assert!(!window.contains(next_noon));
    }

    #[test]
    fn open_window_and_max_day() {
        assert!(DayWindow::default().contains(Utc::now()));
        let window = DayWindow::new(None, Some(NaiveDate::MAX));
        assert!(window.contains(Utc::now()));
    }

    #[test]
    fn record_involves_origin_or_destination() {
        let record = NewRecord::transfer(number("A"), number("B"), amount(3))
            .into_record(TransactionId::generate(), Utc::now());
        assert!(record.involves(&number("A")));
        assert!(record.involves(&number("B")));
        assert!(!record.involves(&number("C")));
    }
}
