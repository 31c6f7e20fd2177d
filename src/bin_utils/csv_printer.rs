use std::io::Write;

use anyhow::Context;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    account::{Account, AccountNumber},
    policy::AccountType,
};

#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub account: AccountNumber,
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub balance: Decimal,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            account: account.number().clone(),
            owner: account.owner().to_string(),
            kind: account.kind(),
            balance: account.balance(),
        }
    }
}

/// Writes the account table with a header row, in the given order.
pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = AccountRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for row in accounts {
        let number = row.account.clone();
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write account `{number}` to CSV"))?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}
