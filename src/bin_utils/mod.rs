//! Runs a CSV batch of operations against an in-memory bank and prints the
//! resulting account table. Used by the binary and the integration tests.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::{
    account::{Account, AccountId, AccountRef},
    command::{ArgumentError, BankCommand},
    config::TellerConfig,
    error::LedgerError,
    processor::bank_processor::BankProcessor,
};
use csv_parser::{CsvOperationParser, OperationRow};
use csv_printer::{AccountRow, print_accounts};

pub mod csv_parser;
pub mod csv_printer;

/// Why a single row was not applied.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Malformed row: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<ArgumentError> for RowError {
    fn from(err: ArgumentError) -> Self {
        RowError::Ledger(err.into())
    }
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub config: TellerConfig,
    pub error_printer: Box<dyn FnMut(u64, RowError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub async fn run(mut self) -> Result<()> {
        let parser =
            CsvOperationParser::new(self.input).context("Failed to read the CSV header")?;
        let processor = BankProcessor::in_memory(&self.config);

        let mut opened: Vec<AccountId> = Vec::new();
        let mut applied = 0usize;
        for (line, row) in parser {
            match Self::apply_row(&processor, row).await {
                Ok(Some(account)) => {
                    opened.push(account.id());
                    applied += 1;
                }
                Ok(None) => applied += 1,
                Err(err) => (self.error_printer)(line, err),
            }
        }
        info!(applied, accounts = opened.len(), "batch finished");

        let mut rows = Vec::with_capacity(opened.len());
        for id in opened {
            let account = processor
                .ledger()
                .get(&AccountRef::Id(id))
                .await
                .with_context(|| format!("Account {id} vanished before printing"))?;
            rows.push(AccountRow::from(&account));
        }
        print_accounts(self.output, rows.into_iter())
    }

    /// Returns the account when the row opened one.
    async fn apply_row(
        processor: &BankProcessor,
        row: Result<OperationRow, csv::Error>,
    ) -> Result<Option<Account>, RowError> {
        let row = row?;
        let command = BankCommand::parse_command(row.kind, &row.into_fields())?;
        match command {
            BankCommand::Open(command) => Ok(Some(processor.open_account(command).await?)),
            BankCommand::Balance { account, command } => {
                processor.execute_balance(account, command).await?;
                Ok(None)
            }
            BankCommand::Transfer(command) => {
                processor.execute_transfer(command).await?;
                Ok(None)
            }
        }
    }
}
