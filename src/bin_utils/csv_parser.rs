use std::io::Read;

use csv::{Reader, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::command::{OperationFields, OperationKind};

#[derive(Debug, Deserialize)]
pub struct OperationRow {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub account: Option<String>,
    pub destination: Option<String>,
    pub amount: Option<Decimal>,
    pub owner: Option<String>,
    pub account_type: Option<String>,
    pub note: Option<String>,
}

impl OperationRow {
    pub fn into_fields(self) -> OperationFields {
        OperationFields {
            account: self.account,
            destination: self.destination,
            amount: self.amount,
            owner: self.owner,
            account_type: self.account_type,
            note: self.note,
        }
    }
}

/// Parses an operation list in CSV format, one row at a time.
///
/// Every row comes with the line it starts on. A row that cannot be read
/// is handed out as an error and parsing carries on with the next one,
/// unless the underlying reader itself failed.
pub struct CsvOperationParser<R> {
    reader: Reader<R>,
    headers: StringRecord,
    record: StringRecord,
    exhausted: bool,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            exhausted: false,
        })
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = (u64, Result<OperationRow, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(false) => {
                self.exhausted = true;
                None
            }
            Ok(true) => {
                let line = self.record.position().map_or(0, |pos| pos.line());
                Some((line, self.record.deserialize(Some(&self.headers))))
            }
            Err(err) => {
                self.exhausted = err.is_io_error();
                let line = err.position().map_or(0, |pos| pos.line());
                Some((line, Err(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_come_with_their_line() {
        let input = "type, account, destination, amount, owner, account_type, note\n\
                     open,,,100,12345678,savings,\n\
                     transfer, ACC1, ACC2, 2.5,,, rent\n";
        let rows: Vec<_> = CsvOperationParser::new(input.as_bytes())
            .unwrap()
            .map(|(line, row)| (line, row.unwrap()))
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[0].1.kind, OperationKind::Open);
        assert_eq!(rows[0].1.account, None);
        assert_eq!(rows[0].1.owner.as_deref(), Some("12345678"));

        let (line, transfer) = &rows[1];
        assert_eq!(*line, 3);
        assert_eq!(transfer.destination.as_deref(), Some("ACC2"));
        assert_eq!(transfer.amount, Some(Decimal::new(25, 1)));
        assert_eq!(transfer.note.as_deref(), Some("rent"));
    }

    #[test]
    fn bad_row_does_not_stop_the_rest() {
        let input = "type,account,destination,amount,owner,account_type,note\n\
                     refund,ACC1,,1,,,\n\
                     deposit,ACC1,,abc,,,\n\
                     deposit,ACC1,,1\n";
        let rows: Vec<_> = CsvOperationParser::new(input.as_bytes()).unwrap().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].1.is_err());
        assert!(rows[1].1.is_err());
        let (line, short) = &rows[2];
        assert_eq!(*line, 4);
        assert_eq!(short.as_ref().unwrap().kind, OperationKind::Deposit);
    }
}
