// CSV export - header `id,date,category,amount,description`, one row per record
//
// Quoting is delegated to the csv crate (RFC 4180): fields containing commas,
// quotes or newlines are wrapped and inner quotes doubled.

use crate::db::{ExpenseRecord, DATE_FORMAT};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

pub const CSV_HEADER: [&str; 5] = ["id", "date", "category", "amount", "description"];

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: String,
    category: &'a str,
    amount: String,
    description: &'a str,
}

impl<'a> From<&'a ExpenseRecord> for CsvRow<'a> {
    fn from(record: &'a ExpenseRecord) -> Self {
        CsvRow {
            id: record.id,
            date: record.date.format(DATE_FORMAT).to_string(),
            category: &record.category,
            amount: record.amount.to_decimal_string(),
            description: &record.description,
        }
    }
}

/// Write records to `writer` in the order given
pub fn export_csv<W: Write>(records: &[ExpenseRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    // Written by hand so an empty export still carries the header
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(CsvRow::from(record))?;
    }
    wtr.flush()?;

    tracing::info!(rows = records.len(), "exported expenses as CSV");
    Ok(())
}

pub fn export_csv_string(records: &[ExpenseRecord]) -> Result<String> {
    let mut buf = Vec::new();
    export_csv(records, &mut buf)?;
    // csv only emits the UTF-8 we gave it
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewExpense;
    use crate::money::Money;
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct ParsedRow {
        id: i64,
        date: String,
        category: String,
        amount: String,
        description: String,
    }

    fn record(id: i64, date: &str, category: &str, cents: i64, description: &str) -> ExpenseRecord {
        NewExpense::new(
            NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            category,
            Money::from_cents(cents),
            description,
        )
        .into_record(id)
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = export_csv_string(&[]).unwrap();
        assert_eq!(csv, "id,date,category,amount,description\n");
    }

    #[test]
    fn test_plain_rows() {
        let csv = export_csv_string(&[
            record(1, "2024-01-05", "Food", 2000, "Lunch"),
            record(2, "2024-01-20", "Transport", 1505, ""),
        ])
        .unwrap();

        assert_eq!(
            csv,
            "id,date,category,amount,description\n\
             1,2024-01-05,Food,20.00,Lunch\n\
             2,2024-01-20,Transport,15.05,\n"
        );
    }

    #[test]
    fn test_commas_and_quotes_are_escaped() {
        let csv = export_csv_string(&[record(1, "2024-01-05", "Food", 2000, "Lunch, with client")]).unwrap();
        assert!(csv.contains("\"Lunch, with client\""));

        let csv = export_csv_string(&[record(2, "2024-01-05", "Food", 100, "the \"good\" one")]).unwrap();
        assert!(csv.contains("\"the \"\"good\"\" one\""));
    }

    #[test]
    fn test_roundtrip_recovers_fields() {
        let records = vec![
            record(1, "2024-01-05", "Food", 2000, "Lunch, with client"),
            record(2, "2024-01-20", "Transport", 1500, "Bus \"express\""),
            record(3, "2024-02-01", "Eating, Out", 3000, "multi\nline"),
            record(4, "2024-02-02", "Other", 0, ""),
        ];

        let csv = export_csv_string(&records).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CSV_HEADER);

        let parsed: Vec<ParsedRow> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(parsed.len(), records.len());

        for (row, original) in parsed.iter().zip(&records) {
            assert_eq!(row.id, original.id);
            assert_eq!(row.date, original.date.format(DATE_FORMAT).to_string());
            assert_eq!(row.category, original.category);
            assert_eq!(Money::parse(&row.amount).unwrap(), original.amount);
            assert_eq!(row.description, original.description);
        }
    }
}
