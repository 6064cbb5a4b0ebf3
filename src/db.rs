use crate::error::{Result, TrackerError};
use crate::money::Money;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// Date format used in the `date` column and on every boundary
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Labels offered by the entry form. Not enforced by the store.
pub const SUGGESTED_CATEGORIES: [&str; 5] =
    ["Food", "Transport", "Entertainment", "Utilities", "Other"];

/// Category used when an entry arrives without one
pub const DEFAULT_CATEGORY: &str = "Other";

/// One persisted expense entry
///
/// Records are append-only: once the store hands out an `id` the row is
/// never updated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub category: String,
    pub amount: Money,
    pub description: String,
}

/// A validated expense that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount: Money,
    pub description: String,
}

impl NewExpense {
    pub fn new(date: NaiveDate, category: &str, amount: Money, description: &str) -> Self {
        NewExpense {
            date,
            category: category.to_string(),
            amount,
            description: description.to_string(),
        }
    }

    pub fn into_record(self, id: i64) -> ExpenseRecord {
        ExpenseRecord {
            id,
            date: self.date,
            category: self.category,
            amount: self.amount,
            description: self.description,
        }
    }
}

pub(crate) mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Create the expenses table if it does not exist yet.
///
/// The layout matches `expense_tracker.db` files written by earlier
/// versions of the tracker, so an existing database opens as-is.
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT,
            category TEXT,
            amount REAL,
            description TEXT
        )",
        [],
    )?;

    Ok(())
}

pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (date, category, amount, description)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            expense.date.format(DATE_FORMAT).to_string(),
            expense.category,
            expense.amount.to_f64(),
            expense.description,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Every stored expense in insertion order.
pub fn get_all_expenses(conn: &Connection) -> Result<Vec<ExpenseRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, category, amount, description
         FROM expenses
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, date, category, amount, description)| {
            let date_str = date.unwrap_or_default();
            let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                TrackerError::CorruptRow {
                    id,
                    message: format!("date '{}' is not YYYY-MM-DD ({})", date_str, e),
                }
            })?;

            // NULL amounts count as zero
            Ok(ExpenseRecord {
                id,
                date,
                category: category.unwrap_or_default(),
                amount: amount.map(Money::from_f64).unwrap_or_default(),
                description: description.unwrap_or_default(),
            })
        })
        .collect()
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_db();
        insert_expense(&conn, &NewExpense::new(date("2024-01-05"), "Food", Money::from_cents(2000), "Lunch")).unwrap();

        setup_database(&conn).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 1, "Re-running setup must not drop rows");
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let conn = test_db();

        let first = insert_expense(&conn, &NewExpense::new(date("2024-01-05"), "Food", Money::from_cents(2000), "Lunch")).unwrap();
        let second = insert_expense(&conn, &NewExpense::new(date("2024-01-20"), "Transport", Money::from_cents(1500), "Bus")).unwrap();

        assert!(second > first);

        let all = get_all_expenses(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first);
        assert_eq!(all[0].category, "Food");
        assert_eq!(all[0].amount, Money::from_cents(2000));
        assert_eq!(all[1].date, date("2024-01-20"));
        assert_eq!(all[1].description, "Bus");
    }

    #[test]
    fn test_empty_table_reads_empty() {
        let conn = test_db();
        assert!(get_all_expenses(&conn).unwrap().is_empty());
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_null_columns_from_legacy_rows() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO expenses (date, category, amount, description) VALUES ('2024-03-01', NULL, NULL, NULL)",
            [],
        )
        .unwrap();

        let all = get_all_expenses(&conn).unwrap();
        assert_eq!(all[0].amount, Money::zero());
        assert_eq!(all[0].category, "");
        assert_eq!(all[0].description, "");
    }

    #[test]
    fn test_unparseable_date_is_reported() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO expenses (date, category, amount, description) VALUES ('03/01/2024', 'Food', 1.0, '')",
            [],
        )
        .unwrap();

        let err = get_all_expenses(&conn).unwrap_err();
        assert!(err.is_persistence());
        assert!(matches!(err, TrackerError::CorruptRow { id: 1, .. }));
    }

    #[test]
    fn test_record_serializes_plain_date() {
        let record = NewExpense::new(date("2024-02-01"), "Food", Money::from_cents(3000), "Dinner").into_record(3);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["date"], "2024-02-01");
        assert_eq!(json["amount"], 3000);

        let back: ExpenseRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
