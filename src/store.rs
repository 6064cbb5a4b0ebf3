// Store handles - the single source of truth for expense records
//
// Callers receive a store by reference instead of reaching for a global
// connection. SqliteStore opens a connection per operation; MemoryStore backs
// unit tests and the API tests.

use crate::db::{self, ExpenseRecord, NewExpense};
use crate::error::{Result, TrackerError};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// Append-only expense storage: create and read-all, nothing else
pub trait ExpenseStore: Send + Sync {
    /// Create the backing table if absent. Safe to call on every startup.
    fn ensure_schema(&self) -> Result<()>;

    /// Persist one expense immediately and return its id.
    ///
    /// Never retry a failed `add`: a write that reached disk before the
    /// error surfaced would be duplicated.
    fn add(&self, expense: &NewExpense) -> Result<i64>;

    /// Snapshot of every record, in insertion order.
    fn all_records(&self) -> Result<Vec<ExpenseRecord>>;

    fn count(&self) -> Result<i64> {
        Ok(self.all_records()?.len() as i64)
    }
}

/// SQLite-backed store at a file path
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteStore { path: path.into() }
    }

    /// Open the database and make sure the table exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = SqliteStore::new(path);
        store.ensure_schema()?;
        Ok(store)
    }

    // The connection is dropped when the caller's scope ends, including on `?`
    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

impl ExpenseStore for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| TrackerError::StorageUnavailable {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = self.connect()?;
        db::setup_database(&conn)?;
        tracing::info!(path = %self.path.display(), "expense table ready");
        Ok(())
    }

    fn add(&self, expense: &NewExpense) -> Result<i64> {
        let conn = self.connect()?;
        let id = db::insert_expense(&conn, expense)?;
        tracing::info!(
            id,
            date = %expense.date,
            category = %expense.category,
            amount = %expense.amount,
            "expense recorded"
        );
        Ok(id)
    }

    fn all_records(&self) -> Result<Vec<ExpenseRecord>> {
        let conn = self.connect()?;
        let records = db::get_all_expenses(&conn)?;
        tracing::debug!(count = records.len(), "loaded expenses");
        Ok(records)
    }

    fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        db::verify_count(&conn)
    }
}

/// In-memory store with the same id semantics as SQLite's AUTOINCREMENT
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ExpenseRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ExpenseRecord>> {
        // A panic while holding the lock cannot leave a half-written record
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExpenseStore for MemoryStore {
    fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn add(&self, expense: &NewExpense) -> Result<i64> {
        let mut records = self.lock();
        let id = records.last().map(|r| r.id + 1).unwrap_or(1);
        records.push(expense.clone().into_record(id));
        Ok(id)
    }

    fn all_records(&self) -> Result<Vec<ExpenseRecord>> {
        Ok(self.lock().clone())
    }
}

/// Test double whose writes always fail, and optionally its reads too
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingStore {
    pub fail_reads: bool,
}

#[cfg(test)]
impl FailingStore {
    fn error() -> TrackerError {
        TrackerError::Persistence(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
            Some("attempt to write a readonly database".to_string()),
        ))
    }
}

#[cfg(test)]
impl ExpenseStore for FailingStore {
    fn ensure_schema(&self) -> Result<()> {
        Err(Self::error())
    }

    fn add(&self, _expense: &NewExpense) -> Result<i64> {
        Err(Self::error())
    }

    fn all_records(&self) -> Result<Vec<ExpenseRecord>> {
        if self.fail_reads {
            Err(Self::error())
        } else {
            Ok(Vec::new())
        }
    }
}
