//! In-memory table backend for testing.
//!
//! Provides [`InMemoryTable`], a thread-safe in-memory implementation of
//! [`super::Table`]. Ideal for unit and integration tests where file I/O is
//! undesirable.

use std::sync::Mutex;

use super::rows::{self, RowSet};
use super::{QueryOutput, QueryRequest, WriteOutput};
use crate::config::TableConfig;
use crate::error::{LedgerError, Result};
use crate::models::{LedgerRow, RowUpdate};

/// Thread-safe in-memory table.
///
/// Rows are keyed by (`pk`, `sk`). Queries honour the index names of the
/// [`TableConfig`] the table was created with, and charge the same
/// capacity as [`super::FileTable`].
///
/// # Example
///
/// ```rust
/// use budget_ledger::config::TableConfig;
/// use budget_ledger::storage::InMemoryTable;
///
/// let table = InMemoryTable::new(TableConfig::default());
/// assert!(table.rows().unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTable {
    /// Table and index names.
    config: TableConfig,
    /// All rows behind a single mutex for thread-safe interior mutability.
    inner: Mutex<RowSet>,
}

impl InMemoryTable {
    /// Creates a new empty table.
    #[inline]
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(RowSet::default()),
        }
    }

    /// Returns a snapshot of every row in primary key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    #[inline]
    pub fn rows(&self) -> Result<Vec<LedgerRow>> {
        self.with_lock(|set| set.to_rows())
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R, F: FnOnce(&mut RowSet) -> R>(&self, op: F) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(op(&mut inner))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

impl super::Table for InMemoryTable {
    #[inline]
    fn put(&self, row: LedgerRow) -> Result<WriteOutput> {
        self.with_lock(|set| set.put(row))?;
        Ok(WriteOutput {
            attributes: None,
            consumed_capacity: rows::write_capacity(&self.config),
        })
    }

    #[inline]
    fn update(&self, partition: &str, sort_key: &str, update: RowUpdate) -> Result<WriteOutput> {
        let attributes = self.with_lock(|set| set.update(partition, sort_key, update))??;
        Ok(WriteOutput {
            attributes: Some(attributes),
            consumed_capacity: rows::write_capacity(&self.config),
        })
    }

    #[inline]
    fn delete(&self, partition: &str, sort_key: &str) -> Result<WriteOutput> {
        self.with_lock(|set| set.delete(partition, sort_key))?;
        Ok(WriteOutput {
            attributes: None,
            consumed_capacity: rows::write_capacity(&self.config),
        })
    }

    #[inline]
    fn query(&self, request: &QueryRequest) -> Result<QueryOutput<LedgerRow>> {
        let items = self.with_lock(|set| set.query(&self.config, request))??;
        Ok(QueryOutput {
            count: items.len(),
            consumed_capacity: rows::read_capacity(&self.config, items.len()),
            items,
        })
    }
}
