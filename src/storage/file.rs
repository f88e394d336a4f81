//! JSON-file-based table backend.
//!
//! Stores every row of a table in one JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/budget-ledger/`).

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::rows::{self, RowSet};
use super::{QueryOutput, QueryRequest, WriteOutput};
use crate::config::TableConfig;
use crate::error::{LedgerError, Result};
use crate::models::{LedgerRow, RowUpdate};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "budget-ledger";

/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed table that persists rows as a JSON array.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock` (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]).
///
/// Queries acquire a shared lock (allowing concurrent readers), while
/// puts, updates and deletes acquire an exclusive lock for the whole
/// read-modify-write cycle.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock          (cross-process lock sentinel)
///   <table_name>.json     (all rows, ordered by pk then sk)
/// ```
#[derive(Debug)]
pub struct FileTable {
    /// Root directory containing the table file.
    dir: PathBuf,
    /// Table and index names.
    config: TableConfig,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileTable {
    /// Opens the table stored under the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist, along
    /// with the `storage.lock` sentinel. The table file itself is created
    /// on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf, config: TableConfig) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), table = %config.table_name, "opened file table");
        Ok(Self {
            dir,
            config,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/budget-ledger/` (typically
    /// `~/.local/share/budget-ledger/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                LedgerError::Storage("could not determine platform data directory".into())
            })
    }

    /// Returns every stored row in primary key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the table file cannot be read or parsed.
    #[inline]
    pub fn rows(&self) -> Result<Vec<LedgerRow>> {
        self.with_shared_lock(|| Ok(self.read_rows()?.to_rows()))
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the path of the table file.
    fn table_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.config.table_name))
    }

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // The operation's own error wins over a failed unlock.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads the table file. A missing file is an empty table.
    fn read_rows(&self) -> Result<RowSet> {
        match fs::read_to_string(self.table_path()) {
            Ok(contents) => {
                let stored: Vec<LedgerRow> = serde_json::from_str(&contents)?;
                Ok(RowSet::from_rows(stored))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(RowSet::default()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes the table file (write-to-tmp then rename).
    fn write_rows(&self, set: &RowSet) -> Result<()> {
        let path = self.table_path();
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&set.to_rows())?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        Ok(())
    }

    /// Runs a read-modify-write cycle under the exclusive lock.
    fn modify<R, F: FnOnce(&mut RowSet) -> Result<R>>(&self, op: F) -> Result<R> {
        self.with_exclusive_lock(|| {
            let mut set = self.read_rows()?;
            let result = op(&mut set)?;
            self.write_rows(&set)?;
            Ok(result)
        })
    }

    /// Wraps a successful write with its capacity.
    fn write_output(&self, attributes: Option<RowUpdate>) -> WriteOutput {
        WriteOutput {
            attributes,
            consumed_capacity: rows::write_capacity(&self.config),
        }
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`LedgerError::Storage`].
fn storage_io_error(err: std::io::Error) -> LedgerError {
    LedgerError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`LedgerError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

// ── Table implementation ────────────────────────────────────────────────

impl super::Table for FileTable {
    #[inline]
    fn put(&self, row: LedgerRow) -> Result<WriteOutput> {
        self.modify(|set| {
            set.put(row);
            Ok(())
        })?;
        Ok(self.write_output(None))
    }

    #[inline]
    fn update(&self, partition: &str, sort_key: &str, update: RowUpdate) -> Result<WriteOutput> {
        let attributes = self.modify(|set| set.update(partition, sort_key, update))?;
        Ok(self.write_output(Some(attributes)))
    }

    #[inline]
    fn delete(&self, partition: &str, sort_key: &str) -> Result<WriteOutput> {
        self.modify(|set| {
            set.delete(partition, sort_key);
            Ok(())
        })?;
        Ok(self.write_output(None))
    }

    #[inline]
    fn query(&self, request: &QueryRequest) -> Result<QueryOutput<LedgerRow>> {
        let items = self.with_shared_lock(|| self.read_rows()?.query(&self.config, request))?;
        Ok(QueryOutput {
            count: items.len(),
            consumed_capacity: rows::read_capacity(&self.config, items.len()),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decimal, KeyAttribute};
    use crate::storage::Table;

    /// Helper to create a [`FileTable`] in a temporary directory.
    fn temp_table() -> (FileTable, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let table = FileTable::new(dir.path().to_path_buf(), TableConfig::default()).unwrap();
        (table, dir)
    }

    /// Creates a minimal test row.
    fn test_row(sk: &str, description: &str) -> LedgerRow {
        LedgerRow {
            pk: "acct1".to_owned(),
            sk: sk.to_owned(),
            tk: "Food||SPEND||2024-01".to_owned(),
            qk: "SPEND||2024-01".to_owned(),
            amount: Decimal::new(2394, 2).into(),
            description: description.to_owned(),
            date: "2024-01-15T00:00:00".to_owned(),
        }
    }

    #[test]
    fn lockfile_created_on_construction() {
        let (table, dir) = temp_table();
        assert!(dir.path().join(LOCK_FILE).exists());
        assert!(!table.table_path().exists());
    }

    #[test]
    fn empty_table_has_no_rows() {
        let (table, _dir) = temp_table();
        assert!(table.rows().unwrap().is_empty());
        let request = QueryRequest::new("acct1".to_owned(), KeyAttribute::SortKey, String::new());
        let output = table.query(&request).unwrap();
        assert_eq!(output.count, 0);
    }

    #[test]
    fn put_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let table = FileTable::new(dir.path().to_path_buf(), TableConfig::default()).unwrap();
            let _put = table
                .put(test_row("Food||2024-01||SPEND||00000001", "Groceries"))
                .unwrap();
        }
        let reopened = FileTable::new(dir.path().to_path_buf(), TableConfig::default()).unwrap();
        let rows = reopened.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Groceries");
        assert_eq!(rows[0].amount, Decimal::new(2394, 2));
    }

    #[test]
    fn amount_is_stored_as_string() {
        let (table, _dir) = temp_table();
        let _put = table
            .put(test_row("Food||2024-01||SPEND||00000001", "Groceries"))
            .unwrap();
        let contents = fs::read_to_string(table.table_path()).unwrap();
        assert!(contents.contains("\"amount\": \"23.94\""));
    }

    #[test]
    fn update_and_delete() {
        let (table, _dir) = temp_table();
        let row = test_row("Food||2024-01||SPEND||00000001", "Groceries");
        let _put = table.put(row.clone()).unwrap();

        let mut update = row.to_update();
        update.description = "Market".to_owned();
        let output = table.update(&row.pk, &row.sk, update).unwrap();
        assert_eq!(
            output.attributes.map(|attrs| attrs.description),
            Some("Market".to_owned())
        );

        let _deleted = table.delete(&row.pk, &row.sk).unwrap();
        assert!(table.rows().unwrap().is_empty());
    }

    #[test]
    fn update_missing_row_leaves_file_untouched() {
        let (table, _dir) = temp_table();
        let row = test_row("Food||2024-01||SPEND||00000001", "Groceries");
        let err = table.update(&row.pk, &row.sk, row.to_update()).unwrap_err();
        assert!(matches!(err, LedgerError::RowNotFound { .. }));
        assert!(!table.table_path().exists());
    }

    #[test]
    fn file_is_named_after_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = TableConfig {
            table_name: "Household".to_owned(),
            ..TableConfig::default()
        };
        let table = FileTable::new(dir.path().to_path_buf(), config).unwrap();
        let _put = table
            .put(test_row("Food||2024-01||SPEND||00000001", "Groceries"))
            .unwrap();
        assert!(dir.path().join("Household.json").exists());
    }

    #[test]
    fn default_dir_returns_path() {
        let dir = FileTable::default_dir();
        assert!(dir.is_ok());
    }

    #[test]
    fn bad_stored_amount_only_affects_its_row() {
        use crate::ledger_table::LedgerTable;
        use crate::models::{AccountId, Ledger, NaiveDate, TransactionType};

        let (table, _dir) = temp_table();
        let path = table.table_path();
        let ledger_table = LedgerTable::builder().table(table).build().unwrap();
        let account = AccountId::from("acct1");
        let date = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let seeded = [
            ("Food", Decimal::new(1250, 2)),
            ("Rent", Decimal::new(95000, 2)),
        ];
        for (category, amount) in seeded {
            let mut entry = Ledger::new(
                account.clone(),
                category.to_owned(),
                TransactionType::Spend,
                "2024-01".to_owned(),
                amount,
                String::new(),
                date,
            );
            let _saved = ledger_table.save(&mut entry).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"12.50\""));
        fs::write(&path, contents.replace("\"12.50\"", "\"abc\"")).unwrap();

        let rent = ledger_table.by_category(&account, "Rent").unwrap();
        assert_eq!(rent.count, 1);
        assert_eq!(rent.items[0].amount(), Decimal::new(95000, 2));
        let err = ledger_table.by_category(&account, "Food").unwrap_err();
        assert!(
            matches!(err, LedgerError::CorruptRecord { ref reason, .. } if reason.contains("abc"))
        );

        // Writes still go through and keep the bad row as stored.
        let mut fun = Ledger::new(
            account,
            "Fun".to_owned(),
            TransactionType::Spend,
            "2024-01".to_owned(),
            Decimal::new(500, 2),
            String::new(),
            date,
        );
        let _saved = ledger_table.save(&mut fun).unwrap();
        assert_eq!(ledger_table.table().rows().unwrap().len(), 3);
        assert!(fs::read_to_string(&path).unwrap().contains("\"abc\""));
    }

    #[test]
    fn concurrent_puts_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let (table, _dir) = temp_table();
        let table = Arc::new(table);
        let num_threads: usize = 8;
        let rows_per_thread: usize = 20;

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_idx| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for row_idx in 0..rows_per_thread {
                        let sk = format!("Food||2024-01||SPEND||{thread_idx:04x}{row_idx:04x}");
                        let _put = table.put(test_row(&sk, "Lunch")).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.rows().unwrap().len(), num_threads * rows_per_thread);
    }
}
