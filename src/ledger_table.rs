//! Data access for ledger entries.
//!
//! [`LedgerTable`] combines a [`Table`] backend with the [`TableConfig`]
//! index names to provide the save protocol and the five key-prefix
//! queries. [`LedgerQuery`] picks the right query from whichever fields a
//! caller supplied.

use crate::config::TableConfig;
use crate::error::{LedgerError, Result};
use crate::models::{AccountId, KEY_SEPARATOR, KeyAttribute, Ledger, TransactionType};
use crate::storage::{QueryOutput, QueryRequest, Table, WriteOutput};

/// One of the five supported ledger queries.
///
/// # Examples
///
/// ```
/// use budget_ledger::ledger_table::LedgerQuery;
/// use budget_ledger::models::{KeyAttribute, TransactionType};
///
/// let query = LedgerQuery::from_fields(
///     Some("Food".to_owned()),
///     Some("2024-01".to_owned()),
///     Some(TransactionType::Spend),
/// )
/// .unwrap();
/// assert_eq!(
///     query.probe(),
///     (KeyAttribute::SortKey, "Food||2024-01||SPEND||".to_owned())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerQuery {
    /// Every entry in a category.
    ByCategory {
        /// Category to match.
        category: String,
    },
    /// Entries in a category for one month.
    ByCategoryMonth {
        /// Category to match.
        category: String,
        /// `YYYY-MM` month to match.
        month: String,
    },
    /// Entries in a category of one transaction type, across months.
    ByCategoryTransactionType {
        /// Category to match.
        category: String,
        /// Transaction type to match.
        transaction_type: TransactionType,
    },
    /// Entries in a category for one month and transaction type.
    ByCategoryMonthTransactionType {
        /// Category to match.
        category: String,
        /// `YYYY-MM` month to match.
        month: String,
        /// Transaction type to match.
        transaction_type: TransactionType,
    },
    /// Every entry of one transaction type, across categories and months.
    ByTransactionType {
        /// Transaction type to match.
        transaction_type: TransactionType,
    },
}

impl LedgerQuery {
    /// Picks the query matching the supplied fields. Empty strings count
    /// as absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedQuery`] for a month without a
    /// category, or when no field is supplied.
    #[inline]
    pub fn from_fields(
        category: Option<String>,
        month: Option<String>,
        transaction_type: Option<TransactionType>,
    ) -> Result<Self> {
        let category = category.filter(|value| !value.is_empty());
        let month = month.filter(|value| !value.is_empty());
        match (category, month, transaction_type) {
            (Some(category), None, None) => Ok(Self::ByCategory { category }),
            (Some(category), Some(month), None) => Ok(Self::ByCategoryMonth { category, month }),
            (Some(category), None, Some(transaction_type)) => Ok(Self::ByCategoryTransactionType {
                category,
                transaction_type,
            }),
            (Some(category), Some(month), Some(transaction_type)) => {
                Ok(Self::ByCategoryMonthTransactionType {
                    category,
                    month,
                    transaction_type,
                })
            }
            (None, None, Some(transaction_type)) => Ok(Self::ByTransactionType { transaction_type }),
            (None, Some(month), _) => Err(LedgerError::UnsupportedQuery(format!(
                "month {month:?} requires a category"
            ))),
            (None, None, None) => Err(LedgerError::UnsupportedQuery(
                "at least a category or a transaction type is required".to_owned(),
            )),
        }
    }

    /// Key attribute probed by the query and the prefix it must start with.
    #[inline]
    #[must_use]
    pub fn probe(&self) -> (KeyAttribute, String) {
        let sep = KEY_SEPARATOR;
        match self {
            Self::ByCategory { category } => (KeyAttribute::SortKey, format!("{category}{sep}")),
            Self::ByCategoryMonth { category, month } => {
                (KeyAttribute::SortKey, format!("{category}{sep}{month}"))
            }
            Self::ByCategoryTransactionType {
                category,
                transaction_type,
            } => (
                KeyAttribute::TypeIndexKey,
                format!("{category}{sep}{transaction_type}{sep}"),
            ),
            Self::ByCategoryMonthTransactionType {
                category,
                month,
                transaction_type,
            } => (
                KeyAttribute::SortKey,
                format!("{category}{sep}{month}{sep}{transaction_type}{sep}"),
            ),
            Self::ByTransactionType { transaction_type } => (
                KeyAttribute::QueryIndexKey,
                format!("{transaction_type}{sep}"),
            ),
        }
    }
}

/// Which write a [`LedgerTable::save`] ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    /// A full row was put.
    Inserted,
    /// The non-key attributes of the existing row were updated.
    Updated,
}

/// Outcome of a [`LedgerTable::save`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutput {
    /// Final write performed.
    pub action: SaveAction,
    /// Sort key whose row was deleted because the entry's key changed.
    pub replaced_sort_key: Option<String>,
    /// Backend output of the final write.
    pub write: WriteOutput,
}

/// Builder for [`LedgerTable`].
#[derive(Debug)]
pub struct LedgerTableBuilder<T: Table> {
    /// Storage backend.
    table: Option<T>,
    /// Table and index names.
    config: Option<TableConfig>,
}

impl<T: Table> LedgerTableBuilder<T> {
    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn table(mut self, table: T) -> Self {
        self.table = Some(table);
        self
    }

    /// Sets the table configuration. Defaults to [`TableConfig::default`].
    #[inline]
    #[must_use]
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the ledger table.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if no backend was provided or the
    /// configuration is invalid.
    #[inline]
    pub fn build(self) -> Result<LedgerTable<T>> {
        let table = self
            .table
            .ok_or_else(|| LedgerError::Config("table backend is required".to_owned()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(LedgerTable { table, config })
    }
}

/// Saves and queries ledger entries on a [`Table`] backend.
///
/// # Examples
///
/// ```
/// use budget_ledger::ledger_table::{LedgerTable, SaveAction};
/// use budget_ledger::models::{AccountId, Decimal, Ledger, NaiveDate, TransactionType};
/// use budget_ledger::storage::InMemoryTable;
///
/// let ledger_table = LedgerTable::builder()
///     .table(InMemoryTable::default())
///     .build()
///     .unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15)
///     .unwrap()
///     .and_hms_opt(12, 30, 0)
///     .unwrap();
/// let mut lunch = Ledger::new(
///     AccountId::from("acct1"),
///     "Food".to_owned(),
///     TransactionType::Spend,
///     "2024-01".to_owned(),
///     Decimal::new(1250, 2),
///     "Lunch".to_owned(),
///     date,
/// );
/// let saved = ledger_table.save(&mut lunch).unwrap();
/// assert_eq!(saved.action, SaveAction::Inserted);
///
/// let found = ledger_table
///     .by_category(&AccountId::from("acct1"), "Food")
///     .unwrap();
/// assert_eq!(found.count, 1);
/// ```
#[derive(Debug)]
pub struct LedgerTable<T: Table> {
    /// Storage backend.
    table: T,
    /// Table and index names.
    config: TableConfig,
}

impl<T: Table> LedgerTable<T> {
    /// Creates a new builder.
    #[inline]
    #[must_use]
    pub const fn builder() -> LedgerTableBuilder<T> {
        LedgerTableBuilder {
            table: None,
            config: None,
        }
    }

    /// Returns the storage backend.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &T {
        &self.table
    }

    /// Returns the table configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Persists an entry.
    ///
    /// When the entry's sort key differs from the one it was loaded under,
    /// the old row is deleted first and the entry is then inserted afresh.
    /// An existing entry gets a partial update of its non-key attributes;
    /// a new one gets a full put. The entry's state only changes after the
    /// corresponding backend call succeeded.
    ///
    /// # Errors
    ///
    /// Returns the backend's error. A failed delete aborts before any
    /// write under the new key.
    #[tracing::instrument(skip_all, fields(account = %ledger.account(), sort_key = %ledger.sort_key()))]
    pub fn save(&self, ledger: &mut Ledger) -> Result<SaveOutput> {
        let replaced_sort_key = if ledger.key_changed() {
            ledger.prior_sort_key().map(str::to_owned)
        } else {
            None
        };
        if let Some(prior) = &replaced_sort_key {
            tracing::debug!(prior_sort_key = %prior, "sort key changed, deleting prior row");
            let _deleted = self.table.delete(ledger.primary_key(), prior)?;
            ledger.mark_replaced();
        }

        if ledger.is_existing() {
            tracing::debug!("updating existing row");
            let write =
                self.table
                    .update(ledger.primary_key(), &ledger.sort_key(), ledger.to_update())?;
            return Ok(SaveOutput {
                action: SaveAction::Updated,
                replaced_sort_key,
                write,
            });
        }

        tracing::debug!("inserting new row");
        let write = self.table.put(ledger.to_row())?;
        ledger.mark_inserted();
        Ok(SaveOutput {
            action: SaveAction::Inserted,
            replaced_sort_key,
            write,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Every entry of the account in `category`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[inline]
    pub fn by_category(&self, account: &AccountId, category: &str) -> Result<QueryOutput<Ledger>> {
        self.query(
            account,
            &LedgerQuery::ByCategory {
                category: category.to_owned(),
            },
        )
    }

    /// Entries of the account in `category` for `month`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[inline]
    pub fn by_category_month(
        &self,
        account: &AccountId,
        category: &str,
        month: &str,
    ) -> Result<QueryOutput<Ledger>> {
        self.query(
            account,
            &LedgerQuery::ByCategoryMonth {
                category: category.to_owned(),
                month: month.to_owned(),
            },
        )
    }

    /// Entries of the account in `category` of `transaction_type`, read
    /// through the type index.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[inline]
    pub fn by_category_transaction_type(
        &self,
        account: &AccountId,
        category: &str,
        transaction_type: TransactionType,
    ) -> Result<QueryOutput<Ledger>> {
        self.query(
            account,
            &LedgerQuery::ByCategoryTransactionType {
                category: category.to_owned(),
                transaction_type,
            },
        )
    }

    /// Entries of the account in `category` for `month` of
    /// `transaction_type`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[inline]
    pub fn by_category_month_transaction_type(
        &self,
        account: &AccountId,
        category: &str,
        month: &str,
        transaction_type: TransactionType,
    ) -> Result<QueryOutput<Ledger>> {
        self.query(
            account,
            &LedgerQuery::ByCategoryMonthTransactionType {
                category: category.to_owned(),
                month: month.to_owned(),
                transaction_type,
            },
        )
    }

    /// Every entry of the account of `transaction_type`, read through the
    /// query index.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[inline]
    pub fn by_transaction_type(
        &self,
        account: &AccountId,
        transaction_type: TransactionType,
    ) -> Result<QueryOutput<Ledger>> {
        self.query(account, &LedgerQuery::ByTransactionType { transaction_type })
    }

    /// Runs any [`LedgerQuery`] against the account's partition.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a decoding error for a corrupt row.
    #[tracing::instrument(skip_all, fields(account = %account))]
    pub fn query(&self, account: &AccountId, query: &LedgerQuery) -> Result<QueryOutput<Ledger>> {
        let (attribute, prefix) = query.probe();
        let mut request = QueryRequest::new(account.as_inner().to_owned(), attribute, prefix);
        if let Some(index) = self.config.index_for(attribute) {
            request = request.index(index);
        }
        tracing::debug!(
            attribute = %request.attribute,
            prefix = %request.prefix,
            index = request.index_name.as_deref().unwrap_or("<table>"),
            "querying ledger"
        );
        let output = self.table.query(&request)?;
        tracing::debug!(count = output.count, "query returned");
        output.try_map(Ledger::from_row)
    }
}
