//! Pluggable table backends for persisting ledger rows.
//!
//! This module defines the [`Table`] trait: the single-table contract the
//! ledger needs (point put, partial update, point delete and prefix
//! queries over the sort key or one of two secondary index keys), plus the
//! request and response types that travel across it.

#[cfg(feature = "storage-file")]
mod file;
mod memory;
mod rows;

#[cfg(feature = "storage-file")]
pub use file::FileTable;
pub use memory::InMemoryTable;

use crate::error::Result;
use crate::models::{KeyAttribute, LedgerRow, RowUpdate};

/// Capacity a single backend call consumed, reported per table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedCapacity {
    /// Table the capacity was charged to.
    pub table_name: String,
    /// Units consumed by the call.
    pub capacity_units: f64,
}

/// Result of a put, update or delete.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutput {
    /// Attribute values after an update; `None` for puts and deletes.
    pub attributes: Option<RowUpdate>,
    /// Capacity charged for the write.
    pub consumed_capacity: ConsumedCapacity,
}

/// A prefix query within one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Partition key value (the account).
    pub partition: String,
    /// Key attribute matched against `prefix`.
    pub attribute: KeyAttribute,
    /// Required prefix of the attribute value.
    pub prefix: String,
    /// Secondary index to read through; `None` reads the table itself.
    pub index_name: Option<String>,
}

impl QueryRequest {
    /// Creates a query against the table itself.
    #[inline]
    #[must_use]
    pub const fn new(partition: String, attribute: KeyAttribute, prefix: String) -> Self {
        Self {
            partition,
            attribute,
            prefix,
            index_name: None,
        }
    }

    /// Reads through the named secondary index.
    #[inline]
    #[must_use]
    pub fn index<T: Into<String>>(mut self, index_name: T) -> Self {
        self.index_name = Some(index_name.into());
        self
    }
}

/// Items returned by a query, with the backend's accounting attached.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput<T> {
    /// Matching items, ordered by the probed key attribute.
    pub items: Vec<T>,
    /// Number of matching items.
    pub count: usize,
    /// Capacity charged for the query.
    pub consumed_capacity: ConsumedCapacity,
}

impl<T> QueryOutput<T> {
    /// Converts every item, keeping the accounting unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `convert`.
    #[inline]
    pub fn try_map<U, F>(self, convert: F) -> Result<QueryOutput<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        let items = self
            .items
            .into_iter()
            .map(convert)
            .collect::<Result<Vec<U>>>()?;
        Ok(QueryOutput {
            items,
            count: self.count,
            consumed_capacity: self.consumed_capacity,
        })
    }
}

/// Blocking single-table backend for ledger rows.
///
/// All methods take `&self`; implementations should use interior
/// mutability (e.g. `Mutex`) for thread-safe mutation.
pub trait Table: core::fmt::Debug + Send + Sync {
    /// Inserts `row`, replacing any row with the same (`pk`, `sk`).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn put(&self, row: LedgerRow) -> Result<WriteOutput>;

    /// Overwrites the non-key attributes of the row at
    /// (`partition`, `sort_key`) and returns their new values.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LedgerError::RowNotFound`] if no such row
    /// exists, or an error if the storage backend fails to write.
    fn update(&self, partition: &str, sort_key: &str, update: RowUpdate) -> Result<WriteOutput>;

    /// Removes the row at (`partition`, `sort_key`). Removing a missing row
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn delete(&self, partition: &str, sort_key: &str) -> Result<WriteOutput>;

    /// Returns every row in the partition whose probed attribute starts
    /// with the request prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the index does not cover the probed attribute
    /// or the storage backend fails to read.
    fn query(&self, request: &QueryRequest) -> Result<QueryOutput<LedgerRow>>;
}
