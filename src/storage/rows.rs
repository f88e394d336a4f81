//! Row bookkeeping shared by the bundled backends.

use std::collections::BTreeMap;

use super::{ConsumedCapacity, QueryRequest};
use crate::config::TableConfig;
use crate::error::{LedgerError, Result};
use crate::models::{LedgerRow, RowUpdate};

/// Capacity units charged per write.
const WRITE_UNITS: f64 = 1.0;

/// Capacity units charged per row read; a query is charged for at least
/// one row.
const READ_UNITS_PER_ROW: f64 = 0.5;

/// Rows keyed by (`pk`, `sk`).
#[derive(Debug, Default)]
pub(super) struct RowSet {
    /// Rows in primary key order.
    rows: BTreeMap<(String, String), LedgerRow>,
}

impl RowSet {
    /// Builds a set from stored rows; later duplicates win.
    pub(super) fn from_rows(rows: Vec<LedgerRow>) -> Self {
        let mut set = Self::default();
        for row in rows {
            set.put(row);
        }
        set
    }

    /// Returns every row in primary key order.
    pub(super) fn to_rows(&self) -> Vec<LedgerRow> {
        self.rows.values().cloned().collect()
    }

    /// Inserts or replaces a row.
    pub(super) fn put(&mut self, row: LedgerRow) {
        let _replaced = self.rows.insert((row.pk.clone(), row.sk.clone()), row);
    }

    /// Overwrites the non-key attributes of an existing row.
    pub(super) fn update(
        &mut self,
        partition: &str,
        sort_key: &str,
        update: RowUpdate,
    ) -> Result<RowUpdate> {
        let row = self
            .rows
            .get_mut(&(partition.to_owned(), sort_key.to_owned()))
            .ok_or_else(|| LedgerError::RowNotFound {
                partition: partition.to_owned(),
                sort_key: sort_key.to_owned(),
            })?;
        row.apply(update);
        Ok(row.to_update())
    }

    /// Removes a row if present.
    pub(super) fn delete(&mut self, partition: &str, sort_key: &str) {
        let _removed = self
            .rows
            .remove(&(partition.to_owned(), sort_key.to_owned()));
    }

    /// Returns the partition's rows whose probed attribute starts with the
    /// prefix, ordered by that attribute.
    pub(super) fn query(&self, config: &TableConfig, request: &QueryRequest) -> Result<Vec<LedgerRow>> {
        check_index(config, request)?;
        let mut matched: Vec<LedgerRow> = self
            .rows
            .values()
            .filter(|row| row.pk == request.partition)
            .filter(|row| row.key(request.attribute).starts_with(&request.prefix))
            .cloned()
            .collect();
        matched.sort_by(|left, right| {
            left.key(request.attribute)
                .cmp(right.key(request.attribute))
        });
        Ok(matched)
    }
}

/// Rejects requests whose index does not cover the probed attribute.
fn check_index(config: &TableConfig, request: &QueryRequest) -> Result<()> {
    let expected = config.index_for(request.attribute);
    if request.index_name.as_deref() == expected {
        return Ok(());
    }
    let requested = index_label(request.index_name.as_deref());
    let message = match expected {
        None => format!("index {requested} does not cover the table sort key"),
        Some(index) => format!(
            "attribute {} is only queryable through index {index}, got {requested}",
            request.attribute
        ),
    };
    Err(LedgerError::Storage(message.into()))
}

/// Display form of an optional index name.
fn index_label(index: Option<&str>) -> &str {
    index.unwrap_or("<table>")
}

/// Capacity charged for one write.
pub(super) fn write_capacity(config: &TableConfig) -> ConsumedCapacity {
    ConsumedCapacity {
        table_name: config.table_name.clone(),
        capacity_units: WRITE_UNITS,
    }
}

/// Capacity charged for a query that read `count` rows.
pub(super) fn read_capacity(config: &TableConfig, count: usize) -> ConsumedCapacity {
    let rows = u32::try_from(count).unwrap_or(u32::MAX).max(1);
    ConsumedCapacity {
        table_name: config.table_name.clone(),
        capacity_units: READ_UNITS_PER_ROW * f64::from(rows),
    }
}
