//! Table configuration.
//!
//! The table name and the names of its two local secondary indexes come
//! from the environment. The ledger passes them to the storage backend
//! without interpreting them.

use crate::error::{LedgerError, Result};
use crate::models::KeyAttribute;

/// Environment variable naming the table.
pub const TABLE_ENV: &str = "BUDGET_TABLE";

/// Environment variable naming the index over `tk`.
pub const TYPE_INDEX_ENV: &str = "LSI_1";

/// Environment variable naming the index over `qk`.
pub const QUERY_INDEX_ENV: &str = "LSI_2";

/// Table name used when [`TABLE_ENV`] is unset.
pub const DEFAULT_TABLE_NAME: &str = "BudgetTable";

/// Type index name used when [`TYPE_INDEX_ENV`] is unset.
pub const DEFAULT_TYPE_INDEX_NAME: &str = "BudgetTable-LSI1";

/// Query index name used when [`QUERY_INDEX_ENV`] is unset.
pub const DEFAULT_QUERY_INDEX_NAME: &str = "BudgetTable-LSI2";

/// Names of the ledger table and its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Table name.
    pub table_name: String,
    /// Index whose sort key is `tk` (`category||TYPE||month`).
    pub type_index_name: String,
    /// Index whose sort key is `qk` (`TYPE||month`).
    pub query_index_name: String,
}

impl Default for TableConfig {
    #[inline]
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_owned(),
            type_index_name: DEFAULT_TYPE_INDEX_NAME.to_owned(),
            query_index_name: DEFAULT_QUERY_INDEX_NAME.to_owned(),
        }
    }
}

impl TableConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`TableConfig::from_lookup`].
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, falling back to the
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if a variable is set but blank, or if
    /// both indexes resolve to the same name.
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |key: &str, default: &str| match lookup(key) {
            None => Ok(default.to_owned()),
            Some(value) if value.trim().is_empty() => Err(LedgerError::Config(format!(
                "{key} is set but empty"
            ))),
            Some(value) => Ok(value),
        };
        let config = Self {
            table_name: resolve(TABLE_ENV, DEFAULT_TABLE_NAME)?,
            type_index_name: resolve(TYPE_INDEX_ENV, DEFAULT_TYPE_INDEX_NAME)?,
            query_index_name: resolve(QUERY_INDEX_ENV, DEFAULT_QUERY_INDEX_NAME)?,
        };
        config.validate()?;
        tracing::debug!(
            table = %config.table_name,
            type_index = %config.type_index_name,
            query_index = %config.query_index_name,
            "resolved table configuration"
        );
        Ok(config)
    }

    /// Checks that the two index names are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if they are equal.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.type_index_name == self.query_index_name {
            return Err(LedgerError::Config(format!(
                "type and query indexes share the name {:?}",
                self.type_index_name
            )));
        }
        Ok(())
    }

    /// Returns the index that serves prefix queries on `attribute`, or
    /// `None` for the table's own sort key.
    #[inline]
    #[must_use]
    pub fn index_for(&self, attribute: KeyAttribute) -> Option<&str> {
        match attribute {
            KeyAttribute::SortKey => None,
            KeyAttribute::TypeIndexKey => Some(&self.type_index_name),
            KeyAttribute::QueryIndexKey => Some(&self.query_index_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = TableConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, TableConfig::default());
        assert_eq!(config.table_name, "BudgetTable");
    }

    #[test]
    fn reads_all_variables() {
        let config = TableConfig::from_lookup(lookup_from(&[
            ("BUDGET_TABLE", "Ledger-prod"),
            ("LSI_1", "Ledger-prod-tk"),
            ("LSI_2", "Ledger-prod-qk"),
        ]))
        .unwrap();
        assert_eq!(config.table_name, "Ledger-prod");
        assert_eq!(config.type_index_name, "Ledger-prod-tk");
        assert_eq!(config.query_index_name, "Ledger-prod-qk");
    }

    #[test]
    fn blank_variable_is_rejected() {
        let err = TableConfig::from_lookup(lookup_from(&[("LSI_2", "  ")])).unwrap_err();
        assert!(matches!(err, LedgerError::Config(ref msg) if msg.contains("LSI_2")));
    }

    #[test]
    fn shared_index_name_is_rejected() {
        let err = TableConfig::from_lookup(lookup_from(&[("LSI_1", "idx"), ("LSI_2", "idx")]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn index_for_each_attribute() {
        let config = TableConfig::default();
        assert_eq!(config.index_for(KeyAttribute::SortKey), None);
        assert_eq!(
            config.index_for(KeyAttribute::TypeIndexKey),
            Some("BudgetTable-LSI1")
        );
        assert_eq!(
            config.index_for(KeyAttribute::QueryIndexKey),
            Some("BudgetTable-LSI2")
        );
    }
}
