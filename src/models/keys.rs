//! Composite key encoding.
//!
//! Every key is a `||`-joined string built from raw entry fields. The
//! functions here are pure; nothing caches their output.

use serde::{Deserialize, Serialize};

use super::{EntryId, TransactionType};
use crate::error::{LedgerError, Result};

/// Separator between composite key components.
pub const KEY_SEPARATOR: &str = "||";

/// A key attribute that queries can probe by prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAttribute {
    /// The table sort key, `category||month||TYPE||uuid`.
    #[serde(rename = "sk")]
    SortKey,
    /// The type index key, `category||TYPE||month`.
    #[serde(rename = "tk")]
    TypeIndexKey,
    /// The query index key, `TYPE||month`.
    #[serde(rename = "qk")]
    QueryIndexKey,
}

impl KeyAttribute {
    /// Returns the row attribute name (`sk`, `tk` or `qk`).
    #[inline]
    #[must_use]
    pub const fn attribute_name(self) -> &'static str {
        match self {
            Self::SortKey => "sk",
            Self::TypeIndexKey => "tk",
            Self::QueryIndexKey => "qk",
        }
    }
}

impl core::fmt::Display for KeyAttribute {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// Builds `category||month||TYPE||uuid`.
#[inline]
#[must_use]
pub fn sort_key(
    category: &str,
    month: &str,
    transaction_type: TransactionType,
    uuid: &EntryId,
) -> String {
    [category, month, transaction_type.name(), uuid.as_inner()].join(KEY_SEPARATOR)
}

/// Builds `category||TYPE||month`.
#[inline]
#[must_use]
pub fn type_index_key(category: &str, transaction_type: TransactionType, month: &str) -> String {
    [category, transaction_type.name(), month].join(KEY_SEPARATOR)
}

/// Builds `TYPE||month`.
#[inline]
#[must_use]
pub fn query_index_key(transaction_type: TransactionType, month: &str) -> String {
    [transaction_type.name(), month].join(KEY_SEPARATOR)
}

/// The four components of a decoded sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyParts {
    /// Category component.
    pub category: String,
    /// `YYYY-MM` component.
    pub month: String,
    /// Transaction type component.
    pub transaction_type: TransactionType,
    /// Disambiguating suffix.
    pub uuid: EntryId,
}

impl SortKeyParts {
    /// Splits a persisted sort key into its components.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptRecord`] if the key does not split into
    /// exactly four parts, and [`LedgerError::UnknownTransactionType`] if the
    /// third part is not a known type name.
    #[inline]
    pub fn parse(sort_key: &str) -> Result<Self> {
        let parts: Vec<&str> = sort_key.split(KEY_SEPARATOR).collect();
        let [category, month, type_name, uuid] = parts.as_slice() else {
            return Err(LedgerError::CorruptRecord {
                sort_key: sort_key.to_owned(),
                reason: format!("expected 4 key parts, found {}", parts.len()),
            });
        };
        Ok(Self {
            category: (*category).to_owned(),
            month: (*month).to_owned(),
            transaction_type: type_name.parse()?,
            uuid: EntryId::from(*uuid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_id() -> EntryId {
        EntryId::from("ab12cd34")
    }

    #[test]
    fn sort_key_layout() {
        let key = sort_key("Food", "2024-01", TransactionType::Spend, &entry_id());
        assert_eq!(key, "Food||2024-01||SPEND||ab12cd34");
    }

    #[test]
    fn type_index_key_layout() {
        assert_eq!(
            type_index_key("Fun Money", TransactionType::Fund, "2019-03"),
            "Fun Money||FUND||2019-03"
        );
    }

    #[test]
    fn query_index_key_layout() {
        assert_eq!(
            query_index_key(TransactionType::Inflow, "2019-03"),
            "INFLOW||2019-03"
        );
    }

    #[test]
    fn parse_sort_key() {
        let parts = SortKeyParts::parse("Fun Money||2019-03||SPEND||a73b2f").unwrap();
        assert_eq!(parts.category, "Fun Money");
        assert_eq!(parts.month, "2019-03");
        assert_eq!(parts.transaction_type, TransactionType::Spend);
        assert_eq!(parts.uuid, EntryId::from("a73b2f"));
    }

    #[test]
    fn parse_inverts_encoding() {
        for transaction_type in TransactionType::ALL {
            let key = sort_key("Rent", "2024-12", transaction_type, &entry_id());
            let parts = SortKeyParts::parse(&key).unwrap();
            assert_eq!(parts.transaction_type, transaction_type);
            assert_eq!(parts.uuid, entry_id());
        }
    }

    #[test]
    fn parse_too_few_parts_is_corrupt() {
        let err = SortKeyParts::parse("Food||2024-01||SPEND").unwrap_err();
        assert!(matches!(err, LedgerError::CorruptRecord { .. }));
    }

    #[test]
    fn parse_too_many_parts_is_corrupt() {
        let err = SortKeyParts::parse("Food||Fun||2024-01||SPEND||ab12cd34").unwrap_err();
        assert!(matches!(err, LedgerError::CorruptRecord { .. }));
    }

    #[test]
    fn parse_unknown_type_fails() {
        let err = SortKeyParts::parse("Food||2024-01||REFUND||ab12cd34").unwrap_err();
        assert!(matches!(err, LedgerError::UnknownTransactionType(_)));
    }

    #[test]
    fn attribute_names() {
        assert_eq!(KeyAttribute::SortKey.attribute_name(), "sk");
        assert_eq!(KeyAttribute::TypeIndexKey.to_string(), "tk");
        assert_eq!(KeyAttribute::QueryIndexKey.attribute_name(), "qk");
    }
}
