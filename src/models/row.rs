//! Persisted row representation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::KeyAttribute;

/// A ledger entry as stored in the table: flat attributes keyed by
/// (`pk`, `sk`).
///
/// The amount keeps its native decimal type; date and transaction type are
/// stored as strings (the type only inside the key attributes). Attribute
/// values are not validated here: a stored amount that is not a decimal
/// survives as [`RowAmount::Unparsed`] and is rejected when the row is
/// decoded into a [`super::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Partition key (the account).
    pub pk: String,
    /// Sort key, `category||month||TYPE||uuid`.
    pub sk: String,
    /// Type index key, `category||TYPE||month`.
    pub tk: String,
    /// Query index key, `TYPE||month`.
    pub qk: String,
    /// Exact amount.
    pub amount: RowAmount,
    /// Free-text description.
    pub description: String,
    /// ISO-8601 timestamp.
    pub date: String,
}

impl LedgerRow {
    /// Returns the value of the given key attribute.
    #[inline]
    #[must_use]
    pub fn key(&self, attribute: KeyAttribute) -> &str {
        match attribute {
            KeyAttribute::SortKey => &self.sk,
            KeyAttribute::TypeIndexKey => &self.tk,
            KeyAttribute::QueryIndexKey => &self.qk,
        }
    }

    /// Overwrites every non-key attribute with the values in `update`.
    #[inline]
    pub fn apply(&mut self, update: RowUpdate) {
        self.tk = update.tk;
        self.qk = update.qk;
        self.amount = update.amount;
        self.description = update.description;
        self.date = update.date;
    }

    /// Returns the non-key attributes as a partial update.
    #[inline]
    #[must_use]
    pub fn to_update(&self) -> RowUpdate {
        RowUpdate {
            tk: self.tk.clone(),
            qk: self.qk.clone(),
            amount: self.amount.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
        }
    }
}

/// Every row attribute except the primary key pair, for partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowUpdate {
    /// Type index key.
    pub tk: String,
    /// Query index key.
    pub qk: String,
    /// Exact amount.
    pub amount: RowAmount,
    /// Free-text description.
    pub description: String,
    /// ISO-8601 timestamp.
    pub date: String,
}

/// The amount attribute of a stored row.
///
/// Serializes as the decimal's string form. Any stored value that does not
/// deserialize as a decimal is kept verbatim so one bad row cannot hide the
/// rest of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowAmount {
    /// An exact decimal.
    Decimal(Decimal),
    /// A stored value that is not a decimal.
    Unparsed(serde_json::Value),
}

impl RowAmount {
    /// Returns the decimal, or `None` for an unparsed value.
    #[inline]
    #[must_use]
    pub const fn decimal(&self) -> Option<Decimal> {
        match *self {
            Self::Decimal(amount) => Some(amount),
            Self::Unparsed(_) => None,
        }
    }
}

impl From<Decimal> for RowAmount {
    #[inline]
    fn from(amount: Decimal) -> Self {
        Self::Decimal(amount)
    }
}

impl PartialEq<Decimal> for RowAmount {
    #[inline]
    fn eq(&self, other: &Decimal) -> bool {
        self.decimal().as_ref() == Some(other)
    }
}

impl core::fmt::Display for RowAmount {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decimal(amount) => core::fmt::Display::fmt(amount, f),
            Self::Unparsed(raw) => core::fmt::Display::fmt(raw, f),
        }
    }
}
