//! Enumeration types for constrained ledger values.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Kind of money movement a ledger entry records.
///
/// The upper-case variant name is part of every composite key, so it must
/// stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money leaving a category.
    Spend,
    /// Money allocated into a category.
    Fund,
    /// Money arriving in the account.
    Inflow,
}

impl TransactionType {
    /// All variants, in declaration order.
    pub const ALL: [Self; 3] = [Self::Spend, Self::Fund, Self::Inflow];

    /// Returns the key-encoding name (`SPEND`, `FUND` or `INFLOW`).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spend => "SPEND",
            Self::Fund => "FUND",
            Self::Inflow => "INFLOW",
        }
    }
}

impl fmt::Display for TransactionType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    /// Exact, case-sensitive lookup by key-encoding name.
    #[inline]
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "SPEND" => Ok(Self::Spend),
            "FUND" => Ok(Self::Fund),
            "INFLOW" => Ok(Self::Inflow),
            _ => Err(LedgerError::UnknownTransactionType(name.to_owned())),
        }
    }
}
