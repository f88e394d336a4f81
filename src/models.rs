//! Data models for ledger entries.
//!
//! This module contains the [`Ledger`] entity, the composite key encoding
//! it is stored under, and its two external representations: the persisted
//! [`LedgerRow`] and the client-facing [`LedgerPayload`].

mod enums;
mod ids;
mod keys;
mod ledger;
mod payload;
mod row;

pub use enums::TransactionType;
pub use ids::{AccountId, ENTRY_ID_LEN, EntryId};
pub use keys::{
    KEY_SEPARATOR, KeyAttribute, SortKeyParts, query_index_key, sort_key, type_index_key,
};
pub use ledger::{Ledger, format_timestamp, month_of, parse_timestamp};
pub use payload::LedgerPayload;
pub use row::{LedgerRow, RowAmount, RowUpdate};

/// Re-exported so callers can build dates without a direct `chrono` dependency.
pub use chrono::{NaiveDate, NaiveDateTime};
/// Re-exported so callers can build amounts without a direct `rust_decimal` dependency.
pub use rust_decimal::Decimal;
