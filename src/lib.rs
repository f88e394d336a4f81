//! Single-table storage for personal budget ledgers.
//!
//! Ledger entries live in one key-value table partitioned by account. Each
//! entry is stored under a composite sort key
//! (`category||month||TYPE||uuid`) and carries two more composite keys
//! that back secondary indexes, so entries can be listed by category,
//! month and transaction type with a single prefix query.
//!
//! - [`models`]: the [`models::Ledger`] entity, its key encoding and its
//!   row and payload representations.
//! - [`storage`]: the [`storage::Table`] backend contract with in-memory
//!   and JSON-file implementations.
//! - [`ledger_table`]: the save protocol and query routing.
//! - [`config`]: table and index names from the environment.

pub mod config;
pub mod error;
pub mod ledger_table;
pub mod models;
pub mod storage;
