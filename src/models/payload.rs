//! Network payload representation.

use serde::{Deserialize, Serialize};

/// A ledger entry as exchanged with API clients.
///
/// Every value is a JSON-safe string: the amount is the decimal's text
/// form, the transaction type its key-encoding name. A present `sk` marks
/// the payload as an edit of the entry stored under that sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPayload {
    /// Category name.
    pub category: String,
    /// `SPEND`, `FUND` or `INFLOW`.
    pub transaction_type: String,
    /// ISO-8601 timestamp.
    pub date: String,
    /// Decimal amount as text.
    pub amount: String,
    /// Free-text description.
    pub description: String,
    /// Sort key of the stored entry this payload edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sk: Option<String>,
}
