//! Ledger entry model and its key derivation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::keys::{self, SortKeyParts};
use super::{AccountId, EntryId, LedgerPayload, LedgerRow, RowUpdate, TransactionType};
use crate::error::{LedgerError, Result};

/// `strftime` pattern for persisted and exchanged timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// `strftime` pattern for the month component of keys.
const MONTH_FORMAT: &str = "%Y-%m";

/// Parses an ISO-8601 timestamp.
///
/// Accepts a naive date-time (`2024-01-15T12:30:00`, optional fraction),
/// an RFC 3339 date-time with offset (the wall-clock time is kept), or a
/// bare date (midnight).
#[inline]
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(naive) = text.parse::<NaiveDateTime>() {
        return Some(naive);
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_local());
    }
    text.parse::<NaiveDate>()
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
}

/// Renders a timestamp as ISO-8601; the fraction is omitted when zero.
#[inline]
#[must_use]
pub fn format_timestamp(date: &NaiveDateTime) -> String {
    date.format(TIMESTAMP_FORMAT).to_string()
}

/// Returns the `YYYY-MM` month of a timestamp.
#[inline]
#[must_use]
pub fn month_of(date: &NaiveDateTime) -> String {
    date.format(MONTH_FORMAT).to_string()
}

/// One financial transaction scoped to an account.
///
/// Raw fields are the only state; the four keys are derived on every call
/// so they never go stale after a setter runs. `account` and `uuid` have no
/// setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// Partition identifier.
    account: AccountId,
    /// Budget bucket.
    category: String,
    /// Kind of money movement.
    transaction_type: TransactionType,
    /// `YYYY-MM`.
    month: String,
    /// Exact amount.
    amount: Decimal,
    /// Free text.
    description: String,
    /// Full timestamp.
    date: NaiveDateTime,
    /// Disambiguating sort key suffix.
    uuid: EntryId,
    /// Whether the entry has been written at least once.
    existing: bool,
    /// Sort key the entry was last loaded under; unset after an insert.
    prior_sort_key: Option<String>,
}

impl Ledger {
    /// Creates a fresh, never-persisted entry with a newly generated
    /// [`EntryId`].
    #[inline]
    #[must_use]
    pub fn new(
        account: AccountId,
        category: String,
        transaction_type: TransactionType,
        month: String,
        amount: Decimal,
        description: String,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            account,
            category,
            transaction_type,
            month,
            amount,
            description,
            date,
            uuid: EntryId::generate(),
            existing: false,
            prior_sort_key: None,
        }
    }

    /// Builds an entry from a client payload.
    ///
    /// The month is taken from the parsed date, never from the payload. A
    /// present `sk` marks the entry as existing under that sort key; the
    /// entry still gets a fresh [`EntryId`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MalformedPayload`] if the date or amount does
    /// not parse, and [`LedgerError::UnknownTransactionType`] if the type
    /// name is not recognised.
    #[inline]
    pub fn from_payload(account: AccountId, payload: LedgerPayload) -> Result<Self> {
        let date = parse_timestamp(&payload.date).ok_or_else(|| {
            LedgerError::MalformedPayload(format!("invalid date {:?}", payload.date))
        })?;
        let amount = Decimal::from_str_exact(payload.amount.trim()).map_err(|err| {
            LedgerError::MalformedPayload(format!("invalid amount {:?}: {err}", payload.amount))
        })?;
        let transaction_type: TransactionType = payload.transaction_type.parse()?;

        let mut ledger = Self::new(
            account,
            payload.category,
            transaction_type,
            month_of(&date),
            amount,
            payload.description,
            date,
        );
        if let Some(sort_key) = payload.sk {
            ledger.existing = true;
            ledger.prior_sort_key = Some(sort_key);
        }
        Ok(ledger)
    }

    /// Rebuilds an entry from a persisted row.
    ///
    /// Category, month, type and uuid come from the sort key; the row's
    /// index keys are not checked. The result is existing, with the row's
    /// sort key as its prior sort key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptRecord`] if the sort key does not have
    /// four parts or the date or amount does not parse, and
    /// [`LedgerError::UnknownTransactionType`] for an unknown type name.
    #[inline]
    pub fn from_row(row: LedgerRow) -> Result<Self> {
        let parts = SortKeyParts::parse(&row.sk)?;
        let date = parse_timestamp(&row.date).ok_or_else(|| LedgerError::CorruptRecord {
            sort_key: row.sk.clone(),
            reason: format!("invalid date {:?}", row.date),
        })?;
        let amount = row.amount.decimal().ok_or_else(|| LedgerError::CorruptRecord {
            sort_key: row.sk.clone(),
            reason: format!("invalid amount {}", row.amount),
        })?;
        Ok(Self {
            account: AccountId::new(row.pk),
            category: parts.category,
            transaction_type: parts.transaction_type,
            month: parts.month,
            amount,
            description: row.description,
            date,
            uuid: parts.uuid,
            existing: true,
            prior_sort_key: Some(row.sk),
        })
    }

    /// Projects the entry onto a full table row.
    #[inline]
    #[must_use]
    pub fn to_row(&self) -> LedgerRow {
        LedgerRow {
            pk: self.primary_key().to_owned(),
            sk: self.sort_key(),
            tk: self.type_index_key(),
            qk: self.query_index_key(),
            amount: self.amount.into(),
            description: self.description.clone(),
            date: format_timestamp(&self.date),
        }
    }

    /// Projects the entry onto the non-key attributes of its row.
    #[inline]
    #[must_use]
    pub fn to_update(&self) -> RowUpdate {
        RowUpdate {
            tk: self.type_index_key(),
            qk: self.query_index_key(),
            amount: self.amount.into(),
            description: self.description.clone(),
            date: format_timestamp(&self.date),
        }
    }

    /// Projects the entry onto a client payload, sort key included.
    #[inline]
    #[must_use]
    pub fn to_payload(&self) -> LedgerPayload {
        LedgerPayload {
            category: self.category.clone(),
            transaction_type: self.transaction_type.name().to_owned(),
            date: format_timestamp(&self.date),
            amount: self.amount.to_string(),
            description: self.description.clone(),
            sk: Some(self.sort_key()),
        }
    }

    // ── Derived keys ────────────────────────────────────────────────

    /// Partition key: the account.
    #[inline]
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.account.as_inner()
    }

    /// `category||month||TYPE||uuid`.
    #[inline]
    #[must_use]
    pub fn sort_key(&self) -> String {
        keys::sort_key(&self.category, &self.month, self.transaction_type, &self.uuid)
    }

    /// `category||TYPE||month`.
    #[inline]
    #[must_use]
    pub fn type_index_key(&self) -> String {
        keys::type_index_key(&self.category, self.transaction_type, &self.month)
    }

    /// `TYPE||month`.
    #[inline]
    #[must_use]
    pub fn query_index_key(&self) -> String {
        keys::query_index_key(self.transaction_type, &self.month)
    }

    /// Whether a prior sort key is recorded and differs from the current
    /// one.
    #[inline]
    #[must_use]
    pub fn key_changed(&self) -> bool {
        self.prior_sort_key
            .as_deref()
            .is_some_and(|prior| prior != self.sort_key())
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Account the entry belongs to.
    #[inline]
    #[must_use]
    pub const fn account(&self) -> &AccountId {
        &self.account
    }

    /// Category name.
    #[inline]
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Kind of money movement.
    #[inline]
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// `YYYY-MM`.
    #[inline]
    #[must_use]
    pub fn month(&self) -> &str {
        &self.month
    }

    /// Exact amount.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Free-text description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Full timestamp.
    #[inline]
    #[must_use]
    pub const fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// Disambiguating sort key suffix.
    #[inline]
    #[must_use]
    pub const fn uuid(&self) -> &EntryId {
        &self.uuid
    }

    /// Whether the entry has been written at least once.
    #[inline]
    #[must_use]
    pub const fn is_existing(&self) -> bool {
        self.existing
    }

    /// Sort key the entry was last loaded under (from a row, or from a
    /// payload's `sk`).
    ///
    /// Unset for new entries and after an insert, so an inserted entry whose
    /// key changes again must be reloaded before it is saved; saving it
    /// directly updates the new key, which does not exist.
    #[inline]
    #[must_use]
    pub fn prior_sort_key(&self) -> Option<&str> {
        self.prior_sort_key.as_deref()
    }

    // ── Mutators ────────────────────────────────────────────────────

    /// Moves the entry to another category.
    #[inline]
    pub fn set_category(&mut self, category: String) {
        self.category = category;
    }

    /// Changes the kind of money movement.
    #[inline]
    pub const fn set_transaction_type(&mut self, transaction_type: TransactionType) {
        self.transaction_type = transaction_type;
    }

    /// Moves the entry to another `YYYY-MM` month.
    #[inline]
    pub fn set_month(&mut self, month: String) {
        self.month = month;
    }

    /// Replaces the amount.
    #[inline]
    pub const fn set_amount(&mut self, amount: Decimal) {
        self.amount = amount;
    }

    /// Replaces the description.
    #[inline]
    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// Replaces the timestamp. The month is left alone.
    #[inline]
    pub const fn set_date(&mut self, date: NaiveDateTime) {
        self.date = date;
    }

    /// Records that the row under the prior sort key has been deleted.
    pub(crate) fn mark_replaced(&mut self) {
        self.existing = false;
        self.prior_sort_key = None;
    }

    /// Records a successful insert.
    pub(crate) const fn mark_inserted(&mut self) {
        self.existing = true;
    }
}
