//! Newtype wrappers for ledger identifiers.
//!
//! These keep the partition identifier and the per-entry disambiguator
//! from being mixed up with the free-text fields they sit next to.

use serde::{Deserialize, Serialize};

/// Number of hex characters in an [`EntryId`].
pub const ENTRY_ID_LEN: usize = 8;

/// Macro to define a newtype ID wrapping a `String` inner type.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// External account identifier; the partition key of every row.
    AccountId
}

define_string_id! {
    /// Eight lowercase hex characters that disambiguate entries sharing a
    /// category, month and transaction type.
    EntryId
}

impl EntryId {
    /// Generates a fresh identifier from the leading bits of a random v4
    /// UUID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        let high = uuid::Uuid::new_v4().as_u128() >> 96_u32;
        Self(format!("{high:08x}"))
    }
}
