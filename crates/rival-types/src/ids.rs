//! Type-safe identifier wrappers around the integer primary keys.
//!
//! Accounts, charts, and songs are keyed by `SERIAL` columns in `PostgreSQL`.
//! Wrapping them prevents passing a chart index where an account index is
//! expected. Rows read from the database carry raw `i32` values and are
//! converted at the store boundary.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around an `i32` key with standard derives.
macro_rules! define_idx {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub i32);

        impl $name {
            /// Wrap a raw database key.
            pub const fn new(idx: i32) -> Self {
                Self(idx)
            }

            /// Return the inner key value.
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(idx: i32) -> Self {
                Self(idx)
            }
        }

        impl From<$name> for i32 {
            fn from(idx: $name) -> Self {
                idx.0
            }
        }
    };
}

define_idx! {
    /// Index of a player account.
    AccountIdx
}

define_idx! {
    /// Index of a chart (one difficulty of one song).
    ChartIdx
}

define_idx! {
    /// Index of a song.
    SongIdx
}
