//! Type-safe identifier wrappers around owned strings.
//!
//! The event stream identifies datasets, metrics, and things by IRIs and
//! other opaque server-assigned strings, so identifiers here wrap [`String`]
//! rather than a numeric or UUID form. Strong typing prevents accidental
//! mixing of identifier kinds at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of the dataset (stream) being consumed.
    DatasetId
}

define_id! {
    /// Identifier of a property or metric within a dataset.
    MetricId
}

define_id! {
    /// Identifier of the thing an observation belongs to.
    ThingId
}

define_id! {
    /// Reconciliation identity carried in an event's `id` tag. Events
    /// sharing an entity id are revisions of the same observation.
    EntityId
}
