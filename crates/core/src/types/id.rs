//! Newtype IDs for type-safe document references.
//!
//! Documents in the remote database are addressed by opaque string keys.
//! Use the `define_document_id!` macro to create wrappers that prevent
//! accidentally mixing keys from different collections.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `short()`
/// - `Display`, `AsRef<str>` and `From<String>`/`From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use fantasia_core::define_document_id;
/// define_document_id!(ReviewId);
/// define_document_id!(CouponId);
///
/// let review = ReviewId::new("abc");
/// let coupon = CouponId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: ReviewId = coupon;
/// # let _ = (review, coupon);
/// ```
#[macro_export]
macro_rules! define_document_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a document key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying document key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the document key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The first eight characters of the key, for display.
            #[must_use]
            pub fn short(&self) -> &str {
                self.0
                    .char_indices()
                    .nth(8)
                    .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
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
    };
}

// Document keys of the three remote collections
define_document_id!(ProductId);
define_document_id!(OrderId);
define_document_id!(UserId);

/// Stable identifier of a cart line.
///
/// Lines are also reachable by position, but positions shift when an earlier
/// line is removed. The line ID does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Generate a fresh random line ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::generate()
    }
}

impl core::fmt::Display for LineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_truncates_long_keys() {
        let id = OrderId::new("aBcDeFgHiJkLmNoP");
        assert_eq!(id.short(), "aBcDeFgH");
    }

    #[test]
    fn test_short_keeps_short_keys() {
        let id = OrderId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_document_id_serializes_transparently() {
        let id = ProductId::new("p-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p-1\"");
    }

    #[test]
    fn test_line_id_parse_roundtrip() {
        let id = LineId::generate();
        let parsed: LineId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_line_ids_are_unique() {
        assert_ne!(LineId::generate(), LineId::generate());
    }
}
