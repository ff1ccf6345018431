//! Newtype IDs for type-safe entity references.
//!
//! Every identifier in FreshBasket is issued by somebody else (the catalog,
//! the identity provider, the document store) or by a timestamp, so all of
//! them wrap an opaque string. Use the `define_id!` macro to create wrappers
//! that prevent mixing identifiers of different entities.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use freshbasket_core::define_id;
/// define_id!(BasketId);
/// define_id!(ShelfId);
///
/// let basket = BasketId::new("b-1");
/// let shelf = ShelfId::from("s-1");
/// assert_eq!(basket.as_str(), "b-1");
///
/// // These are different types, so this won't compile:
/// // let _: BasketId = shelf;
/// # let _ = shelf;
/// ```
#[macro_export]
macro_rules! define_id {
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
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog product identifier (unique key of a cart line).
define_id!(ProductId);
// Delivery address identifier, unique within one user's address list.
define_id!(AddressId);
// Identity-provider user id.
define_id!(UserId);
// Backend order document id.
define_id!(OrderId);
