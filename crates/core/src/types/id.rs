//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers that prevent accidentally
//! passing a cart line ID where a product ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around an integer type with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `get()`
/// - `From` conversions in both directions, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use shopflow_core::define_id;
/// define_id!(WidgetId, i32);
/// define_id!(GadgetId, i64);
///
/// let widget = WidgetId::new(1);
/// let gadget = GadgetId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
/// # let _ = (widget, gadget);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Create a new ID from its raw value.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Get the underlying raw value.
            #[must_use]
            pub const fn get(&self) -> $inner {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<$inner>().map(Self)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId, i32);
define_id!(LineItemId, i64);

impl LineItemId {
    /// Pick an ID for a new cart line.
    ///
    /// The candidate is usually a millisecond timestamp. When the clock has not
    /// advanced past the largest existing ID (two adds in the same millisecond,
    /// or a clock that went backwards), the ID is bumped so it stays unique.
    #[must_use]
    pub fn next_after<'a>(candidate: i64, existing: impl IntoIterator<Item = &'a Self>) -> Self {
        let max = existing.into_iter().map(|id| id.0).max();
        match max {
            Some(max) if candidate <= max => Self(max.saturating_add(1)),
            _ => Self(candidate),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_is_transparent() {
        let id = ProductId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: LineItemId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(parsed.get(), 1_700_000_000_000);
    }

    #[test]
    fn test_from_str() {
        let id: ProductId = " 7 ".parse().unwrap();
        assert_eq!(id, ProductId::new(7));
        assert!("seven".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_next_after_uses_candidate_when_fresh() {
        let existing = [LineItemId::new(10), LineItemId::new(20)];
        assert_eq!(LineItemId::next_after(100, &existing), LineItemId::new(100));
    }

    #[test]
    fn test_next_after_bumps_on_collision() {
        let existing = [LineItemId::new(100), LineItemId::new(50)];
        assert_eq!(LineItemId::next_after(100, &existing), LineItemId::new(101));
        assert_eq!(LineItemId::next_after(3, &existing), LineItemId::new(101));
    }

    #[test]
    fn test_next_after_empty_cart() {
        assert_eq!(LineItemId::next_after(5, &[]), LineItemId::new(5));
    }
}
