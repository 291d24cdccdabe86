//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a variant SKU where a cart item ID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Stock keeping unit of a product or of one of its variants.
    Sku
);
define_id!(
    /// Deterministic identity of a configured cart line.
    CartItemId
);
define_id!(
    /// Order number handed out by the order sink.
    OrderNumber
);

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

impl OrderNumber {
    /// Generate a random order number such as `ORD-7K2Q9XH4A`.
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let suffix: String = (0..9)
            .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
            .collect();
        Self(format!("ORD-{}", suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = Sku::new("BIG-MAC");
        assert_eq!(id.as_str(), "BIG-MAC");
    }

    #[test]
    fn test_id_from_string() {
        let id: CartItemId = "JERSEY-M".into();
        assert_eq!(id.as_str(), "JERSEY-M");
    }

    #[test]
    fn test_id_display() {
        let id = Sku::new("FRIES");
        assert_eq!(format!("{}", id), "FRIES");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&Sku::new("FRIES")).unwrap();
        assert_eq!(json, r#""FRIES""#);
    }

    #[test]
    fn test_order_number_format() {
        let number = OrderNumber::generate();
        let s = number.as_str();
        assert!(s.starts_with("ORD-"));
        assert_eq!(s.len(), 13);
        assert!(s[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_order_number_uniqueness() {
        assert_ne!(OrderNumber::generate(), OrderNumber::generate());
    }
}
