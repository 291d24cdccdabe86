//! Storefront product configuration, cart and checkout engine.
//!
//! This crate provides the domain logic behind a storefront with variant
//! products and paid customizations:
//!
//! - **Catalog**: Products, variants, conditional rules, customizations, the
//!   product repository
//! - **Resolver**: SKU, stock, price, images and customizations for a variant
//!   selection
//! - **Cart**: Line identity, pricing and the stock-capped cart ledger
//! - **Checkout**: Customer data, order payloads and order placement
//!
//! # Example
//!
//! ```rust
//! use storefront_commerce::prelude::*;
//!
//! let shirt = Product::new("SHIRT", "Shirt", Money::new(2000))
//!     .with_attribute("Size", &["S", "M"])
//!     .with_variant(VariantCombination::new("SHIRT-S", &[("Size", "S")], 4))
//!     .with_variant(
//!         VariantCombination::new("SHIRT-M", &[("Size", "M")], 1)
//!             .with_additional_price(Money::new(200)),
//!     );
//!
//! let medium: VariantSelection = [("Size".to_string(), "M".to_string())].into();
//! assert_eq!(resolve_price(&shirt, &medium), Money::new(2200));
//!
//! let mut cart = CartLedger::new();
//! assert!(cart.add(&shirt, Some(&medium), None));
//! assert!(!cart.add(&shirt, Some(&medium), None));
//! println!("Total: {}", cart.total_price().display());
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod persist;
pub mod resolver;

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use error::CommerceError;
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::Money;
    pub use crate::persist::{Persister, CART_KEY, PRODUCTS_KEY};

    // Catalog
    pub use crate::catalog::{
        select_customization, select_customizations, CatalogSnapshot, ConditionalImages,
        ConditionalPrice, CustomizationConfig, CustomizationField, CustomizationInput,
        CustomizationType, FieldInputType, Product, ProductRepository, ProductSource,
        SelectedCustomization, SelectedCustomizationField, StaticProductSource,
        VariantAttribute, VariantCombination, VariantSelection, CUSTOM_INPUT,
    };

    // Resolver
    pub use crate::resolver::{
        resolve, resolve_customizations, resolve_images, resolve_price, resolve_sku,
        resolve_stock, PriceSource, ResolvedConfiguration,
    };

    // Cart
    pub use crate::cart::{
        compute_cart_item_id, compute_customization_total, CartItem, CartLedger, CartPricing,
        LineItemPricing,
    };

    // Checkout
    pub use crate::checkout::{
        Address, CheckoutAssembler, Customer, InMemoryOrderSink, OrderConfirmation, OrderLine,
        OrderSink, OrderSubmission, PaymentMethod,
    };
}
