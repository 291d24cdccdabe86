//! Shopping cart module.
//!
//! Contains line identity, line items, pricing and the cart ledger.

mod identity;
mod item;
mod ledger;
mod pricing;

pub use identity::compute_cart_item_id;
pub use item::CartItem;
pub use ledger::CartLedger;
pub use pricing::{compute_customization_total, original_price_for, CartPricing, LineItemPricing};
