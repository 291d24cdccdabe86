//! The cart ledger.
//!
//! An ordered list of configured lines keyed by [`CartItemId`]. Every add
//! re-resolves the product against the current catalog data and refuses to
//! go above the resolved stock. Rejections are reported as `false` and leave
//! the ledger untouched.

use serde::{Deserialize, Serialize};

use crate::cart::identity::compute_cart_item_id;
use crate::cart::{CartItem, CartPricing};
use crate::catalog::{Product, SelectedCustomization, VariantSelection};
use crate::error::CommerceError;
use crate::ids::CartItemId;
use crate::money::Money;
use crate::persist::{self, Persister, CART_KEY};
use crate::resolver::{resolve, ResolvedConfiguration};

/// Shopping cart contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLedger {
    items: Vec<CartItem>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted state. Missing or unreadable state yields an
    /// empty cart.
    pub fn load(persister: &dyn Persister) -> Self {
        let items: Vec<CartItem> = persist::load_or_default(persister, CART_KEY);
        tracing::debug!(lines = items.len(), "loaded persisted cart");
        Self { items }
    }

    /// Persist the current lines.
    pub fn save(&self, persister: &dyn Persister) -> Result<(), CommerceError> {
        persist::save_as(persister, CART_KEY, &self.items)
    }

    /// Whether one more unit of this configuration fits under its stock.
    pub fn can_add(
        &self,
        product: &Product,
        selection: Option<&VariantSelection>,
        customizations: Option<&[SelectedCustomization]>,
    ) -> bool {
        let (resolved, id) = Self::target(product, selection, customizations);
        self.fits(&resolved, &id)
    }

    /// Add one unit of this configuration.
    ///
    /// Increments the matching line or appends a new one. Returns `false`
    /// when the stock ceiling would be exceeded.
    pub fn add(
        &mut self,
        product: &Product,
        selection: Option<&VariantSelection>,
        customizations: Option<&[SelectedCustomization]>,
    ) -> bool {
        let (resolved, id) = Self::target(product, selection, customizations);
        if !self.fits(&resolved, &id) {
            tracing::debug!(
                cart_item_id = %id,
                stock = resolved.stock_level,
                "add rejected: stock ceiling reached"
            );
            return false;
        }

        match self.items.iter().position(|item| item.cart_item_id == id) {
            Some(index) => {
                let item = &mut self.items[index];
                item.quantity += 1;
                item.stock_level = resolved.stock_level;
            }
            None => self.items.push(CartItem::configure(
                product,
                &resolved,
                selection,
                customizations,
            )),
        }
        tracing::debug!(cart_item_id = %id, "added to cart");
        true
    }

    /// Delete a line. Returns whether anything was removed.
    pub fn remove(&mut self, cart_item_id: &CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.cart_item_id != cart_item_id);
        self.items.len() < before
    }

    /// Replace a line's quantity.
    ///
    /// Ignored when the line is absent, the quantity is not positive, or it
    /// exceeds the line's stock snapshot.
    pub fn set_quantity(&mut self, cart_item_id: &CartItemId, quantity: i64) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.cart_item_id == cart_item_id)
        else {
            return false;
        };
        match u32::try_from(quantity) {
            Ok(quantity) if quantity >= 1 && quantity <= item.stock_level => {
                item.quantity = quantity;
                true
            }
            _ => {
                tracing::debug!(%cart_item_id, quantity, "quantity update rejected");
                false
            }
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, cart_item_id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.cart_item_id == cart_item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of line totals, recomputed on every call.
    pub fn total_price(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Full pricing breakdown.
    pub fn pricing(&self) -> CartPricing {
        CartPricing::from_items(&self.items)
    }

    fn target(
        product: &Product,
        selection: Option<&VariantSelection>,
        customizations: Option<&[SelectedCustomization]>,
    ) -> (ResolvedConfiguration, CartItemId) {
        let empty = VariantSelection::new();
        let resolved = resolve(product, selection.unwrap_or(&empty));
        let id = compute_cart_item_id(&resolved.sku, selection, customizations);
        (resolved, id)
    }

    fn fits(&self, resolved: &ResolvedConfiguration, id: &CartItemId) -> bool {
        let in_cart = self.get(id).map(|item| item.quantity).unwrap_or(0);
        u64::from(in_cart) + 1 <= u64::from(resolved.stock_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VariantCombination;

    fn product_p() -> Product {
        Product::new("P", "Product P", Money::new(1000))
            .with_special_price(Money::new(800))
            .with_stock(2)
    }

    fn product_q() -> Product {
        Product::new("Q", "Product Q", Money::new(2000))
            .with_attribute("Size", &["S", "M"])
            .with_variant(VariantCombination::new("Q-S", &[("Size", "S")], 3))
            .with_variant(
                VariantCombination::new("Q-M", &[("Size", "M")], 1)
                    .with_additional_price(Money::new(200)),
            )
    }

    fn size(value: &str) -> VariantSelection {
        [("Size".to_string(), value.to_string())].into()
    }

    #[test]
    fn test_stock_ceiling_simple_product() {
        let mut ledger = CartLedger::new();
        let p = product_p();

        assert!(ledger.add(&p, None, None));
        assert!(ledger.add(&p, None, None));
        assert!(!ledger.can_add(&p, None, None));
        assert!(!ledger.add(&p, None, None));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.total_items(), 2);
        assert_eq!(ledger.total_price(), Money::new(1600));
        assert_eq!(ledger.items()[0].original_price, Money::new(1000));
    }

    #[test]
    fn test_variant_lines_are_independent() {
        let mut ledger = CartLedger::new();
        let q = product_q();

        assert!(ledger.add(&q, Some(&size("M")), None));
        assert!(!ledger.add(&q, Some(&size("M")), None));
        assert!(ledger.add(&q, Some(&size("S")), None));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.items()[0].unit_price, Money::new(2200));
        assert_ne!(ledger.items()[0].cart_item_id, ledger.items()[1].cart_item_id);
    }

    #[test]
    fn test_unmatched_selection_cannot_be_added() {
        let mut ledger = CartLedger::new();
        assert!(!ledger.add(&product_q(), Some(&size("XL")), None));
        assert!(!ledger.add(&product_q(), None, None));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_set_quantity_bounds() {
        let mut ledger = CartLedger::new();
        let q = product_q();
        ledger.add(&q, Some(&size("S")), None);
        let id = ledger.items()[0].cart_item_id.clone();

        assert!(ledger.set_quantity(&id, 3));
        assert_eq!(ledger.total_items(), 3);

        assert!(!ledger.set_quantity(&id, 4));
        assert!(!ledger.set_quantity(&id, 0));
        assert!(!ledger.set_quantity(&id, -2));
        assert!(!ledger.set_quantity(&CartItemId::new("missing"), 1));
        assert_eq!(ledger.total_items(), 3);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut ledger = CartLedger::new();
        ledger.add(&product_p(), None, None);
        ledger.add(&product_q(), Some(&size("S")), None);

        assert!(!ledger.remove(&CartItemId::new("missing")));
        assert!(ledger.remove(&CartItemId::new("P")));
        assert_eq!(ledger.len(), 1);

        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.total_price().is_zero());
    }

    #[test]
    fn test_totals_on_extreme_prices_do_not_overflow() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "sku": "GOLD",
            "name": "Gold bar",
            "price": 9.0e16,
            "stockLevel": 5
        }))
        .unwrap();

        let mut ledger = CartLedger::new();
        assert!(ledger.add(&product, None, None));
        assert!(ledger.add(&product, None, None));

        assert_eq!(ledger.total_price(), Money::new(i64::MAX));
        assert_eq!(ledger.pricing().subtotal, Money::new(i64::MAX));
    }

    #[test]
    fn test_pricing_matches_total_price() {
        let mut ledger = CartLedger::new();
        ledger.add(&product_p(), None, None);
        ledger.add(&product_p(), None, None);
        ledger.add(&product_q(), Some(&size("M")), None);

        let pricing = ledger.pricing();
        assert_eq!(pricing.subtotal, ledger.total_price());
        assert_eq!(pricing.savings, Money::new(400));
        assert!(pricing.has_discounts());
    }
}
