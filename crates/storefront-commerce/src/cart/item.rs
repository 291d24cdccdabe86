//! Cart line items.

use serde::{Deserialize, Serialize};

use crate::cart::identity::compute_cart_item_id;
use crate::cart::pricing::{compute_customization_total, original_price_for};
use crate::catalog::{Product, SelectedCustomization, VariantSelection};
use crate::ids::{CartItemId, Sku};
use crate::money::Money;
use crate::resolver::ResolvedConfiguration;

/// One priced, configured line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Resolved SKU (the variant SKU for variant products).
    pub sku: Sku,
    pub name: String,
    /// Price per unit before customizations.
    pub unit_price: Money,
    /// Reference price for discount display.
    pub original_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: String,
    /// Resolved stock when the line was last added to; caps quantity.
    pub stock_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variants: Option<VariantSelection>,
    pub cart_item_id: CartItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_customizations: Option<Vec<SelectedCustomization>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_total_price: Option<Money>,
    /// `unit_price + customization_total_price`, only when the
    /// customizations cost something.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_price: Option<Money>,
}

impl CartItem {
    /// Build a fresh line with quantity 1 from a resolved configuration.
    pub fn configure(
        product: &Product,
        resolved: &ResolvedConfiguration,
        selection: Option<&VariantSelection>,
        customizations: Option<&[SelectedCustomization]>,
    ) -> Self {
        let selection = selection.filter(|s| !s.is_empty());
        let customizations = customizations.filter(|c| !c.is_empty());

        let customization_total = customizations.map(compute_customization_total);
        let final_price = customization_total
            .filter(Money::is_positive)
            .map(|total| resolved.unit_price + total);

        Self {
            cart_item_id: compute_cart_item_id(&resolved.sku, selection, customizations),
            sku: resolved.sku.clone(),
            name: product.name.clone(),
            unit_price: resolved.unit_price,
            original_price: original_price_for(product, resolved),
            quantity: 1,
            image_url: resolved.primary_image().to_string(),
            stock_level: resolved.stock_level,
            selected_variants: selection.cloned(),
            selected_customizations: customizations.map(<[_]>::to_vec),
            customization_total_price: customization_total,
            final_price,
        }
    }

    /// Price per unit including customizations.
    pub fn effective_unit_price(&self) -> Money {
        self.final_price.unwrap_or(self.unit_price)
    }

    /// `effective_unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.effective_unit_price().times(self.quantity)
    }

    pub fn is_discounted(&self) -> bool {
        self.original_price > self.unit_price
    }
}
