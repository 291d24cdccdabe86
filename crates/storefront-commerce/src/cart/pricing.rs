//! Cart pricing calculations.

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::catalog::{Product, SelectedCustomization};
use crate::ids::CartItemId;
use crate::money::Money;
use crate::resolver::{PriceSource, ResolvedConfiguration};

/// Sum of the frozen totals of the selected customizations.
pub fn compute_customization_total(selected: &[SelectedCustomization]) -> Money {
    selected.iter().map(|c| c.total_price).sum()
}

/// Reference price shown struck through next to the unit price.
///
/// Conditional prices never show a discount. A special price shows the
/// product's plain price as the reference, without variant surcharges.
pub fn original_price_for(product: &Product, resolved: &ResolvedConfiguration) -> Money {
    match resolved.price_source {
        PriceSource::Conditional => resolved.unit_price,
        PriceSource::Special => product.price,
        PriceSource::Base => resolved.unit_price,
    }
}

/// Complete pricing breakdown for a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartPricing {
    /// Sum of unit prices times quantity, before customizations.
    pub merchandise_total: Money,
    /// Sum of customization surcharges times quantity.
    pub customization_total: Money,
    /// Amount payable.
    pub subtotal: Money,
    /// Difference between reference and unit prices.
    pub savings: Money,
    /// Per-line breakdown.
    pub line_items: Vec<LineItemPricing>,
}

impl CartPricing {
    /// Recompute the breakdown from the given lines.
    pub fn from_items(items: &[CartItem]) -> Self {
        let line_items: Vec<LineItemPricing> = items.iter().map(LineItemPricing::from_item).collect();

        Self {
            merchandise_total: line_items.iter().map(|l| l.unit_price.times(l.quantity)).sum(),
            customization_total: line_items
                .iter()
                .map(|l| l.customization_price.times(l.quantity))
                .sum(),
            subtotal: line_items.iter().map(|l| l.total).sum(),
            savings: line_items.iter().map(|l| l.savings).sum(),
            line_items,
        }
    }

    /// Check if any line is discounted.
    pub fn has_discounts(&self) -> bool {
        self.savings.is_positive()
    }

    /// Get the savings as a percentage of the undiscounted subtotal.
    pub fn discount_percentage(&self) -> f64 {
        let reference = self.subtotal + self.savings;
        if reference.is_zero() {
            return 0.0;
        }
        (self.savings.amount_cents as f64 / reference.amount_cents as f64) * 100.0
    }
}

/// Pricing breakdown for a single line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPricing {
    pub cart_item_id: CartItemId,
    /// Unit price before customizations.
    pub unit_price: Money,
    /// Per-unit customization surcharge.
    pub customization_price: Money,
    pub quantity: u32,
    /// `(reference price - unit price) * quantity`, never negative.
    pub savings: Money,
    /// Amount payable for the line.
    pub total: Money,
}

impl LineItemPricing {
    pub fn from_item(item: &CartItem) -> Self {
        let per_unit_savings = if item.original_price > item.unit_price {
            Money::new(
                item.original_price
                    .amount_cents
                    .saturating_sub(item.unit_price.amount_cents),
            )
        } else {
            Money::zero()
        };

        Self {
            cart_item_id: item.cart_item_id.clone(),
            unit_price: item.unit_price,
            customization_price: item.customization_total_price.unwrap_or_default(),
            quantity: item.quantity,
            savings: per_unit_savings.times(item.quantity),
            total: item.line_total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConditionalPrice, VariantCombination, VariantSelection};
    use crate::resolver::resolve;

    fn customization(id: &str, cents: i64) -> SelectedCustomization {
        SelectedCustomization {
            customization_id: id.into(),
            name: id.into(),
            fields: Vec::new(),
            total_price: Money::new(cents),
        }
    }

    fn sel(pairs: &[(&str, &str)]) -> VariantSelection {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_customization_total() {
        assert!(compute_customization_total(&[]).is_zero());
        assert_eq!(
            compute_customization_total(&[customization("a", 1500), customization("b", 300)]),
            Money::new(1800)
        );
    }

    #[test]
    fn test_original_price_policy() {
        let plain = Product::new("P", "Plain", Money::new(1000));
        let resolved = resolve(&plain, &sel(&[]));
        assert_eq!(original_price_for(&plain, &resolved), Money::new(1000));

        let special = Product::new("P", "Special", Money::new(1000))
            .with_special_price(Money::new(800));
        let resolved = resolve(&special, &sel(&[]));
        assert_eq!(resolved.unit_price, Money::new(800));
        assert_eq!(original_price_for(&special, &resolved), Money::new(1000));

        // The reference is the plain product price, surcharge excluded.
        let variant = Product::new("Q", "Variant", Money::new(2000))
            .with_special_price(Money::new(1500))
            .with_attribute("Size", &["M"])
            .with_variant(
                VariantCombination::new("Q-M", &[("Size", "M")], 1)
                    .with_additional_price(Money::new(200)),
            );
        let resolved = resolve(&variant, &sel(&[("Size", "M")]));
        assert_eq!(resolved.unit_price, Money::new(1700));
        assert_eq!(original_price_for(&variant, &resolved), Money::new(2000));

        let mut conditional = special.clone();
        conditional.conditional_prices.push(ConditionalPrice {
            when: sel(&[]),
            price: Money::new(900),
            special_price: Some(Money::new(700)),
        });
        let resolved = resolve(&conditional, &sel(&[]));
        assert_eq!(original_price_for(&conditional, &resolved), Money::new(700));
    }
}
