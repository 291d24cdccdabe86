//! Configuration resolution.
//!
//! Pure functions that answer "what does this product look like for this
//! selection": SKU, stock, unit price, images and the customizations on
//! offer. A selection that matches no variant is a normal outcome and
//! resolves to documented fallbacks (zero stock, base SKU/price/images).
//!
//! Conditional price and image rules are scanned in list order and the first
//! rule whose `when` clause is fully satisfied wins.

use serde::{Deserialize, Serialize};

use crate::catalog::{merge_override, CustomizationType, Product, VariantSelection};
use crate::ids::Sku;
use crate::money::Money;

/// Where a resolved price came from. Drives the discount display policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// A conditional price rule matched.
    Conditional,
    /// The product's special price.
    Special,
    /// The product's plain price.
    Base,
}

/// Everything a variant picker needs for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    pub sku: Sku,
    pub stock_level: u32,
    pub unit_price: Money,
    pub price_source: PriceSource,
    pub image_urls: Vec<String>,
    pub customizations: Vec<CustomizationType>,
}

impl ResolvedConfiguration {
    /// Whether at least one unit can be bought.
    pub fn is_available(&self) -> bool {
        self.stock_level > 0
    }

    /// First image, or an empty string when there is none.
    pub fn primary_image(&self) -> &str {
        self.image_urls.first().map(String::as_str).unwrap_or("")
    }
}

/// Resolve every aspect of a selection at once.
pub fn resolve(product: &Product, selection: &VariantSelection) -> ResolvedConfiguration {
    let (unit_price, price_source) = resolve_price_with_source(product, selection);
    ResolvedConfiguration {
        sku: resolve_sku(product, selection),
        stock_level: resolve_stock(product, selection),
        unit_price,
        price_source,
        image_urls: resolve_images(product, selection),
        customizations: resolve_customizations(product, selection),
    }
}

/// Units in stock for the selection; `0` when no variant matches.
pub fn resolve_stock(product: &Product, selection: &VariantSelection) -> u32 {
    if !product.has_variants {
        return product.stock_level;
    }
    product
        .find_variant(selection)
        .map(|v| v.stock_level)
        .unwrap_or(0)
}

/// The matched variant's SKU, or the product SKU.
pub fn resolve_sku(product: &Product, selection: &VariantSelection) -> Sku {
    product
        .find_variant(selection)
        .map(|v| v.sku.clone())
        .unwrap_or_else(|| product.sku.clone())
}

/// Unit price before customizations.
pub fn resolve_price(product: &Product, selection: &VariantSelection) -> Money {
    resolve_price_with_source(product, selection).0
}

/// Unit price and the rule that produced it.
pub fn resolve_price_with_source(
    product: &Product,
    selection: &VariantSelection,
) -> (Money, PriceSource) {
    if let Some(rule) = product
        .conditional_prices
        .iter()
        .find(|rule| rule.matches(selection))
    {
        return (rule.effective_price(), PriceSource::Conditional);
    }

    let (base, source) = match product.special_price {
        Some(special) => (special, PriceSource::Special),
        None => (product.price, PriceSource::Base),
    };

    if !product.has_variants {
        return (base, source);
    }

    let surcharge = product
        .find_variant(selection)
        .and_then(|v| v.additional_price)
        .unwrap_or_default();
    (base + surcharge, source)
}

/// Ordered image URLs for the selection.
pub fn resolve_images(product: &Product, selection: &VariantSelection) -> Vec<String> {
    if let Some(rule) = product
        .conditional_images
        .iter()
        .find(|rule| rule.matches(selection))
    {
        return rule.image_urls.clone();
    }

    product
        .find_variant(selection)
        .and_then(|v| v.image_urls.clone())
        .unwrap_or_else(|| product.image_urls.clone())
}

/// Customizations offered for the selection, variant overrides applied,
/// sorted by `sort_order`.
pub fn resolve_customizations(
    product: &Product,
    selection: &VariantSelection,
) -> Vec<CustomizationType> {
    let variant = product.find_variant(selection);

    let mut offered: Vec<CustomizationType> = product
        .customizations()
        .iter()
        .filter(|c| c.enabled)
        .filter(|c| c.is_available_for(selection))
        .filter_map(|c| {
            let patch = variant.and_then(|v| {
                v.customization_overrides
                    .iter()
                    .find(|o| o.customization_id == c.id)
            });
            merge_override(c, patch)
        })
        .collect();

    // `sort_by_key` is stable, so equal orders keep catalog order.
    offered.sort_by_key(|c| c.sort_order);
    offered
}
