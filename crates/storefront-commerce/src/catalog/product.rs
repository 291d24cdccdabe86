//! Product, variant and conditional rule types.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::customization::{CustomizationConfig, VariantCustomizationOverride};
use crate::error::CommerceError;
use crate::ids::Sku;
use crate::money::Money;

/// A concrete choice of variant attribute values, e.g. `{"Size": "M"}`.
///
/// Keys are kept sorted so that iteration order is canonical.
pub type VariantSelection = BTreeMap<String, String>;

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stock keeping unit (unique).
    pub sku: Sku,
    /// Product name.
    pub name: String,
    /// Full description.
    #[serde(default)]
    pub description: String,
    /// Base price.
    pub price: Money,
    /// Special price; overrides `price` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_price: Option<Money>,
    /// Ordered image URLs. A single legacy `imageUrl` string is accepted too.
    #[serde(default, alias = "imageUrl", deserialize_with = "one_or_many")]
    pub image_urls: Vec<String>,
    /// Stock level; only meaningful for products without variants.
    #[serde(default)]
    pub stock_level: u32,
    /// Whether stock/price/images are routed through variants.
    #[serde(default)]
    pub has_variants: bool,
    /// Variant dimensions in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_attributes: Vec<VariantAttribute>,
    /// Concrete SKU-bearing variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantCombination>,
    /// Price rules, first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_prices: Vec<ConditionalPrice>,
    /// Image rules, first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_images: Vec<ConditionalImages>,
    /// Optional paid add-ons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_config: Option<CustomizationConfig>,
}

impl Product {
    /// Create a new simple product without variants.
    pub fn new(sku: impl Into<Sku>, name: impl Into<String>, price: Money) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: String::new(),
            price,
            special_price: None,
            image_urls: Vec::new(),
            stock_level: 0,
            has_variants: false,
            variant_attributes: Vec::new(),
            variants: Vec::new(),
            conditional_prices: Vec::new(),
            conditional_images: Vec::new(),
            customization_config: None,
        }
    }

    /// Set the stock level.
    pub fn with_stock(mut self, stock_level: u32) -> Self {
        self.stock_level = stock_level;
        self
    }

    /// Set the special price.
    pub fn with_special_price(mut self, special_price: Money) -> Self {
        self.special_price = Some(special_price);
        self
    }

    /// Add an image URL.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    /// Add a variant dimension.
    pub fn with_attribute(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.variant_attributes.push(VariantAttribute {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Add a variant and mark the product as variant-bearing.
    pub fn with_variant(mut self, variant: VariantCombination) -> Self {
        self.has_variants = true;
        self.variants.push(variant);
        self
    }

    /// Price the customer pays before variant surcharges: special or base.
    pub fn effective_price(&self) -> Money {
        self.special_price.unwrap_or(self.price)
    }

    /// The first variant whose attributes agree with every key of a
    /// non-empty selection.
    pub fn find_variant(&self, selection: &VariantSelection) -> Option<&VariantCombination> {
        if !self.has_variants || selection.is_empty() {
            return None;
        }
        self.variants.iter().find(|v| v.matches(selection))
    }

    /// Check the catalog invariants for variant-bearing products.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let invalid = |reason: String| CommerceError::InvalidProduct {
            sku: self.sku.to_string(),
            reason,
        };

        if !self.has_variants {
            return Ok(());
        }
        if self.variants.is_empty() {
            return Err(invalid("hasVariants is set but no variants are defined".into()));
        }

        for variant in &self.variants {
            for key in variant.attributes.keys() {
                if !self.variant_attributes.iter().any(|a| &a.name == key) {
                    return Err(invalid(format!(
                        "variant {} uses undeclared attribute {}",
                        variant.sku, key
                    )));
                }
            }
            for attribute in &self.variant_attributes {
                if !variant.attributes.contains_key(&attribute.name) {
                    return Err(invalid(format!(
                        "variant {} is missing attribute {}",
                        variant.sku, attribute.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// All customizations defined on this product, unfiltered.
    pub fn customizations(&self) -> &[crate::catalog::CustomizationType] {
        self.customization_config
            .as_ref()
            .map(|c| c.customizations.as_slice())
            .unwrap_or(&[])
    }
}

/// A variant dimension (e.g., Size with values S, M, L).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantAttribute {
    /// Attribute name (e.g., "Size").
    pub name: String,
    /// Allowed values in display order.
    #[serde(default)]
    pub values: Vec<String>,
}

/// One concrete SKU-bearing point in the attribute space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantCombination {
    /// Attribute name to value.
    pub attributes: VariantSelection,
    /// Stock keeping unit for this variant (globally unique).
    pub sku: Sku,
    /// Units in stock.
    #[serde(default)]
    pub stock_level: u32,
    /// Images replacing the product's base images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    /// Surcharge added to the resolved base price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<Money>,
    /// Customization patches scoped to this variant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customization_overrides: Vec<VariantCustomizationOverride>,
}

impl VariantCombination {
    /// Create a variant from attribute pairs.
    pub fn new(sku: impl Into<Sku>, attributes: &[(&str, &str)], stock_level: u32) -> Self {
        Self {
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            sku: sku.into(),
            stock_level,
            image_urls: None,
            additional_price: None,
            customization_overrides: Vec::new(),
        }
    }

    /// Set the surcharge.
    pub fn with_additional_price(mut self, amount: Money) -> Self {
        self.additional_price = Some(amount);
        self
    }

    /// Set variant-specific images.
    pub fn with_images(mut self, urls: &[&str]) -> Self {
        self.image_urls = Some(urls.iter().map(|u| u.to_string()).collect());
        self
    }

    /// Every key in `selection` carries the same value on this variant.
    pub fn matches(&self, selection: &VariantSelection) -> bool {
        selection
            .iter()
            .all(|(key, value)| self.attributes.get(key) == Some(value))
    }

    /// Display name from the attribute values in attribute-name order
    /// (e.g., "Red / M").
    pub fn build_name(&self) -> String {
        if self.attributes.is_empty() {
            "Default".to_string()
        } else {
            self.attributes
                .values()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" / ")
        }
    }
}

/// Price override applied when its `when` clause matches the selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalPrice {
    /// Attribute pairs that must all be selected.
    pub when: VariantSelection,
    /// Price when matched.
    pub price: Money,
    /// Special price when matched; wins over `price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_price: Option<Money>,
}

impl ConditionalPrice {
    pub fn matches(&self, selection: &VariantSelection) -> bool {
        rule_matches(&self.when, selection)
    }

    /// The price this rule yields.
    pub fn effective_price(&self) -> Money {
        self.special_price.unwrap_or(self.price)
    }
}

/// Image override applied when its `when` clause matches the selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalImages {
    /// Attribute pairs that must all be selected.
    pub when: VariantSelection,
    /// Images when matched.
    pub image_urls: Vec<String>,
}

impl ConditionalImages {
    pub fn matches(&self, selection: &VariantSelection) -> bool {
        rule_matches(&self.when, selection)
    }
}

/// Exact equality on every key of `when`; a key missing from the selection
/// never matches.
pub(crate) fn rule_matches(when: &VariantSelection, selection: &VariantSelection) -> bool {
    when.iter()
        .all(|(key, value)| selection.get(key) == Some(value))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) if url.is_empty() => Vec::new(),
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(pairs: &[(&str, &str)]) -> VariantSelection {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn jersey() -> Product {
        Product::new("JERSEY", "Home Jersey", Money::new(8990))
            .with_attribute("Size", &["S", "M"])
            .with_attribute("Color", &["Red", "White"])
            .with_variant(VariantCombination::new(
                "JERSEY-S-RED",
                &[("Size", "S"), ("Color", "Red")],
                3,
            ))
            .with_variant(VariantCombination::new(
                "JERSEY-M-RED",
                &[("Size", "M"), ("Color", "Red")],
                1,
            ))
    }

    #[test]
    fn test_find_variant_exact() {
        let product = jersey();
        let variant = product
            .find_variant(&selection(&[("Size", "M"), ("Color", "Red")]))
            .unwrap();
        assert_eq!(variant.sku.as_str(), "JERSEY-M-RED");
    }

    #[test]
    fn test_find_variant_unknown_value() {
        let product = jersey();
        assert!(product
            .find_variant(&selection(&[("Size", "XL"), ("Color", "Red")]))
            .is_none());
    }

    #[test]
    fn test_empty_selection_matches_nothing() {
        assert!(jersey().find_variant(&VariantSelection::new()).is_none());
    }

    #[test]
    fn test_rule_requires_every_key() {
        let when = selection(&[("Size", "M"), ("Color", "Red")]);
        assert!(rule_matches(&when, &selection(&[("Size", "M"), ("Color", "Red")])));
        assert!(!rule_matches(&when, &selection(&[("Size", "M")])));
        assert!(!rule_matches(&when, &selection(&[("Size", "M"), ("Color", "White")])));
    }

    #[test]
    fn test_validate_variant_invariants() {
        assert!(jersey().validate().is_ok());

        let mut no_variants = jersey();
        no_variants.variants.clear();
        assert!(no_variants.validate().is_err());

        let undeclared = jersey().with_variant(VariantCombination::new(
            "JERSEY-FIT",
            &[("Size", "S"), ("Color", "Red"), ("Fit", "Slim")],
            1,
        ));
        assert!(matches!(
            undeclared.validate(),
            Err(CommerceError::InvalidProduct { .. })
        ));

        let incomplete =
            jersey().with_variant(VariantCombination::new("JERSEY-S", &[("Size", "S")], 1));
        assert!(incomplete.validate().is_err());
    }

    #[test]
    fn test_legacy_image_url_is_accepted() {
        let json = r#"{
            "sku": "BIG-MAC",
            "name": "Big Mac",
            "description": "Two beef patties",
            "price": 4.99,
            "imageUrl": "https://img.example/bigmac.jpg",
            "stockLevel": 10
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.image_urls, vec!["https://img.example/bigmac.jpg"]);
        assert_eq!(product.price, Money::new(499));
        assert!(!product.has_variants);
    }

    #[test]
    fn test_variant_build_name() {
        let variant = VariantCombination::new("X", &[("Color", "Red"), ("Size", "M")], 1);
        assert_eq!(variant.build_name(), "Red / M");
    }
}
