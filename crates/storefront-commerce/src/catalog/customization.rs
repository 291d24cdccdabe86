//! Customization definitions and variant-scoped overrides.
//!
//! A customization (e.g. jersey flocking) is an optional, priced
//! configuration step made of fields. Variants may patch individual fields
//! or switch a customization off; patches always produce new values and
//! never touch the catalog entry they were applied to.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::product::VariantSelection;
use crate::money::Money;

/// Customizations attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CustomizationConfig {
    #[serde(default)]
    pub customizations: Vec<CustomizationType>,
}

/// An optional paid add-on category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationType {
    /// Unique within a product.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Disabled customizations are never offered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ascending display and resolution order.
    #[serde(default)]
    pub sort_order: i32,
    /// Input fields in display order.
    #[serde(default)]
    pub fields: Vec<CustomizationField>,
    /// Offered only when one of these constraints is satisfied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_for_variants: Option<Vec<VariantConstraint>>,
    /// Flat price charged when no field carries a price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Money>,
}

impl CustomizationType {
    /// Whether this customization is offered for a selection.
    ///
    /// Without constraints it is always offered; otherwise satisfying any
    /// one constraint suffices.
    pub fn is_available_for(&self, selection: &VariantSelection) -> bool {
        match &self.available_for_variants {
            None => true,
            Some(constraints) => constraints.iter().any(|c| c.is_satisfied_by(selection)),
        }
    }

    /// Look up a field by id.
    pub fn field(&self, field_id: &str) -> Option<&CustomizationField> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}

/// Restricts a customization to some values of one attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariantConstraint {
    pub attribute_name: String,
    pub values: Vec<String>,
}

impl VariantConstraint {
    pub fn is_satisfied_by(&self, selection: &VariantSelection) -> bool {
        selection
            .get(&self.attribute_name)
            .is_some_and(|value| self.values.contains(value))
    }
}

/// Kind of input a field takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldInputType {
    /// Free text.
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// One of `options`.
    Select,
    /// Boolean switch.
    Toggle,
    /// One of `presets`, or custom input when allowed.
    Preset,
}

impl FieldInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldInputType::Text => "text",
            FieldInputType::Number => "number",
            FieldInputType::Select => "select",
            FieldInputType::Toggle => "toggle",
            FieldInputType::Preset => "preset",
        }
    }
}

/// Validation rules for a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the whole value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A named bundle of field values with its own price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationPreset {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Field id to value. Numbers and booleans are kept as their text form.
    #[serde(deserialize_with = "scalar_map")]
    pub values: BTreeMap<String, String>,
    pub price: Money,
}

/// Visibility gate on another field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDependency {
    /// The field this one depends on.
    pub field_id: String,
    /// Values of that field that open the gate. Empty means "any value".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Open only while that preset field is in custom-input mode.
    #[serde(default)]
    pub custom_only: bool,
}

/// One input within a customization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationField {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub input_type: FieldInputType,
    #[serde(default)]
    pub validation: FieldValidation,
    /// Choices for `select` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Choices for `preset` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<CustomizationPreset>,
    /// Whether a `preset` field accepts manually entered values.
    #[serde(default)]
    pub allow_custom_input: bool,
    /// Price of manually entered values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_input_price: Option<Money>,
    /// Sibling fields a chosen preset fills in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_fields: Vec<String>,
    /// Flat price for non-preset fields holding a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<FieldDependency>,
}

impl CustomizationField {
    /// Create a bare field of the given type.
    pub fn new(id: impl Into<String>, input_type: FieldInputType) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            input_type,
            validation: FieldValidation::default(),
            options: Vec::new(),
            presets: Vec::new(),
            allow_custom_input: false,
            custom_input_price: None,
            target_fields: Vec::new(),
            additional_price: None,
            depends_on: None,
        }
    }

    pub fn preset(&self, preset_id: &str) -> Option<&CustomizationPreset> {
        self.presets.iter().find(|p| p.id == preset_id)
    }

    /// Fields filled by a preset: `target_fields`, or every key the presets
    /// define when no targets are declared.
    pub fn preset_targets(&self) -> Vec<String> {
        if !self.target_fields.is_empty() {
            return self.target_fields.clone();
        }
        let mut keys: Vec<String> = self
            .presets
            .iter()
            .flat_map(|p| p.values.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Variant-scoped patch for one customization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantCustomizationOverride {
    pub customization_id: String,
    /// `Some(false)` removes the customization for this variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Field id to sparse patch.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldOverride>,
}

/// Sparse patch over a field definition. Unset members leave the base
/// value in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets: Option<Vec<CustomizationPreset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_input_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<Money>,
}

impl FieldOverride {
    /// Produce a patched copy of `base`.
    pub fn apply(&self, base: &CustomizationField) -> CustomizationField {
        let mut field = base.clone();
        if let Some(presets) = &self.presets {
            field.presets = presets.clone();
        }
        if let Some(price) = self.custom_input_price {
            field.custom_input_price = Some(price);
        }
        if let Some(options) = &self.options {
            field.options = options.clone();
        }
        if let Some(price) = self.additional_price {
            field.additional_price = Some(price);
        }
        field
    }
}

/// Apply an optional variant override to a customization.
///
/// Returns `None` when the override disables the customization.
pub fn merge_override(
    base: &CustomizationType,
    patch: Option<&VariantCustomizationOverride>,
) -> Option<CustomizationType> {
    let Some(patch) = patch else {
        return Some(base.clone());
    };
    if patch.enabled == Some(false) {
        return None;
    }

    let mut merged = base.clone();
    merged.fields = base
        .fields
        .iter()
        .map(|field| match patch.fields.get(&field.id) {
            Some(field_patch) => field_patch.apply(field),
            None => field.clone(),
        })
        .collect();
    Some(merged)
}

fn default_true() -> bool {
    true
}

fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(D::Error::custom(format!(
                        "preset value for {} must be a scalar, got {}",
                        key, other
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}
