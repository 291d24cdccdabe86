//! Turning user input into a priced customization selection.
//!
//! Prices are computed once here and frozen into the resulting
//! [`SelectedCustomization`]; later catalog changes do not reprice lines
//! that are already in the cart.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::customization::{CustomizationField, CustomizationType, FieldInputType};
use crate::error::CommerceError;
use crate::money::Money;

/// Value of a preset field meaning "I'll type the values myself".
pub const CUSTOM_INPUT: &str = "custom";

/// A concrete user choice for one customization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCustomization {
    pub customization_id: String,
    pub name: String,
    pub fields: Vec<SelectedCustomizationField>,
    /// Sum of field prices, or the customization's base price when no
    /// field carries one.
    pub total_price: Money,
}

/// A concrete value for one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCustomizationField {
    pub field_id: String,
    pub value: String,
    /// Set when the value came from a preset choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
    pub additional_price: Money,
}

/// Raw user input for one customization.
///
/// For a `preset` field the value is the chosen preset id, or
/// [`CUSTOM_INPUT`] to enter values manually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationInput {
    pub customization_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl CustomizationInput {
    pub fn new(customization_id: impl Into<String>) -> Self {
        Self {
            customization_id: customization_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn with(mut self, field_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(field_id.into(), value.into());
        self
    }
}

enum PresetMode<'a> {
    Preset(&'a crate::catalog::CustomizationPreset),
    Custom,
    Unset,
}

/// Validate `input` against `definition` and price it.
///
/// `definition` should be the resolved customization for the current
/// variant selection, so that variant overrides are already merged in.
pub fn select_customization(
    definition: &CustomizationType,
    input: &CustomizationInput,
) -> Result<SelectedCustomization, CommerceError> {
    if input.customization_id != definition.id {
        return Err(CommerceError::Validation(format!(
            "input for {} applied to customization {}",
            input.customization_id, definition.id
        )));
    }
    if !definition.enabled {
        return Err(CommerceError::Validation(format!(
            "customization {} is not available",
            definition.id
        )));
    }
    for key in input.values.keys() {
        if definition.field(key).is_none() {
            return Err(CommerceError::Validation(format!(
                "unknown field {} for customization {}",
                key, definition.id
            )));
        }
    }

    // Resolve preset fields first; they decide what their targets contain.
    let mut modes: BTreeMap<&str, PresetMode<'_>> = BTreeMap::new();
    let mut values = input.values.clone();
    let mut preset_covered: HashSet<String> = HashSet::new();

    for field in definition
        .fields
        .iter()
        .filter(|f| f.input_type == FieldInputType::Preset)
    {
        let mode = match input.values.get(&field.id).map(String::as_str) {
            Some(CUSTOM_INPUT) => {
                if !field.allow_custom_input {
                    return Err(CommerceError::Validation(format!(
                        "{} does not accept custom input",
                        field.label
                    )));
                }
                PresetMode::Custom
            }
            Some("") | None => {
                let targets_filled = field
                    .preset_targets()
                    .iter()
                    .any(|t| input.values.get(t).is_some_and(|v| !v.is_empty()));
                if field.allow_custom_input && targets_filled {
                    PresetMode::Custom
                } else {
                    PresetMode::Unset
                }
            }
            Some(preset_id) => match field.preset(preset_id) {
                Some(preset) => PresetMode::Preset(preset),
                None => {
                    return Err(CommerceError::Validation(format!(
                        "unknown preset {} for {}",
                        preset_id, field.label
                    )))
                }
            },
        };

        match &mode {
            PresetMode::Preset(preset) => {
                for target in field.preset_targets() {
                    if let Some(value) = preset.values.get(&target) {
                        values.insert(target.clone(), value.clone());
                    }
                    preset_covered.insert(target);
                }
            }
            PresetMode::Custom => preset_covered.extend(field.preset_targets()),
            PresetMode::Unset => {}
        }
        modes.insert(field.id.as_str(), mode);
    }

    let mut selected = Vec::new();
    for field in &definition.fields {
        if !gate_open(field, &values, &modes) {
            continue;
        }

        if field.input_type == FieldInputType::Preset {
            match modes.get(field.id.as_str()) {
                Some(PresetMode::Preset(preset)) => selected.push(SelectedCustomizationField {
                    field_id: field.id.clone(),
                    value: preset.id.clone(),
                    preset_id: Some(preset.id.clone()),
                    additional_price: preset.price,
                }),
                Some(PresetMode::Custom) => selected.push(SelectedCustomizationField {
                    field_id: field.id.clone(),
                    value: CUSTOM_INPUT.to_string(),
                    preset_id: None,
                    additional_price: field.custom_input_price.unwrap_or_default(),
                }),
                _ if field.validation.required => {
                    return Err(CommerceError::Validation(format!(
                        "{} is required",
                        field.label
                    )))
                }
                _ => {}
            }
            continue;
        }

        let value = values.get(&field.id).map(|v| v.trim()).unwrap_or("");
        if value.is_empty() || (field.input_type == FieldInputType::Toggle && value == "false") {
            if field.validation.required {
                return Err(CommerceError::Validation(format!(
                    "{} is required",
                    field.label
                )));
            }
            continue;
        }
        let value = validate_value(field, value)?;

        let additional_price = if preset_covered.contains(&field.id) {
            Money::zero()
        } else {
            field.additional_price.unwrap_or_default()
        };
        selected.push(SelectedCustomizationField {
            field_id: field.id.clone(),
            value,
            preset_id: None,
            additional_price,
        });
    }

    if selected.is_empty() && !definition.fields.is_empty() {
        return Err(CommerceError::Validation(format!(
            "no values given for {}",
            definition.name
        )));
    }

    let field_total: Money = selected.iter().map(|f| f.additional_price).sum();
    let total_price = if field_total.is_zero() {
        definition.base_price.unwrap_or_default()
    } else {
        field_total
    };

    Ok(SelectedCustomization {
        customization_id: definition.id.clone(),
        name: definition.name.clone(),
        fields: selected,
        total_price,
    })
}

/// Resolve a batch of inputs against the customizations offered for a
/// selection.
pub fn select_customizations(
    offered: &[CustomizationType],
    inputs: &[CustomizationInput],
) -> Result<Vec<SelectedCustomization>, CommerceError> {
    inputs
        .iter()
        .map(|input| {
            let definition = offered
                .iter()
                .find(|c| c.id == input.customization_id)
                .ok_or_else(|| {
                    CommerceError::Validation(format!(
                        "customization {} is not offered for this selection",
                        input.customization_id
                    ))
                })?;
            select_customization(definition, input)
        })
        .collect()
}

fn gate_open(
    field: &CustomizationField,
    values: &BTreeMap<String, String>,
    modes: &BTreeMap<&str, PresetMode<'_>>,
) -> bool {
    let Some(dep) = &field.depends_on else {
        return true;
    };

    if dep.custom_only {
        return matches!(modes.get(dep.field_id.as_str()), Some(PresetMode::Custom));
    }

    let current = match modes.get(dep.field_id.as_str()) {
        Some(PresetMode::Preset(preset)) => Some(preset.id.as_str()),
        Some(PresetMode::Custom) => Some(CUSTOM_INPUT),
        Some(PresetMode::Unset) => None,
        None => values
            .get(&dep.field_id)
            .map(String::as_str)
            .filter(|v| !v.is_empty() && *v != "false"),
    };

    match current {
        None => false,
        Some(value) => dep.values.is_empty() || dep.values.iter().any(|v| v == value),
    }
}

/// Check `value` against the field rules and return it in canonical form.
///
/// Numbers are rewritten in plain decimal notation, so `"1e1"` and `"10.0"`
/// are stored as `"10"`.
fn validate_value(field: &CustomizationField, value: &str) -> Result<String, CommerceError> {
    let rules = &field.validation;
    let invalid = |reason: String| CommerceError::Validation(format!("{} {}", field.label, reason));

    let mut value = value.to_string();
    match field.input_type {
        FieldInputType::Number => {
            let number: f64 = value
                .parse()
                .ok()
                .filter(|n: &f64| n.is_finite())
                .ok_or_else(|| invalid(format!("must be a number, got {:?}", value)))?;
            if let Some(min) = rules.min {
                if number < min {
                    return Err(invalid(format!("must be at least {}", min)));
                }
            }
            if let Some(max) = rules.max {
                if number > max {
                    return Err(invalid(format!("must be at most {}", max)));
                }
            }
            // `-0` would otherwise survive as a distinct spelling of zero.
            value = format!("{}", number + 0.0);
        }
        FieldInputType::Select => {
            if !field.options.is_empty() && !field.options.iter().any(|o| *o == value) {
                return Err(invalid(format!("has no option {:?}", value)));
            }
        }
        FieldInputType::Toggle => {
            if value != "true" {
                return Err(invalid(format!("must be true or false, got {:?}", value)));
            }
        }
        FieldInputType::Text | FieldInputType::Preset => {}
    }

    let length = value.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            return Err(invalid(format!("must be at least {} characters", min)));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Err(invalid(format!("must be at most {} characters", max)));
        }
    }
    if let Some(pattern) = &rules.pattern {
        let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            CommerceError::Validation(format!("bad pattern on {}: {}", field.id, e))
        })?;
        if !re.is_match(&value) {
            return Err(invalid(format!("does not match {}", pattern)));
        }
    }
    Ok(value)
}
