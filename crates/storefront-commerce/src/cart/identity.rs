//! Cart line identity.
//!
//! A line is identified by its SKU plus an opaque encoding of how it was
//! configured. The configuration is first written as a canonical string in
//! which every key and value is length-prefixed, then the whole string is
//! base64url encoded. Equal configurations always produce equal ids and
//! separator characters inside values cannot make two different
//! configurations collide.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::catalog::{SelectedCustomization, VariantSelection};
use crate::ids::{CartItemId, Sku};

const VARIANT_MARKER: &str = "-v-";
const CUSTOMIZATION_MARKER: &str = "-c-";

/// Derive the identity of a configured cart line.
///
/// Empty selections are treated the same as absent ones.
pub fn compute_cart_item_id(
    sku: &Sku,
    selected_variants: Option<&VariantSelection>,
    selected_customizations: Option<&[SelectedCustomization]>,
) -> CartItemId {
    let mut id = sku.to_string();

    if let Some(variants) = selected_variants.filter(|v| !v.is_empty()) {
        id.push_str(VARIANT_MARKER);
        id.push_str(&URL_SAFE_NO_PAD.encode(canonical_variants(variants)));
    }

    if let Some(customizations) = selected_customizations.filter(|c| !c.is_empty()) {
        id.push_str(CUSTOMIZATION_MARKER);
        id.push_str(&URL_SAFE_NO_PAD.encode(canonical_customizations(customizations)));
    }

    CartItemId::new(id)
}

/// `key:value` pairs in key order, joined with `|`.
fn canonical_variants(variants: &VariantSelection) -> String {
    // BTreeMap iteration is already key-sorted.
    variants
        .iter()
        .map(|(key, value)| format!("{}:{}", token(key), token(value)))
        .collect::<Vec<_>>()
        .join("|")
}

/// `id{field=value[@preset];...}` per customization, sorted by id with
/// fields sorted by field id, joined with `|`.
fn canonical_customizations(customizations: &[SelectedCustomization]) -> String {
    let mut sorted: Vec<&SelectedCustomization> = customizations.iter().collect();
    sorted.sort_by(|a, b| a.customization_id.cmp(&b.customization_id));

    sorted
        .into_iter()
        .map(|customization| {
            let mut fields: Vec<_> = customization.fields.iter().collect();
            fields.sort_by(|a, b| a.field_id.cmp(&b.field_id));

            let body = fields
                .into_iter()
                .map(|field| {
                    let mut entry = format!("{}={}", token(&field.field_id), token(&field.value));
                    if let Some(preset) = &field.preset_id {
                        entry.push('@');
                        entry.push_str(&token(preset));
                    }
                    entry
                })
                .collect::<Vec<_>>()
                .join(";");
            format!("{}{{{}}}", token(&customization.customization_id), body)
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn token(value: &str) -> String {
    format!("{}#{}", value.len(), value)
}
