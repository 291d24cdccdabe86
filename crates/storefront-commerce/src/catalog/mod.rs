//! Product catalog module.
//!
//! Contains the product model, customization definitions, customization
//! selection and the product repository.

mod customization;
mod product;
pub mod repository;
mod selection;

pub use customization::{
    merge_override, CustomizationConfig, CustomizationField, CustomizationPreset,
    CustomizationType, FieldDependency, FieldInputType, FieldOverride, FieldValidation,
    VariantConstraint, VariantCustomizationOverride,
};
pub use product::{
    ConditionalImages, ConditionalPrice, Product, VariantAttribute, VariantCombination,
    VariantSelection,
};
pub use repository::{CatalogSnapshot, ProductRepository, ProductSource, StaticProductSource};
pub use selection::{
    select_customization, select_customizations, CustomizationInput, SelectedCustomization,
    SelectedCustomizationField, CUSTOM_INPUT,
};
