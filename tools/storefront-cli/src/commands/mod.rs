//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use storefront_commerce::catalog::{CustomizationInput, VariantSelection};
use storefront_commerce::checkout::PaymentMethod;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List all products.
    List,
    /// Show a product with its variants and customizations.
    Show {
        /// Product SKU.
        sku: String,
    },
    /// Resolve SKU, price, stock and images for a variant selection.
    Resolve {
        /// Product SKU.
        sku: String,

        /// Variant attribute, e.g. `--select Size=M`. Repeatable.
        #[arg(short, long = "select", value_name = "ATTR=VALUE")]
        selections: Vec<String>,
    },
    /// Fetch the catalog from the configured source again.
    Refresh,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add a configured product to the cart.
    Add {
        /// Product SKU.
        sku: String,

        /// Variant attribute, e.g. `--select Size=M`. Repeatable.
        #[arg(short, long = "select", value_name = "ATTR=VALUE")]
        selections: Vec<String>,

        /// Customization value, e.g. `--custom flocking.player=a-5`. Repeatable.
        #[arg(short, long = "custom", value_name = "ID.FIELD=VALUE")]
        customizations: Vec<String>,

        /// Number of units to add.
        #[arg(short, long, default_value = "1")]
        qty: u32,
    },
    /// Show cart contents and totals.
    Show,
    /// Remove a line.
    Remove {
        /// Cart item id as shown by `cart show`.
        cart_item_id: String,
    },
    /// Replace the quantity of a line.
    SetQty {
        /// Cart item id as shown by `cart show`.
        cart_item_id: String,

        /// New quantity.
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Payment method (`pay_now` or `pay_in_store`).
    #[arg(short, long)]
    pub payment: Option<PaymentMethod>,

    /// Fill customer data with the Nth sample customer.
    #[arg(long, value_name = "N")]
    pub sample: Option<usize>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub street: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub zip: Option<String>,

    /// Show the order without placing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write a default storefront.toml.
    Init {
        /// Overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Check the configuration and the catalog it points to.
    Validate,
}

/// Parse repeated `ATTR=VALUE` arguments into a variant selection.
pub fn parse_selection(args: &[String]) -> Result<VariantSelection> {
    let mut selection = VariantSelection::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("Invalid selection '{}', expected ATTR=VALUE", arg);
        };
        if name.trim().is_empty() {
            bail!("Invalid selection '{}', attribute name is empty", arg);
        }
        selection.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(selection)
}

/// Parse repeated `ID.FIELD=VALUE` arguments, grouped per customization in
/// first-seen order.
pub fn parse_customizations(args: &[String]) -> Result<Vec<CustomizationInput>> {
    let mut inputs: Vec<CustomizationInput> = Vec::new();
    for arg in args {
        let parsed = arg
            .split_once('=')
            .and_then(|(path, value)| path.split_once('.').map(|(id, field)| (id, field, value)));
        let Some((id, field, value)) = parsed else {
            bail!("Invalid customization '{}', expected ID.FIELD=VALUE", arg);
        };
        if id.is_empty() || field.is_empty() {
            bail!("Invalid customization '{}', expected ID.FIELD=VALUE", arg);
        }

        match inputs.iter().position(|input| input.customization_id == id) {
            Some(index) => {
                inputs[index].values.insert(field.to_string(), value.to_string());
            }
            None => inputs.push(CustomizationInput::new(id).with(field, value)),
        }
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_selection() {
        let selection = parse_selection(&args(&["Size=M", "Color = Red"])).unwrap();
        assert_eq!(selection.get("Size").map(String::as_str), Some("M"));
        assert_eq!(selection.get("Color").map(String::as_str), Some("Red"));

        assert!(parse_selection(&args(&["Size"])).is_err());
        assert!(parse_selection(&args(&["=M"])).is_err());
        assert!(parse_selection(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_customizations_groups_by_id() {
        let inputs = parse_customizations(&args(&[
            "flocking.player=custom",
            "badge.sleeve=true",
            "flocking.name=MEIER",
            "flocking.number=7",
        ]))
        .unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].customization_id, "flocking");
        assert_eq!(inputs[0].values.len(), 3);
        assert_eq!(inputs[0].values["name"], "MEIER");
        assert_eq!(inputs[1].customization_id, "badge");
    }

    #[test]
    fn test_parse_customization_value_may_contain_dots() {
        let inputs = parse_customizations(&args(&["flocking.name=J. DOE"])).unwrap();
        assert_eq!(inputs[0].values["name"], "J. DOE");

        assert!(parse_customizations(&args(&["flocking=1"])).is_err());
        assert!(parse_customizations(&args(&[".name=x"])).is_err());
    }
}
