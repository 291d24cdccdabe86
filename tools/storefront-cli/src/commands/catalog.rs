//! Catalog browsing commands.

use anyhow::{Context as _, Result};
use storefront_commerce::catalog::{
    FieldInputType, Product, ProductRepository, VariantCombination,
};
use storefront_commerce::resolver::{resolve, PriceSource};

use super::{parse_selection, CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::{price_label, stock_badge};

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;

    match args.command {
        CatalogCommand::List => {
            let repository = ctx.load_repository(&store).await?;
            list_products(&repository, ctx)
        }
        CatalogCommand::Show { sku } => {
            let repository = ctx.load_repository(&store).await?;
            show_product(&repository, &sku, ctx)
        }
        CatalogCommand::Resolve { sku, selections } => {
            let repository = ctx.load_repository(&store).await?;
            resolve_selection(&repository, &sku, &selections, ctx)
        }
        CatalogCommand::Refresh => {
            let repository = ProductRepository::load(&store);
            let source = ctx.product_source()?;

            let spinner = ctx.output.spinner("Refreshing catalog...");
            let refreshed = repository.refresh(source.as_ref()).await;
            spinner.finish_and_clear();

            match refreshed {
                Ok(count) => {
                    repository.save(&store)?;
                    ctx.output.success(&format!("Loaded {} products", count));
                }
                Err(e) => {
                    ctx.output.warn(&format!("{}", e));
                    if !repository.is_empty() {
                        ctx.output.info("Keeping the previously loaded catalog.");
                    }
                }
            }
            Ok(())
        }
    }
}

fn list_products(repository: &ProductRepository, ctx: &Context) -> Result<()> {
    let products = repository.products();

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("Catalog ({} products)", products.len()));
    let widths = [16, 28, 10, 14];
    ctx.output.table_row(&["SKU", "NAME", "PRICE", "STOCK"], &widths);
    for product in &products {
        let stock = if product.has_variants {
            format!("{} variants", product.variants.len())
        } else {
            stock_badge(product.stock_level)
        };
        ctx.output.table_row(
            &[
                product.sku.as_str(),
                &product.name,
                &product.effective_price().display(),
                &stock,
            ],
            &widths,
        );
    }
    Ok(())
}

fn find(repository: &ProductRepository, sku: &str) -> Result<Product> {
    repository
        .get_product(sku)
        .with_context(|| format!("Unknown product '{}'", sku))
}

fn show_product(repository: &ProductRepository, sku: &str, ctx: &Context) -> Result<()> {
    let product = find(repository, sku)?;

    if ctx.output.is_json() {
        ctx.output.json(&product);
        return Ok(());
    }

    ctx.output.header(&product.name);
    ctx.output.kv("SKU", product.sku.as_str());
    if !product.description.is_empty() {
        ctx.output.kv("Description", &product.description);
    }
    let reference = product.special_price.map(|_| product.price.display());
    ctx.output.kv(
        "Price",
        &price_label(&product.effective_price().display(), reference.as_deref()),
    );

    if !product.has_variants {
        ctx.output.kv("Stock", &stock_badge(product.stock_level));
    }

    for attribute in &product.variant_attributes {
        ctx.output.kv(&attribute.name, &attribute.values.join(", "));
    }

    if !product.variants.is_empty() {
        ctx.output.header("Variants");
        for variant in &product.variants {
            ctx.output.list_item(&format!(
                "{}  {}",
                variant_label(variant),
                stock_badge(variant.stock_level)
            ));
        }
    }

    let customizations = product.customizations();
    if !customizations.is_empty() {
        ctx.output.header("Customizations");
        for customization in customizations.iter().filter(|c| c.enabled) {
            ctx.output.list_item(&format!("{} ({})", customization.name, customization.id));
            for field in &customization.fields {
                let mut line = format!(
                    "    {}.{} [{}]",
                    customization.id,
                    field.id,
                    field.input_type.as_str()
                );
                if field.input_type == FieldInputType::Preset {
                    let presets: Vec<String> = field
                        .presets
                        .iter()
                        .map(|p| format!("{} {}", p.id, p.price.display()))
                        .collect();
                    line.push_str(&format!(" {}", presets.join(", ")));
                    if field.allow_custom_input {
                        line.push_str(", custom");
                    }
                } else if !field.options.is_empty() {
                    line.push_str(&format!(" {}", field.options.join("|")));
                }
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// `SKU  Red / M (+5.00)`, the surcharge only when there is one.
fn variant_label(variant: &VariantCombination) -> String {
    let surcharge = variant
        .additional_price
        .filter(|p| p.is_positive())
        .map(|p| format!(" (+{})", p.display()))
        .unwrap_or_default();
    format!("{}  {}{}", variant.sku, variant.build_name(), surcharge)
}

fn resolve_selection(
    repository: &ProductRepository,
    sku: &str,
    selections: &[String],
    ctx: &Context,
) -> Result<()> {
    let product = find(repository, sku)?;
    let selection = parse_selection(selections)?;
    let resolved = resolve(&product, &selection);

    if ctx.output.is_json() {
        ctx.output.json(&resolved);
        return Ok(());
    }

    ctx.output.header(&format!("{} {}", product.name, format_selection(selections)));
    ctx.output.kv("SKU", resolved.sku.as_str());
    let source = match resolved.price_source {
        PriceSource::Conditional => "conditional",
        PriceSource::Special => "special",
        PriceSource::Base => "base",
    };
    ctx.output.kv(
        "Price",
        &format!("{} ({})", resolved.unit_price.display(), source),
    );
    ctx.output.kv("Stock", &stock_badge(resolved.stock_level));
    for url in &resolved.image_urls {
        ctx.output.list_item(url);
    }
    if !resolved.customizations.is_empty() {
        let ids: Vec<&str> = resolved.customizations.iter().map(|c| c.id.as_str()).collect();
        ctx.output.kv("Customizations", &ids.join(", "));
    }
    if !selection.is_empty() && !resolved.is_available() {
        ctx.output.warn("This selection is not available.");
    }
    Ok(())
}

fn format_selection(selections: &[String]) -> String {
    if selections.is_empty() {
        String::new()
    } else {
        format!("[{}]", selections.join(", "))
    }
}
