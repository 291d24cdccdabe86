//! Cart commands.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use storefront_cache::Cache;
use storefront_commerce::cart::{compute_cart_item_id, CartLedger};
use storefront_commerce::catalog::select_customizations;
use storefront_commerce::resolver::{resolve, resolve_customizations};
use storefront_commerce::CartItemId;

use super::{parse_customizations, parse_selection, CartArgs, CartCommand};
use crate::context::Context;
use crate::output::price_label;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let mut ledger = CartLedger::load(&store);

    match args.command {
        CartCommand::Add {
            sku,
            selections,
            customizations,
            qty,
        } => {
            add(&mut ledger, &store, &sku, &selections, &customizations, qty, ctx).await?;
            ledger.save(&store)?;
            Ok(())
        }
        CartCommand::Show => show(&ledger, ctx),
        CartCommand::Remove { cart_item_id } => {
            if !ledger.remove(&CartItemId::new(cart_item_id.as_str())) {
                bail!("No cart line '{}'", cart_item_id);
            }
            ledger.save(&store)?;
            ctx.output.success("Removed from cart");
            Ok(())
        }
        CartCommand::SetQty {
            cart_item_id,
            quantity,
        } => {
            let id = CartItemId::new(cart_item_id.as_str());
            let Some(stock) = ledger.get(&id).map(|item| item.stock_level) else {
                bail!("No cart line '{}'", cart_item_id);
            };
            if !ledger.set_quantity(&id, quantity) {
                bail!("Quantity must be between 1 and {}", stock);
            }
            ledger.save(&store)?;
            ctx.output.success(&format!("Quantity set to {}", quantity));
            Ok(())
        }
        CartCommand::Clear { yes } => {
            if ledger.is_empty() {
                ctx.output.info("Cart is already empty");
                return Ok(());
            }
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove all {} lines from the cart?", ledger.len()))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    ctx.output.warn("Cancelled");
                    return Ok(());
                }
            }
            ledger.clear();
            ledger.save(&store)?;
            ctx.output.success("Cart cleared");
            Ok(())
        }
    }
}

async fn add(
    ledger: &mut CartLedger,
    store: &Cache,
    sku: &str,
    selections: &[String],
    customizations: &[String],
    qty: u32,
    ctx: &Context,
) -> Result<()> {
    let repository = ctx.load_repository(store).await?;
    let product = repository
        .get_product(sku)
        .with_context(|| format!("Unknown product '{}'", sku))?;

    let selection = parse_selection(selections)?;
    let offered = resolve_customizations(&product, &selection);
    let selected = select_customizations(&offered, &parse_customizations(customizations)?)?;
    let resolved = resolve(&product, &selection);

    let selection = Some(&selection).filter(|s| !s.is_empty());
    let selected = Some(selected.as_slice()).filter(|s| !s.is_empty());

    let mut added = 0;
    while added < qty && ledger.add(&product, selection, selected) {
        added += 1;
    }

    if added == 0 {
        if product.has_variants && selection.is_none() {
            bail!("{} has variants, pick one with --select", product.name);
        }
        if !resolved.is_available() {
            bail!("{} is not available in this configuration", product.name);
        }
        bail!(
            "Only {} of {} available and all are in the cart",
            resolved.stock_level,
            product.name
        );
    }
    if added < qty {
        ctx.output.warn(&format!(
            "Only {} of {} could be added (stock limit)",
            added, qty
        ));
    }

    let id = compute_cart_item_id(&resolved.sku, selection, selected);
    ctx.output.success(&format!("Added {} x {}", added, product.name));
    ctx.output.kv("Cart item", id.as_str());
    ctx.output.kv("Cart total", &ledger.total_price().display());
    Ok(())
}

fn show(ledger: &CartLedger, ctx: &Context) -> Result<()> {
    let pricing = ledger.pricing();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "items": ledger.items(),
            "pricing": pricing,
        }));
        return Ok(());
    }

    if ledger.is_empty() {
        ctx.output.info("Cart is empty");
        return Ok(());
    }

    ctx.output.header(&format!("Cart ({} items)", ledger.total_items()));
    for item in ledger.items() {
        let reference = item
            .is_discounted()
            .then(|| item.original_price.display());
        ctx.output.list_item(&format!(
            "{} x {}  {}",
            item.quantity,
            item.name,
            price_label(&item.unit_price.display(), reference.as_deref())
        ));
        if let Some(variants) = &item.selected_variants {
            let text: Vec<String> = variants.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
            ctx.output.kv("    Variant", &text.join(", "));
        }
        for customization in item.selected_customizations.iter().flatten() {
            let values: Vec<&str> = customization.fields.iter().map(|f| f.value.as_str()).collect();
            ctx.output.kv(
                &format!("    {}", customization.name),
                &format!("{} (+{})", values.join(" / "), customization.total_price.display()),
            );
        }
        ctx.output.kv("    Line total", &item.line_total().display());
        ctx.output.kv("    Id", item.cart_item_id.as_str());
    }

    ctx.output.header("Totals");
    ctx.output.kv("Merchandise", &pricing.merchandise_total.display());
    if pricing.customization_total.is_positive() {
        ctx.output.kv("Customizations", &pricing.customization_total.display());
    }
    if pricing.has_discounts() {
        ctx.output.kv(
            "You save",
            &format!(
                "{} ({:.0}%)",
                pricing.savings.display(),
                pricing.discount_percentage()
            ),
        );
    }
    ctx.output.kv("Subtotal", &pricing.subtotal.display());
    Ok(())
}
