//! Place an order for the current cart.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use storefront_commerce::cart::CartLedger;
use storefront_commerce::checkout::{Address, CheckoutAssembler, Customer};

use super::CheckoutArgs;
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let mut ledger = CartLedger::load(&store);
    let payment_method = args
        .payment
        .unwrap_or(ctx.config.checkout.default_payment_method);
    let customer = customer_from_args(&args);

    let submission = CheckoutAssembler::assemble(&ledger, &customer, payment_method)?;

    if ctx.output.is_json() && args.dry_run {
        ctx.output.json(&submission);
        return Ok(());
    }

    ctx.output.header("Checkout");
    ctx.output.kv("Customer", &customer.full_name());
    ctx.output.kv("Email", &customer.email);
    if customer.address.is_complete() {
        ctx.output.kv("Address", &customer.address.one_line());
    }
    ctx.output.kv("Payment", payment_method.display_name());
    for line in &submission.items {
        ctx.output.list_item(&format!(
            "{} x {} ({})  {}",
            line.quantity,
            line.name,
            line.sku,
            line.total().display()
        ));
    }
    ctx.output.kv("Total", &submission.total_price.display());

    if args.dry_run {
        ctx.output.info("Dry run, no order placed.");
        return Ok(());
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt("Place this order?")
            .default(true)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Checkout cancelled");
            return Ok(());
        }
    }

    let repository = ctx.load_repository(&store).await?;
    let sink = ctx.order_sink();

    let spinner = ctx.output.spinner("Placing order...");
    let placed = CheckoutAssembler::place_order(
        &mut ledger,
        &repository,
        &sink,
        &customer,
        payment_method,
    )
    .await;
    spinner.finish_and_clear();

    let confirmation = match placed {
        Ok(confirmation) => confirmation,
        Err(e) => bail!("{}. Your cart was kept.", e),
    };

    ledger.save(&store)?;
    repository.save(&store)?;

    if ctx.output.is_json() {
        ctx.output.json(&confirmation);
    } else {
        ctx.output
            .success(&format!("Order {} placed", confirmation.order_number));
        let record = sink
            .dir()
            .join(format!("{}.json", confirmation.order_number));
        ctx.output.kv("Order file", &record.display().to_string());
    }
    Ok(())
}

/// Start from the sample customer when asked, then apply explicit fields.
fn customer_from_args(args: &CheckoutArgs) -> Customer {
    let mut customer = args.sample.map(Customer::sample).unwrap_or_default();

    let overrides = [
        (&args.first_name, &mut customer.first_name),
        (&args.last_name, &mut customer.last_name),
        (&args.email, &mut customer.email),
        (&args.phone, &mut customer.phone),
    ];
    for (value, slot) in overrides {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }

    if args.street.is_some() || args.city.is_some() || args.zip.is_some() {
        let current = std::mem::take(&mut customer.address);
        customer.address = Address {
            street: args.street.clone().unwrap_or(current.street),
            city: args.city.clone().unwrap_or(current.city),
            zip: args.zip.clone().unwrap_or(current.zip),
            country: current.country,
        };
    }
    customer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CheckoutArgs {
        CheckoutArgs {
            payment: None,
            sample: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            street: None,
            city: None,
            zip: None,
            dry_run: false,
            yes: true,
        }
    }

    #[test]
    fn test_sample_customer_with_overrides() {
        let customer = customer_from_args(&CheckoutArgs {
            sample: Some(3),
            email: Some("m.fischer@shop.test".into()),
            city: Some("Basel".into()),
            ..args()
        });

        assert_eq!(customer.full_name(), "Michael Fischer");
        assert_eq!(customer.email, "m.fischer@shop.test");
        assert_eq!(customer.address.city, "Basel");
        assert_eq!(customer.address.street, "Bahnhofstrasse 1");
    }

    #[test]
    fn test_explicit_customer_without_sample() {
        let customer = customer_from_args(&CheckoutArgs {
            first_name: Some("Anna".into()),
            last_name: Some("Keller".into()),
            email: Some("anna@keller.test".into()),
            ..args()
        });

        assert!(customer.validate().is_ok());
        assert_eq!(customer.address.country, "CH");
        assert!(!customer.address.is_complete());
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        assert!(customer_from_args(&args()).validate().is_err());
    }
}
