//! Checkout assembly and order placement.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::cart::CartLedger;
use crate::catalog::ProductRepository;
use crate::checkout::{Customer, OrderConfirmation, OrderLine, OrderSubmission, PaymentMethod};
use crate::error::CommerceError;
use crate::ids::OrderNumber;

/// Accepts order submissions.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit an order and return its confirmation.
    async fn submit(&self, order: &OrderSubmission) -> Result<OrderConfirmation, CommerceError>;
}

/// An order sink that keeps accepted orders in memory.
#[derive(Debug, Default)]
pub struct InMemoryOrderSink {
    accepted: Mutex<Vec<(OrderNumber, OrderSubmission)>>,
    rejection: Option<String>,
}

impl InMemoryOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses every order with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            accepted: Mutex::default(),
            rejection: Some(reason.into()),
        }
    }

    /// Orders accepted so far, oldest first.
    pub fn accepted(&self) -> Vec<(OrderNumber, OrderSubmission)> {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OrderSink for InMemoryOrderSink {
    async fn submit(&self, order: &OrderSubmission) -> Result<OrderConfirmation, CommerceError> {
        if let Some(reason) = &self.rejection {
            return Err(CommerceError::OrderRejected(reason.clone()));
        }

        let order_number = OrderNumber::generate();
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((order_number.clone(), order.clone()));
        Ok(OrderConfirmation { order_number })
    }
}

/// Turns a cart into an order and places it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutAssembler;

impl CheckoutAssembler {
    /// Build the submission payload for the current cart.
    pub fn assemble(
        ledger: &CartLedger,
        customer: &Customer,
        payment_method: PaymentMethod,
    ) -> Result<OrderSubmission, CommerceError> {
        if ledger.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        customer.validate()?;

        Ok(OrderSubmission {
            items: ledger.items().iter().map(OrderLine::from).collect(),
            customer: customer.clone(),
            payment_method,
            total_price: ledger.total_price(),
        })
    }

    /// Submit the cart to `sink`.
    ///
    /// Only a confirmed order decrements stock and clears the cart; a
    /// rejected one leaves both as they were.
    pub async fn place_order(
        ledger: &mut CartLedger,
        repository: &ProductRepository,
        sink: &dyn OrderSink,
        customer: &Customer,
        payment_method: PaymentMethod,
    ) -> Result<OrderConfirmation, CommerceError> {
        let submission = Self::assemble(ledger, customer, payment_method)?;

        let confirmation = match sink.submit(&submission).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::warn!(error = %e, "order submission failed");
                return Err(match e {
                    CommerceError::OrderRejected(_) => e,
                    other => CommerceError::OrderRejected(other.to_string()),
                });
            }
        };

        for line in &submission.items {
            if let Err(e) = repository.decrement_stock(line.sku.as_str(), line.quantity) {
                // Confirmed orders stand even if the catalog changed meanwhile.
                tracing::warn!(sku = %line.sku, error = %e, "could not decrement stock");
            }
        }
        ledger.clear();

        tracing::info!(
            order_number = %confirmation.order_number,
            items = submission.item_count(),
            total = %submission.total_price,
            payment_method = submission.payment_method.as_str(),
            "order placed"
        );
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::money::Money;

    fn fries() -> Product {
        Product::new("FRIES", "French Fries", Money::new(299)).with_stock(15)
    }

    #[test]
    fn test_assemble_empty_cart() {
        let result =
            CheckoutAssembler::assemble(&CartLedger::new(), &Customer::sample(0), PaymentMethod::PayNow);
        assert!(matches!(result, Err(CommerceError::EmptyCart)));
    }

    #[test]
    fn test_assemble_payload() {
        let mut ledger = CartLedger::new();
        ledger.add(&fries(), None, None);
        ledger.add(&fries(), None, None);

        let order =
            CheckoutAssembler::assemble(&ledger, &Customer::sample(1), PaymentMethod::PayInStore)
                .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total_price, Money::new(598));

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["paymentMethod"], "pay_in_store");
        assert_eq!(json["items"][0]["cartItemId"], "FRIES");
        assert_eq!(json["customer"]["address"]["country"], "CH");
    }

    #[test]
    fn test_assemble_rejects_invalid_customer() {
        let mut ledger = CartLedger::new();
        ledger.add(&fries(), None, None);
        let result = CheckoutAssembler::assemble(&ledger, &Customer::default(), PaymentMethod::PayNow);
        assert!(matches!(result, Err(CommerceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_place_order_success() {
        let repository = ProductRepository::with_products(vec![fries()]);
        let sink = InMemoryOrderSink::new();
        let mut ledger = CartLedger::new();
        ledger.add(&fries(), None, None);
        ledger.add(&fries(), None, None);

        let confirmation = CheckoutAssembler::place_order(
            &mut ledger,
            &repository,
            &sink,
            &Customer::sample(0),
            PaymentMethod::PayNow,
        )
        .await
        .unwrap();

        assert!(confirmation.order_number.as_str().starts_with("ORD-"));
        assert!(ledger.is_empty());
        assert_eq!(repository.get_product("FRIES").unwrap().stock_level, 13);
        assert_eq!(sink.accepted().len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_rejected_changes_nothing() {
        let repository = ProductRepository::with_products(vec![fries()]);
        let sink = InMemoryOrderSink::rejecting("payment declined");
        let mut ledger = CartLedger::new();
        ledger.add(&fries(), None, None);

        let result = CheckoutAssembler::place_order(
            &mut ledger,
            &repository,
            &sink,
            &Customer::sample(0),
            PaymentMethod::PayNow,
        )
        .await;

        assert!(matches!(result, Err(CommerceError::OrderRejected(_))));
        assert_eq!(ledger.total_items(), 1);
        assert_eq!(repository.get_product("FRIES").unwrap().stock_level, 15);
    }
}
