//! Order submission types.

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::catalog::{SelectedCustomization, VariantSelection};
use crate::checkout::Customer;
use crate::error::CommerceError;
use crate::ids::{CartItemId, OrderNumber, Sku};
use crate::money::Money;

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pay online when placing the order.
    #[default]
    PayNow,
    /// Pay when collecting in store.
    PayInStore,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayNow => "pay_now",
            PaymentMethod::PayInStore => "pay_in_store",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::PayNow => "Pay now",
            PaymentMethod::PayInStore => "Pay in store",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay_now" | "now" => Ok(PaymentMethod::PayNow),
            "pay_in_store" | "store" => Ok(PaymentMethod::PayInStore),
            other => Err(CommerceError::Validation(format!(
                "unknown payment method: {}",
                other
            ))),
        }
    }
}

/// A line of an order as sent to the order sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// SKU at time of order.
    pub sku: Sku,
    pub cart_item_id: CartItemId,
    /// Product name at time of order.
    pub name: String,
    pub quantity: u32,
    /// Unit price at time of order.
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variants: Option<VariantSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_customizations: Option<Vec<SelectedCustomization>>,
}

impl OrderLine {
    /// Total price for this line.
    pub fn total(&self) -> Money {
        self.final_price.unwrap_or(self.unit_price).times(self.quantity)
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            sku: item.sku.clone(),
            cart_item_id: item.cart_item_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            final_price: item.final_price,
            selected_variants: item.selected_variants.clone(),
            selected_customizations: item.selected_customizations.clone(),
        }
    }
}

/// The payload handed to an order sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub items: Vec<OrderLine>,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    /// Grand total charged.
    pub total_price: Money,
}

impl OrderSubmission {
    /// Get total item count.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// What the order sink hands back for an accepted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::PayInStore).unwrap(),
            "\"pay_in_store\""
        );
        assert_eq!("pay_now".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayNow);
        assert_eq!("store".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayInStore);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_line_total() {
        let line = OrderLine {
            sku: Sku::new("JERSEY-M"),
            cart_item_id: CartItemId::new("JERSEY-M"),
            name: "Jersey".into(),
            quantity: 2,
            unit_price: Money::new(8990),
            final_price: Some(Money::new(10490)),
            selected_variants: None,
            selected_customizations: None,
        };
        assert_eq!(line.total(), Money::new(20980));
    }
}
