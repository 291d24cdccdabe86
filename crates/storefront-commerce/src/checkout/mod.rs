//! Checkout module.
//!
//! Contains customer data, the order payload and the assembler that places
//! orders.

mod assembler;
mod customer;
mod order;

pub use assembler::{CheckoutAssembler, InMemoryOrderSink, OrderSink};
pub use customer::{Address, Customer};
pub use order::{OrderConfirmation, OrderLine, OrderSubmission, PaymentMethod};
