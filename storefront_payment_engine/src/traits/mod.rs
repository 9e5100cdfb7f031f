//! Backend trait definitions for the storefront payment engine.
//!
//! Concrete storage backends (currently SQLite) implement these traits. The public [`crate::OrderFlowApi`] is
//! generic over them, which is also what lets the server's endpoint tests run against `mockall` mocks.
mod checkout_database;
mod data_objects;
mod order_management;

pub use checkout_database::{CheckoutDatabase, PaymentGatewayError};
pub use data_objects::PaymentUpdate;
pub use order_management::{OrderApiError, OrderManagement};
