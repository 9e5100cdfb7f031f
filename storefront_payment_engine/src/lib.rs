//! Storefront Payment Engine
//!
//! The storefront payment engine carries the order-to-payment flow for the storefront: persisting order
//! submissions, reconciling each order with its unique payment record, and applying asynchronous payment-provider
//! events. This library contains the core logic and is HTTP-framework agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). Currently, SQLite is the supported backend. You should
//!    never need to access the database directly. Instead, use the public API provided by the engine. The
//!    exception is the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@checkout_api`]). This provides the public-facing functionality of the engine:
//!    order submission, payment reconciliation, webhook-driven status updates, and the guest/customer order views.
//!    Specific backends need to implement the traits in the [`mod@traits`] module in order to act as a backend for
//!    the storefront payment server.
pub mod checkout_api;
pub mod db_types;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CheckoutDatabase, OrderApiError, OrderManagement, PaymentGatewayError, PaymentUpdate};
