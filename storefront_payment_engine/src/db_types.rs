use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sfg_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
/// The payment state of an order, and of its payment record. The two are kept in lock-step by webhook ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No (successful) provider payment has been reported yet.
    Pending,
    /// The provider has confirmed the payment. Terminal.
    Completed,
    /// The provider has reported the payment attempt as failed. A new submission for the order may retry.
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   FulfilmentStatus   ---------------------------------------------------------
/// Vendor-side fulfilment state. Entirely independent of the payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FulfilmentStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for FulfilmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfilmentStatus::Pending => write!(f, "Pending"),
            FulfilmentStatus::Shipped => write!(f, "Shipped"),
            FulfilmentStatus::Delivered => write!(f, "Delivered"),
            FulfilmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for FulfilmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid fulfilment status: {s}"))),
        }
    }
}

//--------------------------------------        Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Vendor,
    Admin,
}

pub type Roles = Vec<Role>;

//--------------------------------------     PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    Stripe,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Stripe => write!(f, "Stripe"),
        }
    }
}

//--------------------------------------      PaymentRef      ---------------------------------------------------------
/// The external payment identifier. It is generated when the payment record is created, handed to the payment
/// provider when the charge is initiated, and echoed back by the provider in webhook events. A payment keeps its
/// reference across retries.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentRef(pub String);

impl PaymentRef {
    pub fn random() -> Self {
        Self(format!("pay-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for PaymentRef {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The store account that placed the order. `None` for guest orders.
    pub customer_id: Option<i64>,
    /// The contact email captured at submission. Guest lookup matches on this field.
    pub email: String,
    pub total_price: Money,
    pub payment_status: PaymentStatus,
    pub fulfilment_status: FulfilmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// The product's unit price at the time the order was placed.
    pub unit_price: Money,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<i64>,
    pub email: String,
    /// The cart the order was assembled from. Consumed when the order is persisted.
    pub cart_id: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrder {
    pub fn new(customer_id: Option<i64>, email: String, cart_id: String) -> Self {
        Self { customer_id, email, cart_id, items: Vec::new() }
    }

    /// The order total, derived from the line items.
    pub fn total_price(&self) -> Money {
        self.items.iter().map(|i| i.unit_price * i.quantity).sum()
    }
}

//--------------------------------------       Payment        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    /// The owning order. At most one payment exists per order.
    pub order_id: i64,
    pub payment_ref: PaymentRef,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub payment_ref: PaymentRef,
    pub amount: Money,
    pub method: PaymentMethod,
}

impl NewPayment {
    pub fn new(order_id: i64, amount: Money, payment_ref: PaymentRef) -> Self {
        Self { order_id, payment_ref, amount, method: PaymentMethod::default() }
    }
}

//--------------------------------------       CartLine       ---------------------------------------------------------
/// A cart item resolved against the product catalog. `unit_price` is `None` when the referenced product no longer
/// exists, which the submission flow reports as a validation failure.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Option<Money>,
}

//--------------------------------------       Product        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
