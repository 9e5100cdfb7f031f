//! # Storefront payment server
//! This crate hosts the HTTP layer for the storefront payment gateway. It is responsible for:
//! Accepting order submissions from authenticated customers and guests.
//! Listening for incoming payment webhook events from the payment provider and verifying their signatures.
//! Serving customer order views, the guest order lookup, and vendor fulfilment updates.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /orders`: Order submission (authenticated or guest), which also reconciles the order's payment record.
//! * `GET /orders`, `GET /orders/{id}`: Customer order views.
//! * `POST /orders/guest-lookup`: Guest order retrieval by order id and contact email.
//! * `PATCH /orders/{id}/fulfilment`: Vendor-side fulfilment updates.
//! * `POST /webhook/stripe`: The signed payment-provider webhook endpoint.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
