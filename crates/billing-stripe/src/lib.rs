//! # billing-stripe
//!
//! Stripe-backed vendor implementation for `billing-core`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use billing_core::CustomerResolver;
//! use billing_stripe::StripeVendor;
//!
//! let vendor = Arc::new(StripeVendor::from_env()?);
//! let resolver = CustomerResolver::new(vendor, cache, store, host);
//! ```
//!
//! Stripe request failures are folded into the shared error taxonomy:
//! HTTP 404 becomes `NotFound`, 400/402 become `Validation`, everything
//! else is a transient `Vendor` error.

mod gateway;
mod vendor;

pub use gateway::StripeGateway;
pub use vendor::StripeVendor;
