//! # billing-core
//!
//! Tenant-to-customer resolution for multisite subscription billing.
//!
//! Two collaborating pieces:
//!
//! - **Customer Resolver** — maps a tenant (site) id to a remote payment
//!   customer record, with a key-value cache as a read-through layer and a
//!   relational binding table as the durable mapping store.
//! - **Gateway Registry** — resolves the set of enabled payment gateways
//!   from configuration and answers naming/eligibility queries.
//!
//! ## Resolution flow
//!
//! ```text
//! ┌────────┐    ┌───────────┐    ┌─────────┐    ┌───────────┐
//! │ Caller │───▶│ Resolver  │───▶│ Binding │───▶│ Vendor API│
//! │        │    │ (cache-   │    │ store   │    │ (Stripe…) │
//! │        │◀───│  aside)   │◀───│         │◀───│           │
//! └────────┘    └───────────┘    └─────────┘    └───────────┘
//! ```
//!
//! The cache is best-effort only: it is checked first, populated on miss,
//! and never authoritative. The binding store and the vendor API are the
//! sources of truth.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use billing_core::{CustomerResolver, MemoryCache, MemoryBindingStore, StaticHost, TenantId};
//!
//! let resolver = CustomerResolver::new(vendor, cache, store, host);
//!
//! // Resolve a tenant to its vendor customer, cache permitting
//! let customer = resolver.customer_for_tenant(TenantId(42), false).await?;
//!
//! // Persist the binding after a successful signup
//! resolver.set_binding(TenantId(42), &customer.id, None).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod model;
pub mod resolver;
pub mod store;
pub mod vendor;

pub use cache::{BILLING_NAMESPACE, Cache, CacheExt, MemoryCache};
pub use config::BillingConfig;
pub use error::{BillingError, Result};
pub use gateway::{
    CurrencyTable, Gateway, GatewayEntry, GatewayHistory, GatewayRegistry, MemoryGatewayHistory,
    TRIAL_GATEWAY_KEY,
};
pub use host::{HostPlatform, StaticHost};
pub use model::{
    CardRecord, CustomerRecord, InvoiceRecord, TenantBinding, TenantId, UserAccount,
};
pub use resolver::CustomerResolver;
pub use store::{BindingStore, MemoryBindingStore};
pub use vendor::{CreateCustomerParams, CustomerFields, CustomerVendor, MockVendor};
