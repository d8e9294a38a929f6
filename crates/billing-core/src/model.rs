//! Core Billing Data Model
//!
//! The vendor records are deliberately opaque: beyond `id` and
//! `default_source` this subsystem never interprets their fields, it just
//! caches and hands them back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque tenant (site) identifier within the multisite host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub u64);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TenantId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Durable association between a tenant and its remote payment identifiers
///
/// One binding per tenant. `customer_id` and `subscription_id` stay absent
/// until the first successful customer creation is persisted. Bindings are
/// never deleted here; deleting the remote customer leaves the row behind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBinding {
    pub tenant_id: TenantId,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

impl TenantBinding {
    /// Zero-value binding: no customer, no subscription
    pub fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            customer_id: None,
            subscription_id: None,
        }
    }

    /// True when the binding carries a usable customer id
    pub fn is_bound(&self) -> bool {
        self.customer_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Opaque vendor customer record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub email: Option<String>,
    pub description: Option<String>,
    /// Identifier of the default payment source, when one is attached
    pub default_source: Option<String>,
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A resolved payment-source (card) object
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<i64>,
    pub exp_year: Option<i64>,
}

/// Opaque vendor invoice record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub customer_id: String,
    pub amount_due: i64,
    pub currency: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub paid: bool,
}

/// Host platform user account, used to enrich customer creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub email: String,
    pub username: String,
    pub display_name: String,
}
