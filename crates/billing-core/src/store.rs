//! Tenant Binding Store
//!
//! Durable mapping between tenants and their vendor customer/subscription
//! identifiers. The access pattern is point lookup by tenant plus
//! upsert-on-conflict; rows are never deleted by this subsystem.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BillingError, Result};
use crate::model::{TenantBinding, TenantId};

/// Binding storage trait
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Point lookup by tenant, `Ok(None)` when no row exists
    async fn get(&self, tenant: TenantId) -> Result<Option<TenantBinding>>;

    /// Insert or replace the binding row keyed by tenant
    async fn upsert(&self, binding: &TenantBinding) -> Result<()>;
}

/// In-memory binding store (for development and tests)
pub struct MemoryBindingStore {
    rows: RwLock<HashMap<TenantId, TenantBinding>>,
}

impl Default for MemoryBindingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Number of binding rows (test helper)
    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BindingStore for MemoryBindingStore {
    async fn get(&self, tenant: TenantId) -> Result<Option<TenantBinding>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| BillingError::Storage("store lock poisoned".into()))?;
        Ok(rows.get(&tenant).cloned())
    }

    async fn upsert(&self, binding: &TenantBinding) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| BillingError::Storage("store lock poisoned".into()))?;
        rows.insert(binding.tenant_id, binding.clone());
        Ok(())
    }
}
