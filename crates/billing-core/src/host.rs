//! Host Platform Abstraction
//!
//! The multisite host owns tenant resolution, user accounts, and site
//! metadata. Injected explicitly so the resolver carries no global handles.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BillingError, Result};
use crate::model::{TenantId, UserAccount};

/// Host platform collaborator
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Tenant handling the current request
    async fn current_tenant(&self) -> Result<TenantId>;

    /// The designated primary tenant, skipped when scanning by owner
    fn primary_tenant(&self) -> TenantId;

    /// Human-readable site name for a tenant
    async fn site_name(&self, tenant: TenantId) -> Result<String>;

    /// Look up a user account by email
    async fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// All tenants owned by the user with the given email
    async fn tenants_owned_by(&self, email: &str) -> Result<Vec<TenantId>>;
}

/// Fixed in-memory host (for development and tests)
pub struct StaticHost {
    current: TenantId,
    primary: TenantId,
    site_names: RwLock<HashMap<TenantId, String>>,
    users: RwLock<HashMap<String, UserAccount>>,
    ownership: RwLock<HashMap<String, Vec<TenantId>>>,
}

impl StaticHost {
    pub fn new(current: TenantId, primary: TenantId) -> Self {
        Self {
            current,
            primary,
            site_names: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            ownership: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_site(self, tenant: TenantId, name: &str) -> Self {
        self.site_names
            .write()
            .expect("host lock")
            .insert(tenant, name.to_string());
        self
    }

    pub fn with_user(self, user: UserAccount) -> Self {
        self.users
            .write()
            .expect("host lock")
            .insert(user.email.to_lowercase(), user);
        self
    }

    pub fn with_owned_tenants(self, email: &str, tenants: Vec<TenantId>) -> Self {
        self.ownership
            .write()
            .expect("host lock")
            .insert(email.to_lowercase(), tenants);
        self
    }
}

#[async_trait]
impl HostPlatform for StaticHost {
    async fn current_tenant(&self) -> Result<TenantId> {
        Ok(self.current)
    }

    fn primary_tenant(&self) -> TenantId {
        self.primary
    }

    async fn site_name(&self, tenant: TenantId) -> Result<String> {
        let names = self
            .site_names
            .read()
            .map_err(|_| BillingError::Storage("host lock poisoned".into()))?;
        Ok(names
            .get(&tenant)
            .cloned()
            .unwrap_or_else(|| format!("site-{tenant}")))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let users = self
            .users
            .read()
            .map_err(|_| BillingError::Storage("host lock poisoned".into()))?;
        Ok(users.get(&email.to_lowercase()).cloned())
    }

    async fn tenants_owned_by(&self, email: &str) -> Result<Vec<TenantId>> {
        let ownership = self
            .ownership
            .read()
            .map_err(|_| BillingError::Storage("host lock poisoned".into()))?;
        Ok(ownership.get(&email.to_lowercase()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_site_gets_fallback_name() {
        let host = StaticHost::new(TenantId(1), TenantId(1));
        assert_eq!(host.site_name(TenantId(9)).await.unwrap(), "site-9");
    }

    #[tokio::test]
    async fn test_user_lookup_is_case_insensitive() {
        let host = StaticHost::new(TenantId(1), TenantId(1)).with_user(UserAccount {
            email: "Owner@Example.com".into(),
            username: "owner".into(),
            display_name: "Site Owner".into(),
        });

        let user = host.user_by_email("owner@example.com").await.unwrap();
        assert_eq!(user.unwrap().username, "owner");
    }
}
