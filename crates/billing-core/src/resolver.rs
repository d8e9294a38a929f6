//! Customer Resolver
//!
//! Maps tenants to vendor customer records with a cache-aside read layer.
//! The cache is consulted first unless `force` is set, populated on miss,
//! and never treated as authoritative; the binding store and the vendor API
//! are the sources of truth. No transactional boundary spans the vendor
//! call, the cache write and the store write, so partial application (for
//! example a vendor customer created but no binding persisted yet) is an
//! accepted failure mode the caller must tolerate.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{BILLING_NAMESPACE, Cache, CacheExt};
use crate::error::{BillingError, Result};
use crate::host::HostPlatform;
use crate::model::{CardRecord, CustomerRecord, InvoiceRecord, TenantBinding, TenantId};
use crate::store::BindingStore;
use crate::vendor::{CreateCustomerParams, CustomerFields, CustomerVendor};

fn customer_key(id: &str) -> String {
    format!("customer:{id}")
}

fn customer_list_key(email: &str, limit: u64) -> String {
    format!("customers:{email}:{limit}")
}

fn card_key(customer_id: &str) -> String {
    format!("card:{customer_id}")
}

fn last_invoice_key(customer_id: &str) -> String {
    format!("invoice:last:{customer_id}")
}

fn upcoming_invoice_key(customer_id: &str) -> String {
    format!("invoice:upcoming:{customer_id}")
}

fn binding_key(tenant: TenantId) -> String {
    format!("binding:{tenant}")
}

/// Resolves tenants to vendor customer records
///
/// All collaborators are injected; the resolver holds no global state.
pub struct CustomerResolver {
    vendor: Arc<dyn CustomerVendor>,
    cache: Arc<dyn Cache>,
    store: Arc<dyn BindingStore>,
    host: Arc<dyn HostPlatform>,
}

impl CustomerResolver {
    pub fn new(
        vendor: Arc<dyn CustomerVendor>,
        cache: Arc<dyn Cache>,
        store: Arc<dyn BindingStore>,
        host: Arc<dyn HostPlatform>,
    ) -> Self {
        Self {
            vendor,
            cache,
            store,
            host,
        }
    }

    /// Best-effort cache read; a cache failure is a miss
    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(BILLING_NAMESPACE, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::debug!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Best-effort cache write
    async fn cache_put<T: Serialize + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(BILLING_NAMESPACE, key, value).await {
            tracing::debug!(key, error = %e, "Cache write failed, skipping");
        }
    }

    /// Best-effort cache eviction
    async fn cache_evict(&self, key: &str) {
        if let Err(e) = self.cache.delete(BILLING_NAMESPACE, key).await {
            tracing::debug!(key, error = %e, "Cache eviction failed, skipping");
        }
    }

    /// Retrieve a customer by id
    ///
    /// Served from cache unless `force`; populates the cache on miss.
    pub async fn get_customer(&self, id: &str, force: bool) -> Result<CustomerRecord> {
        let key = customer_key(id);
        if !force {
            if let Some(cached) = self.cache_get::<CustomerRecord>(&key).await {
                return Ok(cached);
            }
        }

        let customer = self.vendor.get_customer(id).await?;
        self.cache_put(&key, &customer).await;
        Ok(customer)
    }

    /// List customers by email, most-recent-first per vendor ordering
    ///
    /// A `limit == 1` lookup that finds a record also populates that
    /// customer's single-entry cache as a side effect.
    pub async fn list_customers(
        &self,
        email: &str,
        limit: u64,
        force: bool,
    ) -> Result<Vec<CustomerRecord>> {
        let key = customer_list_key(email, limit);
        if !force {
            if let Some(cached) = self.cache_get::<Vec<CustomerRecord>>(&key).await {
                return Ok(cached);
            }
        }

        let customers = self.vendor.list_customers(email, limit).await?;
        self.cache_put(&key, &customers).await;

        if limit == 1 {
            if let Some(single) = customers.first() {
                self.cache_put(&customer_key(&single.id), single).await;
            }
        }

        Ok(customers)
    }

    /// Single-customer convenience over [`Self::list_customers`]
    pub async fn find_customer_by_email(
        &self,
        email: &str,
        force: bool,
    ) -> Result<Option<CustomerRecord>> {
        let customers = self.list_customers(email, 1, force).await?;
        Ok(customers.into_iter().next())
    }

    /// Create a vendor customer
    ///
    /// With `check_existing` set, an existing customer with the same email
    /// is returned instead of creating a new one. This is best-effort
    /// idempotency only: two concurrent calls can still race and create
    /// duplicate vendor customers.
    pub async fn create_customer(
        &self,
        email: &str,
        source_token: Option<&str>,
        check_existing: bool,
    ) -> Result<CustomerRecord> {
        if check_existing {
            if let Some(existing) = self.find_customer_by_email(email, true).await? {
                tracing::debug!(
                    customer_id = %existing.id,
                    email,
                    "Reusing existing customer, skipping create"
                );
                return Ok(existing);
            }
        }

        let tenant = self.host.current_tenant().await?;
        let mut description = self.host.site_name(tenant).await?;
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("tenant".to_string(), tenant.to_string());

        if let Some(user) = self.host.user_by_email(email).await? {
            description = format!("{description} ({})", user.display_name);
            metadata.insert("username".to_string(), user.username);
        }

        let params = CreateCustomerParams {
            email: email.to_string(),
            description: Some(description),
            source_token: source_token.map(str::to_string),
            metadata,
        };

        match self.vendor.create_customer(params).await {
            Ok(customer) => {
                tracing::info!(customer_id = %customer.id, email, "Created vendor customer");
                self.cache_put(&customer_key(&customer.id), &customer).await;
                Ok(customer)
            }
            Err(e) => {
                tracing::error!(email, error = %e, message = e.user_message(), "Customer creation failed");
                Err(e)
            }
        }
    }

    /// Apply `fields` to an existing customer and save
    ///
    /// An empty field set returns the freshly fetched record without a
    /// vendor save. Partial application before a failing save is not rolled
    /// back; the vendor is assumed all-or-nothing.
    pub async fn update_customer(
        &self,
        id: &str,
        fields: CustomerFields,
    ) -> Result<CustomerRecord> {
        let current = self.get_customer(id, true).await?;
        if fields.is_empty() {
            return Ok(current);
        }

        let updated = self.vendor.update_customer(id, fields).await?;
        tracing::info!(customer_id = %id, "Updated vendor customer");
        self.cache_put(&customer_key(id), &updated).await;
        Ok(updated)
    }

    /// Delete a customer and evict its cache entry
    ///
    /// Irreversible. The vendor also cancels the customer's remote
    /// subscriptions; the local binding row is left in place.
    pub async fn delete_customer(&self, id: &str) -> Result<()> {
        self.vendor.get_customer(id).await?;
        self.vendor.delete_customer(id).await?;
        tracing::info!(customer_id = %id, "Deleted vendor customer");
        self.cache_evict(&customer_key(id)).await;
        Ok(())
    }

    /// Resolve the customer's default payment source to a card object
    pub async fn default_card(&self, customer_id: &str, force: bool) -> Result<CardRecord> {
        let key = card_key(customer_id);
        if !force {
            if let Some(cached) = self.cache_get::<CardRecord>(&key).await {
                return Ok(cached);
            }
        }

        let customer = self.get_customer(customer_id, force).await?;
        let source_id = customer.default_source.ok_or_else(|| {
            BillingError::NotFound(format!("no default source for customer {customer_id}"))
        })?;

        let card = self.vendor.get_source(customer_id, &source_id).await?;
        self.cache_put(&key, &card).await;
        Ok(card)
    }

    /// Most-recent settled invoice for a customer
    pub async fn last_invoice(&self, customer_id: &str, force: bool) -> Result<InvoiceRecord> {
        let key = last_invoice_key(customer_id);
        if !force {
            if let Some(cached) = self.cache_get::<InvoiceRecord>(&key).await {
                return Ok(cached);
            }
        }

        let invoices = self.vendor.list_invoices(customer_id, 1).await?;
        let invoice = invoices
            .into_iter()
            .next()
            .ok_or_else(|| BillingError::NotFound(format!("no invoices for {customer_id}")))?;
        self.cache_put(&key, &invoice).await;
        Ok(invoice)
    }

    /// Projected next invoice for a customer
    pub async fn upcoming_invoice(&self, customer_id: &str, force: bool) -> Result<InvoiceRecord> {
        let key = upcoming_invoice_key(customer_id);
        if !force {
            if let Some(cached) = self.cache_get::<InvoiceRecord>(&key).await {
                return Ok(cached);
            }
        }

        let invoice = self.vendor.upcoming_invoice(customer_id).await?;
        self.cache_put(&key, &invoice).await;
        Ok(invoice)
    }

    /// Resolve or create the customer for a tenant
    ///
    /// A bound tenant resolves to its existing customer. An unbound tenant
    /// with a payment token gets a fresh customer (reusing one matched by
    /// email when present). The new customer id is NOT written back into the
    /// binding store here; callers persist it with [`Self::set_binding`].
    pub async fn ensure_tenant_customer(
        &self,
        email: &str,
        tenant: TenantId,
        token: Option<&str>,
    ) -> Result<CustomerRecord> {
        let binding = self.binding_for_tenant(tenant, false).await?;
        if binding.is_bound() {
            let id = binding.customer_id.unwrap_or_default();
            return self.get_customer(&id, false).await;
        }

        match token {
            Some(token) => self.create_customer(email, Some(token), true).await,
            None => Err(BillingError::Validation(format!(
                "tenant {tenant} has no customer and no payment token was supplied"
            ))),
        }
    }

    /// Read-through binding lookup by tenant
    ///
    /// Never a hard failure: a tenant with no row gets the zero-value
    /// binding back.
    pub async fn binding_for_tenant(&self, tenant: TenantId, force: bool) -> Result<TenantBinding> {
        let key = binding_key(tenant);
        if !force {
            if let Some(cached) = self.cache_get::<TenantBinding>(&key).await {
                return Ok(cached);
            }
        }

        let binding = self
            .store
            .get(tenant)
            .await?
            .unwrap_or_else(|| TenantBinding::empty(tenant));
        self.cache_put(&key, &binding).await;
        Ok(binding)
    }

    /// Binding lookup by owner email
    ///
    /// Scans the owner's tenants, skipping the designated primary tenant,
    /// and returns the first bound binding; the zero-value binding when
    /// none of them is bound.
    pub async fn binding_for_owner(&self, email: &str, force: bool) -> Result<TenantBinding> {
        let primary = self.host.primary_tenant();
        for tenant in self.host.tenants_owned_by(email).await? {
            if tenant == primary {
                continue;
            }
            let binding = self.binding_for_tenant(tenant, force).await?;
            if binding.is_bound() {
                return Ok(binding);
            }
        }
        Ok(TenantBinding::default())
    }

    /// Resolve a tenant straight to its vendor customer record
    pub async fn customer_for_tenant(
        &self,
        tenant: TenantId,
        force: bool,
    ) -> Result<CustomerRecord> {
        let binding = self.binding_for_tenant(tenant, force).await?;
        if !binding.is_bound() {
            return Err(BillingError::NotFound(format!(
                "tenant {tenant} has no customer binding"
            )));
        }
        let id = binding.customer_id.unwrap_or_default();
        self.get_customer(&id, force).await
    }

    /// Upsert the tenant's binding row
    ///
    /// Idempotent. A missing subscription id is stored as an explicit empty
    /// value, not as absent. The binding cache entry is refreshed in place.
    pub async fn set_binding(
        &self,
        tenant: TenantId,
        customer_id: &str,
        subscription_id: Option<&str>,
    ) -> Result<()> {
        let binding = TenantBinding {
            tenant_id: tenant,
            customer_id: Some(customer_id.to_string()),
            subscription_id: Some(subscription_id.unwrap_or_default().to_string()),
        };

        self.store.upsert(&binding).await?;
        tracing::info!(%tenant, customer_id, "Persisted tenant binding");
        self.cache_put(&binding_key(tenant), &binding).await;
        Ok(())
    }
}
